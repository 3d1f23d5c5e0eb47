use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{scoring, update, InputVector, LabeledExample, Prediction, WeightMatrix};

pub const EPOCHS: usize = 10;
/// Pause between two training steps so the learner can follow along.
pub const STEP_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingParams {
  pub epochs: usize,
  pub step_delay: Duration,
}

impl Default for TrainingParams {
  fn default() -> Self {
    TrainingParams {
      epochs: EPOCHS,
      step_delay: STEP_DELAY,
    }
  }
}

/// What happened on one example.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
  pub epoch: usize,
  pub example: usize,
  pub input: InputVector,
  pub label: usize,
  pub predicted: Prediction,
  /// Weights after the step.
  pub weights: WeightMatrix,
  pub updated: bool,
}

/// Perceptron correction for one misclassified example.
///
/// The wrongly winning class (if there is a single one) moves away from the input, the correct
/// class moves towards it. Uses the saturating bulk update, never its guard.
pub fn correct(
  weights: &WeightMatrix,
  input: &InputVector,
  label: usize,
  predicted: Prediction,
) -> WeightMatrix {
  let weights = match predicted {
    Prediction::Class(wrong) => update::apply_bulk(weights, wrong, -1, input),
    Prediction::Tie => *weights,
  };
  update::apply_bulk(&weights, label, 1, input)
}

/// Synchronous, delay-free training state machine.
///
/// Walks `epochs` passes over the examples in order, one example per [`Trainer::step`]. Pacing
/// and publishing are left to the caller.
#[derive(Debug, Clone)]
pub struct Trainer<'a> {
  examples: &'a [LabeledExample],
  epochs: usize,
  weights: WeightMatrix,
  epoch: usize,
  index: usize,
  updates: usize,
}

impl<'a> Trainer<'a> {
  pub fn new(examples: &'a [LabeledExample], weights: WeightMatrix, epochs: usize) -> Self {
    Trainer {
      examples,
      epochs,
      weights,
      epoch: 0,
      index: 0,
      updates: 0,
    }
  }

  pub fn weights(&self) -> WeightMatrix {
    self.weights
  }

  pub fn epoch(&self) -> usize {
    self.epoch
  }

  pub fn updates(&self) -> usize {
    self.updates
  }

  /// Saturates at `usize::MAX` for absurd epoch counts.
  pub fn total_steps(&self) -> usize {
    self.epochs.saturating_mul(self.examples.len())
  }

  pub fn steps_taken(&self) -> usize {
    self
      .epoch
      .saturating_mul(self.examples.len())
      .saturating_add(self.index)
  }

  pub fn is_finished(&self) -> bool {
    self.examples.is_empty() || self.epoch >= self.epochs
  }

  /// The example the next [`Trainer::step`] will look at.
  pub fn peek(&self) -> Option<&'a LabeledExample> {
    if self.is_finished() {
      return None;
    }
    self.examples.get(self.index)
  }

  pub fn step(&mut self) -> Option<StepOutcome> {
    let example = *self.peek()?;
    let predicted = scoring::predict(&scoring::score_all(&example.input, &self.weights));

    let updated = !predicted.is(example.label);
    if updated {
      self.weights = correct(&self.weights, &example.input, example.label, predicted);
      self.updates += 1;
      debug!(
        epoch = self.epoch,
        example = self.index,
        label = example.label,
        predicted = predicted.as_label(),
        "mistake, weights now {}",
        self.weights
      );
    }

    let outcome = StepOutcome {
      epoch: self.epoch,
      example: self.index,
      input: example.input,
      label: example.label,
      predicted,
      weights: self.weights,
      updated,
    };

    self.index += 1;
    if self.index == self.examples.len() {
      info!(
        "epoch {}/{}: {}/{} correct, {} updates so far",
        self.epoch + 1,
        self.epochs,
        scoring::accuracy(self.examples, &self.weights),
        self.examples.len(),
        self.updates
      );
      self.index = 0;
      self.epoch += 1;
    }
    Some(outcome)
  }

  pub fn run_to_end(&mut self) -> WeightMatrix {
    while self.step().is_some() {}
    self.weights
  }
}

impl Iterator for Trainer<'_> {
  type Item = StepOutcome;

  fn next(&mut self) -> Option<StepOutcome> {
    self.step()
  }
}

/// Runs the whole procedure synchronously and returns the final weights.
pub fn train(examples: &[LabeledExample], weights: WeightMatrix, epochs: usize) -> WeightMatrix {
  Trainer::new(examples, weights, epochs).run_to_end()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::TRAINING_SET;

  #[test]
  fn first_step_from_zero_only_increments_the_label() {
    let mut trainer = Trainer::new(&TRAINING_SET, WeightMatrix::zeroed(), EPOCHS);
    let outcome = trainer.step().unwrap();
    assert_eq!(outcome.predicted, Prediction::Tie);
    assert!(outcome.updated);
    assert_eq!(
      outcome.weights.groups(),
      &[[1, 1, 0, 1], [0, 0, 0, 0], [0, 0, 0, 0]]
    );
  }

  #[test]
  fn correct_prediction_is_a_no_op() {
    let mut trainer = Trainer::new(&TRAINING_SET, WeightMatrix::zeroed(), EPOCHS);
    trainer.step();
    let before = trainer.weights();
    // [1,1,1,0] scores [2,0,0] and is labelled 0
    let outcome = trainer.step().unwrap();
    assert_eq!(outcome.predicted, Prediction::Class(0));
    assert!(!outcome.updated);
    assert_eq!(outcome.weights, before);
    assert_eq!(trainer.updates(), 1);
  }

  #[test]
  fn wrong_winner_is_decremented() {
    let mut trainer = Trainer::new(&TRAINING_SET, WeightMatrix::zeroed(), EPOCHS);
    trainer.step();
    trainer.step();
    // [1,0,1,0] labelled 1 is predicted as 0
    let outcome = trainer.step().unwrap();
    assert_eq!(outcome.predicted, Prediction::Class(0));
    assert_eq!(
      outcome.weights.groups(),
      &[[0, 1, -1, 1], [1, 0, 1, 0], [0, 0, 0, 0]]
    );
  }

  #[test]
  fn first_epoch_matches_hand_computation() {
    let mut trainer = Trainer::new(&TRAINING_SET, WeightMatrix::zeroed(), 1);
    let outcomes: Vec<StepOutcome> = trainer.by_ref().collect();
    assert_eq!(outcomes.len(), 6);
    let predicted: Vec<i64> = outcomes.iter().map(|o| o.predicted.as_label()).collect();
    assert_eq!(predicted, vec![-1, 0, 0, 1, -1, -1]);
    assert_eq!(
      trainer.weights().groups(),
      &[[0, 1, -1, 1], [1, 0, 1, 0], [2, 1, 1, 2]]
    );
    assert!(trainer.is_finished());
  }

  #[test]
  fn runs_exactly_epochs_times_examples_steps() {
    let mut trainer = Trainer::new(&TRAINING_SET, WeightMatrix::zeroed(), EPOCHS);
    assert_eq!(trainer.total_steps(), 60);
    let steps = trainer.by_ref().count();
    assert_eq!(steps, 60);
    assert_eq!(trainer.steps_taken(), 60);
    assert_eq!(trainer.epoch(), EPOCHS);
    assert!(trainer.step().is_none());
  }

  #[test]
  fn huge_epoch_counts_saturate_the_step_count() {
    let mut trainer = Trainer::new(&TRAINING_SET, WeightMatrix::zeroed(), usize::MAX);
    assert_eq!(trainer.total_steps(), usize::MAX);
    assert!(!trainer.is_finished());
    trainer.step();
    assert_eq!(trainer.steps_taken(), 1);
  }

  #[test]
  fn does_not_stop_early_once_converged() {
    let converged = train(&TRAINING_SET, WeightMatrix::zeroed(), EPOCHS);
    let mut trainer = Trainer::new(&TRAINING_SET, converged, 3);
    let outcomes: Vec<StepOutcome> = trainer.by_ref().collect();
    assert_eq!(outcomes.len(), 18);
    assert!(outcomes.iter().all(|o| !o.updated));
    assert_eq!(trainer.weights(), converged);
  }

  #[test]
  fn empty_or_zero_epoch_runs_do_nothing() {
    let start = WeightMatrix::from_groups([[1, 2, 3, 4], [0; 4], [0; 4]]);
    assert_eq!(train(&[], start, EPOCHS), start);
    assert_eq!(train(&TRAINING_SET, start, 0), start);
  }

  #[test]
  fn correction_saturates_instead_of_aborting() {
    let weights = WeightMatrix::from_groups([[9, 9, 9, 9], [-9, -9, -9, -9], [0; 4]]);
    let next = correct(&weights, &[1.0; 4], 0, Prediction::Class(1));
    assert_eq!(next, weights);
  }
}
