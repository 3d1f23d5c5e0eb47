//! Application session: the single owner of the mutable classroom state.
//!
//! Weights and the current input live in `watch` channels. Every write publishes a whole new
//! value, so a subscriber never sees a half-updated matrix. Manual edits are refused while a
//! training run holds the in-progress flag.

use std::{
  future::Future,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::model::{
  clamp_input, scoring, update, InputVector, LabeledExample, Prediction, ScoreVector, StepOutcome,
  Trainer, TrainingParams, Weight, WeightMatrix,
};

/// Input shown when a session starts.
pub const INITIAL_INPUT: InputVector = [0.0, 1.0, 1.0, 1.0];

/// Waits between training steps. Injected so tests run without real time passing.
pub trait Pacer {
  fn pause(&mut self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
  fn pause(&mut self, delay: Duration) -> impl Future<Output = ()> + Send {
    tokio::time::sleep(delay)
  }
}

/// Never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Pacer for NoDelay {
  fn pause(&mut self, _delay: Duration) -> impl Future<Output = ()> + Send {
    std::future::ready(())
  }
}

pub trait TrainingObserver {
  fn on_step(&mut self, _outcome: &StepOutcome) {}
}

impl TrainingObserver for () {}

impl<F: FnMut(&StepOutcome)> TrainingObserver for F {
  fn on_step(&mut self, outcome: &StepOutcome) {
    self(outcome)
  }
}

/// Cooperative cancellation, checked between training steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingReport {
  pub steps: usize,
  pub updates: usize,
  pub epochs_completed: usize,
  pub cancelled: bool,
  pub weights: WeightMatrix,
}

/// Holds the in-progress flag for the lifetime of one training run. Dropping it (normal end,
/// cancellation, or the future being dropped) clears the flag.
struct TrainingFlag<'a>(&'a AtomicBool);

impl<'a> TrainingFlag<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| TrainingFlag(flag))
  }
}

impl Drop for TrainingFlag<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

#[derive(Debug)]
pub struct Session {
  weights: watch::Sender<WeightMatrix>,
  input: watch::Sender<InputVector>,
  training: AtomicBool,
}

impl Default for Session {
  fn default() -> Self {
    Session::new()
  }
}

impl Session {
  pub fn new() -> Self {
    Session::with_weights(update::reset())
  }

  pub fn with_weights(weights: WeightMatrix) -> Self {
    Session {
      weights: watch::Sender::new(weights),
      input: watch::Sender::new(INITIAL_INPUT),
      training: AtomicBool::new(false),
    }
  }

  pub fn weights(&self) -> WeightMatrix {
    *self.weights.borrow()
  }

  pub fn input(&self) -> InputVector {
    *self.input.borrow()
  }

  pub fn subscribe_weights(&self) -> watch::Receiver<WeightMatrix> {
    self.weights.subscribe()
  }

  pub fn subscribe_input(&self) -> watch::Receiver<InputVector> {
    self.input.subscribe()
  }

  pub fn is_training(&self) -> bool {
    self.training.load(Ordering::Acquire)
  }

  pub fn scores(&self) -> ScoreVector {
    scoring::score_all(&self.input(), &self.weights())
  }

  pub fn prediction(&self) -> Prediction {
    scoring::predict(&self.scores())
  }

  /// Correctness of each example under the current weights.
  pub fn evaluate_examples(&self, examples: &[LabeledExample]) -> Vec<bool> {
    let weights = self.weights();
    examples
      .iter()
      .map(|ex| scoring::evaluate(ex, &weights))
      .collect()
  }

  pub fn accuracy(&self, examples: &[LabeledExample]) -> usize {
    scoring::accuracy(examples, &self.weights())
  }

  /// Sets the current input, clamping every feature to [0, 1]. Refused while training.
  pub fn set_input(&self, input: InputVector) -> bool {
    let training = &self.training;
    let mut accepted = false;
    self.input.send_if_modified(|current| {
      if training.load(Ordering::Acquire) {
        debug!("input change refused while training");
        return false;
      }
      accepted = true;
      let next = input.map(clamp_input);
      let changed = next != *current;
      *current = next;
      changed
    });
    accepted
  }

  pub fn load_example(&self, example: &LabeledExample) -> bool {
    self.set_input(example.input)
  }

  /// Whether the example's input is the one currently shown.
  pub fn is_loaded(&self, example: &LabeledExample) -> bool {
    self.input() == example.input
  }

  pub fn can_apply_single(&self, group_index: usize, weight_index: usize, delta: Weight) -> bool {
    !self.is_training()
      && update::can_apply_single(&self.weights(), group_index, weight_index, delta)
  }

  /// Manual single-weight step. Returns whether the weights changed.
  pub fn apply_single(&self, group_index: usize, weight_index: usize, delta: Weight) -> bool {
    self.modify_weights(|weights| {
      if !update::can_apply_single(weights, group_index, weight_index, delta) {
        return None;
      }
      Some(update::apply_single(weights, group_index, weight_index, delta))
    })
  }

  /// Bulk check against the current input.
  pub fn can_apply_bulk(&self, group_index: usize, delta: Weight) -> bool {
    !self.is_training()
      && update::can_apply_bulk(&self.weights(), group_index, delta, &self.input())
  }

  /// Manual bulk step along the current input. Returns whether the weights changed.
  pub fn apply_bulk(&self, group_index: usize, delta: Weight) -> bool {
    let input = self.input();
    self.modify_weights(|weights| {
      if !update::can_apply_bulk(weights, group_index, delta, &input) {
        return None;
      }
      Some(update::apply_bulk(weights, group_index, delta, &input))
    })
  }

  pub fn reset_weights(&self) -> bool {
    self.modify_weights(|_| Some(update::reset()))
  }

  /// Publishes the matrix returned by `f`, unless training runs, `f` declines, or nothing changed.
  fn modify_weights(&self, f: impl FnOnce(&WeightMatrix) -> Option<WeightMatrix>) -> bool {
    let training = &self.training;
    self.weights.send_if_modified(|weights| {
      if training.load(Ordering::Acquire) {
        debug!("manual weight change refused while training");
        return false;
      }
      match f(weights) {
        Some(next) if next != *weights => {
          *weights = next;
          true
        }
        _ => false,
      }
    })
  }

  /// Runs the paced training procedure from the current weights.
  ///
  /// Returns `None` without touching anything when a run is already in progress. Before each
  /// step the example's input is published, after an updating step the new weights are
  /// published, then the pacer is awaited. Cancellation is honoured between steps only.
  #[tracing::instrument(
    level = "info",
    skip_all,
    fields(epochs = params.epochs, examples = examples.len())
  )]
  pub async fn train<P, O>(
    &self,
    params: TrainingParams,
    examples: &[LabeledExample],
    pacer: &mut P,
    cancel: &CancelToken,
    observer: &mut O,
  ) -> Option<TrainingReport>
  where
    P: Pacer,
    O: TrainingObserver,
  {
    let Some(_flag) = TrainingFlag::acquire(&self.training) else {
      warn!("training already in progress, start request ignored");
      return None;
    };

    let mut trainer = Trainer::new(examples, self.weights(), params.epochs);
    info!("training for {} steps", trainer.total_steps());
    let mut cancelled = false;
    while let Some(example) = trainer.peek() {
      if cancel.is_cancelled() {
        info!("training cancelled after {} steps", trainer.steps_taken());
        cancelled = true;
        break;
      }
      self.input.send_replace(example.input);
      let Some(outcome) = trainer.step() else {
        break;
      };
      if outcome.updated {
        self.weights.send_replace(outcome.weights);
      }
      observer.on_step(&outcome);
      pacer.pause(params.step_delay).await;
    }

    let report = TrainingReport {
      steps: trainer.steps_taken(),
      updates: trainer.updates(),
      epochs_completed: trainer.epoch(),
      cancelled,
      weights: trainer.weights(),
    };
    info!(
      "training finished: {} steps, {} updates, weights {}",
      report.steps, report.updates, report.weights
    );
    Some(report)
  }
}
