use serde::{Deserialize, Serialize};

use crate::{
  model::{class_name, InputVector, ScoreVector, StepOutcome, WeightMatrix},
  session::Session,
};

/// One training step as shown to the learner. `predicted` is -1 for a tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
  pub epoch: usize,
  pub example: usize,
  pub input: InputVector,
  pub label: usize,
  pub predicted: i64,
  pub updated: bool,
  pub weights: WeightMatrix,
}

impl From<&StepOutcome> for StepReport {
  fn from(outcome: &StepOutcome) -> Self {
    StepReport {
      epoch: outcome.epoch,
      example: outcome.example,
      input: outcome.input,
      label: outcome.label,
      predicted: outcome.predicted.as_label(),
      updated: outcome.updated,
      weights: outcome.weights,
    }
  }
}

impl StepReport {
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }

  pub fn to_text(&self) -> String {
    let verdict = if self.updated { "corrected" } else { "ok" };
    format!(
      "epoch {:>2} example {} label {} ({}) predicted {:>2} {:<9} weights {}",
      self.epoch + 1,
      self.example,
      self.label,
      class_name(self.label),
      self.predicted,
      verdict,
      self.weights
    )
  }
}

/// Everything the display needs at one instant, recomputed from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
  pub input: InputVector,
  pub weights: WeightMatrix,
  pub scores: ScoreVector,
  pub prediction: i64,
  pub training: bool,
}

impl SessionSnapshot {
  pub fn of(session: &Session) -> Self {
    let input = session.input();
    let weights = session.weights();
    let scores = crate::model::scoring::score_all(&input, &weights);
    SessionSnapshot {
      input,
      weights,
      scores,
      prediction: crate::model::scoring::predict(&scores).as_label(),
      training: session.is_training(),
    }
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }

  pub fn to_text(&self) -> String {
    let winner = match self.prediction {
      -1 => "no clear winner".to_string(),
      class => format!("{} ({})", class, class_name(class as usize)),
    };
    format!(
      "input {:?} scores {:?} -> {}",
      self.input, self.scores, winner
    )
  }
}
