use std::path::Path;

use tracing::{info, warn};

use crate::{
  model::{
    read_dataset, LabeledExample, StepOutcome, TrainingParams, EVALUATION_SET, TRAINING_SET,
  },
  report::StepReport,
  session::{CancelToken, Pacer, Session, TrainingObserver, TrainingReport},
  Error,
};

/// Prints every step, either as text or as one JSON object per line.
pub struct StepPrinter {
  json: bool,
}

impl TrainingObserver for StepPrinter {
  fn on_step(&mut self, outcome: &StepOutcome) {
    let report = StepReport::from(outcome);
    if !self.json {
      println!("{}", report.to_text());
      return;
    }
    match report.to_json() {
      Ok(line) => println!("{}", line),
      Err(e) => warn!("cannot serialize step: {}", e),
    }
  }
}

pub struct Train {
  session: Session,
  params: TrainingParams,
  examples: Vec<LabeledExample>,
  json: bool,
  cancel: CancelToken,
}

impl Train {
  pub fn new(params: TrainingParams, examples: Option<Vec<LabeledExample>>, json: bool) -> Self {
    Self {
      session: Session::new(),
      params,
      examples: examples.unwrap_or_else(|| TRAINING_SET.to_vec()),
      json,
      cancel: CancelToken::new(),
    }
  }

  /// Trains on the dataset file at `dataset`, or on the bundled training set when there is none.
  pub fn from_dataset(
    params: TrainingParams,
    dataset: Option<&Path>,
    json: bool,
  ) -> Result<Self, Error> {
    let examples = dataset.map(read_dataset).transpose()?;
    Ok(Self::new(params, examples, json))
  }

  /// Token that stops the run before its next step.
  pub fn cancel_token(&self) -> CancelToken {
    self.cancel.clone()
  }

  pub async fn run<P: Pacer>(self, mut pacer: P) -> Result<TrainingReport, Error> {
    let mut printer = StepPrinter { json: self.json };
    let report = self
      .session
      .train(
        self.params,
        &self.examples,
        &mut pacer,
        &self.cancel,
        &mut printer,
      )
      .await
      .ok_or(Error::TrainingInProgress)?;

    let train_correct = self.session.accuracy(&self.examples);
    let eval_correct = self.session.accuracy(&EVALUATION_SET);
    info!(
      "training set {}/{}, held-out set {}/{}",
      train_correct,
      self.examples.len(),
      eval_correct,
      EVALUATION_SET.len()
    );

    if self.json {
      println!("{}", serde_json::to_string(&report)?);
    } else {
      println!("final weights {}", report.weights);
      println!(
        "{} steps, {} updates{}",
        report.steps,
        report.updates,
        if report.cancelled { " (cancelled)" } else { "" }
      );
      println!(
        "training set: {}/{} correct, held-out set: {}/{} correct",
        train_correct,
        self.examples.len(),
        eval_correct,
        EVALUATION_SET.len()
      );
    }
    Ok(report)
  }
}
