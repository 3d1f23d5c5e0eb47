pub mod model;
pub mod report;
pub mod session;
pub mod subcommands;
pub mod utils;

use thiserror::Error;

pub use model::{
  scoring, update, InputVector, LabeledExample, Prediction, ScoreVector, Weight, WeightMatrix,
};
pub use session::{CancelToken, NoDelay, Session, TokioPacer, TrainingReport};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Dataset(#[from] model::DatasetError),
  #[error("cannot serialize report: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("a training run is already in progress")]
  TrainingInProgress,
}
