use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::{LabeledExample, CLASS_COUNT, FEATURE_COUNT};

/// Display names of the three classes, in group order.
pub const CLASS_NAMES: [&str; CLASS_COUNT] = ["Wecker", "Apfel", "Hund"];

pub const TRAINING_SET: [LabeledExample; 6] = [
  LabeledExample::fixed([1.0, 1.0, 0.0, 1.0], 0),
  LabeledExample::fixed([1.0, 1.0, 1.0, 0.0], 0),
  LabeledExample::fixed([1.0, 0.0, 1.0, 0.0], 1),
  LabeledExample::fixed([1.0, 0.0, 0.0, 0.0], 1),
  LabeledExample::fixed([1.0, 0.0, 0.0, 1.0], 2),
  LabeledExample::fixed([1.0, 1.0, 1.0, 1.0], 2),
];

/// Held out from training. Only ever scored.
pub const EVALUATION_SET: [LabeledExample; 2] = [
  LabeledExample::fixed([1.0, 1.0, 0.0, 0.0], 0),
  LabeledExample::fixed([1.0, 0.0, 1.0, 1.0], 2),
];

pub fn class_name(class: usize) -> &'static str {
  CLASS_NAMES.get(class).copied().unwrap_or("?")
}

#[derive(Debug, Error)]
pub enum DatasetError {
  #[error("line {line}: expected {expected} columns, found {found}")]
  ColumnCount {
    line: usize,
    expected: usize,
    found: usize,
  },
  #[error("line {line}: cannot parse {value:?} as a number")]
  Number { line: usize, value: String },
  #[error("line {line}: label {label} is not a class below {}", CLASS_COUNT)]
  Label { line: usize, label: String },
  #[error("dataset is empty")]
  Empty,
  #[error("failed to read {path:?}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
}

/// Parses one example per line: four feature values followed by the class label.
///
/// Blank lines and lines starting with `#` are skipped. Feature values are clamped to [0, 1].
pub fn parse_dataset(content: &str) -> Result<Vec<LabeledExample>, DatasetError> {
  let mut examples = Vec::new();
  for (i, line) in content.lines().enumerate() {
    let line_no = i + 1;
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != FEATURE_COUNT + 1 {
      return Err(DatasetError::ColumnCount {
        line: line_no,
        expected: FEATURE_COUNT + 1,
        found: parts.len(),
      });
    }
    let mut input = [0.0; FEATURE_COUNT];
    for (slot, raw) in input.iter_mut().zip(&parts[..FEATURE_COUNT]) {
      *slot = raw.parse::<f64>().map_err(|_| DatasetError::Number {
        line: line_no,
        value: raw.to_string(),
      })?;
    }
    let raw_label = parts[FEATURE_COUNT];
    let example = raw_label
      .parse::<usize>()
      .ok()
      .and_then(|label| LabeledExample::new(input, label))
      .ok_or_else(|| DatasetError::Label {
        line: line_no,
        label: raw_label.to_string(),
      })?;
    examples.push(example);
  }
  if examples.is_empty() {
    return Err(DatasetError::Empty);
  }
  Ok(examples)
}

pub fn read_dataset(path: &Path) -> Result<Vec<LabeledExample>, DatasetError> {
  let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let examples = parse_dataset(&content)?;
  debug!("read {} examples from {:?}", examples.len(), path);
  Ok(examples)
}
