use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of output classes (weight groups).
pub const CLASS_COUNT: usize = 3;
/// Number of input features per example.
pub const FEATURE_COUNT: usize = 4;

pub const MIN_WEIGHT: Weight = -9;
pub const MAX_WEIGHT: Weight = 9;

pub type Weight = i32;
pub type InputVector = [f64; FEATURE_COUNT];
pub type WeightGroup = [Weight; FEATURE_COUNT];
/// One score per class, in group order. Always recomputed, never stored.
pub type ScoreVector = [f64; CLASS_COUNT];

/// Clamps a single feature value to [0, 1].
pub fn clamp_input(value: f64) -> f64 {
  // NaN would otherwise survive f64::clamp
  if value.is_nan() {
    return 0.0;
  }
  value.clamp(0.0, 1.0)
}

pub fn clamp_weight(value: Weight) -> Weight {
  value.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

pub fn in_weight_range(value: Weight) -> bool {
  (MIN_WEIGHT..=MAX_WEIGHT).contains(&value)
}

/// The 3x4 weight matrix.
///
/// The matrix is `Copy`, every mutation produces a whole new matrix, and every constructor keeps
/// each weight inside `[MIN_WEIGHT, MAX_WEIGHT]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "[WeightGroup; CLASS_COUNT]", into = "[WeightGroup; CLASS_COUNT]")]
pub struct WeightMatrix([WeightGroup; CLASS_COUNT]);

impl WeightMatrix {
  pub const fn zeroed() -> Self {
    WeightMatrix([[0; FEATURE_COUNT]; CLASS_COUNT])
  }

  /// Builds a matrix, clamping every weight into range.
  pub fn from_groups(groups: [WeightGroup; CLASS_COUNT]) -> Self {
    WeightMatrix(groups.map(|group| group.map(clamp_weight)))
  }

  pub fn groups(&self) -> &[WeightGroup; CLASS_COUNT] {
    &self.0
  }

  pub fn group(&self, group_index: usize) -> Option<&WeightGroup> {
    self.0.get(group_index)
  }

  pub fn weight(&self, group_index: usize, weight_index: usize) -> Option<Weight> {
    self.group(group_index)?.get(weight_index).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = &WeightGroup> {
    self.0.iter()
  }

  /// Replaces one group. The caller is responsible for the values being in range, which is why
  /// this stays crate-private: only the update policy writes through it.
  pub(crate) fn with_group(mut self, group_index: usize, group: WeightGroup) -> Self {
    self.0[group_index] = group;
    self
  }
}

impl TryFrom<[WeightGroup; CLASS_COUNT]> for WeightMatrix {
  type Error = ParseError;

  fn try_from(groups: [WeightGroup; CLASS_COUNT]) -> Result<Self, Self::Error> {
    match groups.iter().flatten().find(|w| !in_weight_range(**w)) {
      Some(w) => Err(ParseError::Range(*w)),
      None => Ok(WeightMatrix(groups)),
    }
  }
}

impl From<WeightMatrix> for [WeightGroup; CLASS_COUNT] {
  fn from(matrix: WeightMatrix) -> Self {
    matrix.0
  }
}

impl fmt::Display for WeightMatrix {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, group) in self.0.iter().enumerate() {
      if i > 0 {
        write!(f, " | ")?;
      }
      for (j, w) in group.iter().enumerate() {
        if j > 0 {
          write!(f, " ")?;
        }
        write!(f, "{:>2}", w)?;
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("expected {expected} values, found {found}")]
  Count { expected: usize, found: usize },
  #[error("cannot parse {0:?} as a number")]
  Value(String),
  #[error("weight {} outside of [{}, {}]", .0, MIN_WEIGHT, MAX_WEIGHT)]
  Range(Weight),
}

fn split_values(s: &str) -> Vec<&str> {
  s.split(|c: char| c == ',' || c.is_whitespace())
    .filter(|part| !part.is_empty())
    .collect()
}

/// Parses four comma or space separated feature values, clamping each to [0, 1].
pub fn parse_input(s: &str) -> Result<InputVector, ParseError> {
  let parts = split_values(s);
  if parts.len() != FEATURE_COUNT {
    return Err(ParseError::Count {
      expected: FEATURE_COUNT,
      found: parts.len(),
    });
  }
  let mut input = [0.0; FEATURE_COUNT];
  for (slot, raw) in input.iter_mut().zip(parts) {
    let value = raw
      .parse::<f64>()
      .map_err(|_| ParseError::Value(raw.to_string()))?;
    *slot = clamp_input(value);
  }
  Ok(input)
}

/// Groups separated by `;`, weights by `,` or spaces: `"1,1,0,1; 0,0,0,0; 2,1,1,2"`.
impl FromStr for WeightMatrix {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let rows: Vec<&str> = s.split(';').collect();
    if rows.len() != CLASS_COUNT {
      return Err(ParseError::Count {
        expected: CLASS_COUNT,
        found: rows.len(),
      });
    }
    let mut groups = [[0; FEATURE_COUNT]; CLASS_COUNT];
    for (group, row) in groups.iter_mut().zip(rows) {
      let parts = split_values(row);
      if parts.len() != FEATURE_COUNT {
        return Err(ParseError::Count {
          expected: FEATURE_COUNT,
          found: parts.len(),
        });
      }
      for (slot, raw) in group.iter_mut().zip(parts) {
        *slot = raw
          .parse::<Weight>()
          .map_err(|_| ParseError::Value(raw.to_string()))?;
      }
    }
    WeightMatrix::try_from(groups)
  }
}

/// Outcome of the argmax over a score vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prediction {
  /// A single class attains the maximum score.
  Class(usize),
  /// Two or more classes share the maximum, including the all-zero start state.
  Tie,
}

impl Prediction {
  /// Integer form used by the presentation layer: the class index, or -1 for a tie.
  pub fn as_label(&self) -> i64 {
    match self {
      Prediction::Class(class) => *class as i64,
      Prediction::Tie => -1,
    }
  }

  pub fn class(&self) -> Option<usize> {
    match self {
      Prediction::Class(class) => Some(*class),
      Prediction::Tie => None,
    }
  }

  pub fn is(&self, label: usize) -> bool {
    self.class() == Some(label)
  }
}

impl fmt::Display for Prediction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Prediction::Class(class) => write!(f, "{}", class),
      Prediction::Tie => write!(f, "tie"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
  pub input: InputVector,
  pub label: usize,
}

impl LabeledExample {
  /// Returns `None` for a label outside of `0..CLASS_COUNT`. Inputs are clamped to [0, 1].
  pub fn new(input: InputVector, label: usize) -> Option<Self> {
    if label >= CLASS_COUNT {
      return None;
    }
    Some(LabeledExample {
      input: input.map(clamp_input),
      label,
    })
  }

  pub(crate) const fn fixed(input: InputVector, label: usize) -> Self {
    LabeledExample { input, label }
  }
}
