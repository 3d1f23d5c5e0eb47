use itertools::Itertools;

use super::{InputVector, LabeledExample, Prediction, ScoreVector, WeightGroup, WeightMatrix};

/// Dot product of an input vector and one class's weights.
pub fn score(input: &InputVector, group: &WeightGroup) -> f64 {
  input
    .iter()
    .zip(group.iter())
    .map(|(x, w)| x * f64::from(*w))
    .sum()
}

pub fn score_all(input: &InputVector, matrix: &WeightMatrix) -> ScoreVector {
  let groups = *matrix.groups();
  groups.map(|group| score(input, &group))
}

/// Argmax with ties reported as [`Prediction::Tie`] instead of picking the first index.
pub fn predict(scores: &ScoreVector) -> Prediction {
  let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
  let winners = scores.iter().positions(|s| *s == max).collect_vec();
  match winners.as_slice() {
    [single] => Prediction::Class(*single),
    _ => Prediction::Tie,
  }
}

/// True iff the matrix predicts the example's label with a single winner.
pub fn evaluate(example: &LabeledExample, matrix: &WeightMatrix) -> bool {
  predict(&score_all(&example.input, matrix)).is(example.label)
}

/// Number of examples the matrix classifies correctly.
pub fn accuracy(examples: &[LabeledExample], matrix: &WeightMatrix) -> usize {
  examples.iter().filter(|ex| evaluate(ex, matrix)).count()
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;
  use crate::model::{CLASS_COUNT, MAX_WEIGHT, MIN_WEIGHT};

  #[test]
  fn single_winner_is_predicted() {
    let m = WeightMatrix::from_groups([[5, 0, 0, 0], [3, 0, 0, 0], [0, 0, 0, 0]]);
    let scores = score_all(&[1.0, 0.0, 0.0, 0.0], &m);
    assert_eq!(scores, [5.0, 3.0, 0.0]);
    assert_eq!(predict(&scores), Prediction::Class(0));
  }

  #[test]
  fn zero_matrix_is_a_three_way_tie() {
    let scores = score_all(&[1.0, 1.0, 1.0, 1.0], &WeightMatrix::zeroed());
    assert_eq!(scores, [0.0, 0.0, 0.0]);
    assert_eq!(predict(&scores), Prediction::Tie);
  }

  #[test]
  fn two_way_tie_at_the_top_is_a_tie() {
    assert_eq!(predict(&[2.0, 2.0, -1.0]), Prediction::Tie);
    // a tie below the maximum does not matter
    assert_eq!(predict(&[-1.0, 4.0, -1.0]), Prediction::Class(1));
  }

  #[test]
  fn fractional_inputs_are_scored() {
    let group = [2, -4, 1, 0];
    assert_eq!(score(&[0.5, 0.25, 1.0, 0.3], &group), 1.0);
  }

  #[test]
  fn tie_is_never_correct() {
    let m = WeightMatrix::from_groups([[1, 0, 0, 0], [1, 0, 0, 0], [0, 0, 0, 0]]);
    let ex = LabeledExample::new([1.0, 0.0, 0.0, 0.0], 0).unwrap();
    assert!(!evaluate(&ex, &m));
  }

  #[test]
  fn accuracy_counts_correct_examples() {
    let m = WeightMatrix::from_groups([[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0]]);
    let examples = [
      LabeledExample::new([1.0, 0.0, 0.0, 0.0], 0).unwrap(),
      LabeledExample::new([0.0, 1.0, 0.0, 0.0], 1).unwrap(),
      LabeledExample::new([0.0, 1.0, 0.0, 0.0], 2).unwrap(),
      LabeledExample::new([1.0, 1.0, 0.0, 0.0], 0).unwrap(),
    ];
    assert_eq!(accuracy(&examples, &m), 2);
  }

  fn weight() -> impl Strategy<Value = i32> {
    MIN_WEIGHT..=MAX_WEIGHT
  }

  proptest! {
    #[test]
    fn tie_iff_max_attained_twice(
      groups in prop::array::uniform3(prop::array::uniform4(weight())),
      input in prop::array::uniform4(prop::bool::ANY),
    ) {
      let input = input.map(|b| if b { 1.0 } else { 0.0 });
      let scores = score_all(&input, &WeightMatrix::from_groups(groups));
      let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
      let at_max = scores.iter().filter(|s| **s == max).count();
      let prediction = predict(&scores);
      prop_assert_eq!(prediction == Prediction::Tie, at_max >= 2);
      if let Prediction::Class(c) = prediction {
        prop_assert!(c < CLASS_COUNT);
        prop_assert_eq!(scores[c], max);
      }
    }

    #[test]
    fn zero_matrix_always_ties(input in prop::array::uniform4(0.0..=1.0f64)) {
      prop_assert_eq!(predict(&score_all(&input, &WeightMatrix::zeroed())), Prediction::Tie);
    }
  }
}
