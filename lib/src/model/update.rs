//! Bounded weight updates.
//!
//! Two paths share the same arithmetic. The manual path asks `can_apply_*` first and leaves the
//! matrix alone when the answer is no. The training path calls [`apply_bulk`] unconditionally and
//! lets the clamp saturate at the boundary.

use super::{
  clamp_weight, in_weight_range, InputVector, Weight, WeightMatrix, FEATURE_COUNT, MAX_WEIGHT,
  MIN_WEIGHT,
};

/// Integer contribution of `delta` along one feature. Fractional inputs round to the nearest
/// integer so weights stay integral.
fn scaled_delta(delta: Weight, feature: f64) -> Weight {
  (f64::from(delta) * feature).round() as Weight
}

fn bulk_targets(
  matrix: &WeightMatrix,
  group_index: usize,
  delta: Weight,
  input: &InputVector,
) -> Option<[Weight; FEATURE_COUNT]> {
  let group = matrix.group(group_index)?;
  let mut targets = [0; FEATURE_COUNT];
  for (w, target) in targets.iter_mut().enumerate() {
    *target = group[w].saturating_add(scaled_delta(delta, input[w]));
  }
  Some(targets)
}

pub fn can_apply_single(
  matrix: &WeightMatrix,
  group_index: usize,
  weight_index: usize,
  delta: Weight,
) -> bool {
  matrix
    .weight(group_index, weight_index)
    .map_or(false, |old| in_weight_range(old.saturating_add(delta)))
}

/// Replaces one weight by `old + delta`. Returns the matrix unchanged when
/// [`can_apply_single`] says no, so the clamp below never changes the result of an accepted
/// update.
pub fn apply_single(
  matrix: &WeightMatrix,
  group_index: usize,
  weight_index: usize,
  delta: Weight,
) -> WeightMatrix {
  if !can_apply_single(matrix, group_index, weight_index, delta) {
    return *matrix;
  }
  let mut group = matrix.groups()[group_index];
  group[weight_index] = clamp_weight(group[weight_index] + delta);
  matrix.with_group(group_index, group)
}

/// True iff every weight of the group stays in range after `old + delta * input`, checked before
/// rounding. A single position out of range vetoes the whole update.
pub fn can_apply_bulk(
  matrix: &WeightMatrix,
  group_index: usize,
  delta: Weight,
  input: &InputVector,
) -> bool {
  let Some(group) = matrix.group(group_index) else {
    return false;
  };
  let range = f64::from(MIN_WEIGHT)..=f64::from(MAX_WEIGHT);
  group
    .iter()
    .zip(input)
    .all(|(old, feature)| range.contains(&(f64::from(*old) + f64::from(delta) * feature)))
}

/// Moves every weight of one group by `delta * input`, saturating at the range bounds. Other
/// groups are untouched. Does not consult [`can_apply_bulk`].
pub fn apply_bulk(
  matrix: &WeightMatrix,
  group_index: usize,
  delta: Weight,
  input: &InputVector,
) -> WeightMatrix {
  match bulk_targets(matrix, group_index, delta, input) {
    Some(targets) => matrix.with_group(group_index, targets.map(clamp_weight)),
    None => *matrix,
  }
}

pub fn reset() -> WeightMatrix {
  WeightMatrix::zeroed()
}
