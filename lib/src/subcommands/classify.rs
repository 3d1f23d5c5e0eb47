use crate::{
  model::{InputVector, WeightMatrix},
  report::SessionSnapshot,
  session::Session,
  Error,
};

/// Scores one input against a given weight matrix.
pub struct Classify {
  input: InputVector,
  weights: WeightMatrix,
  json: bool,
}

impl Classify {
  pub fn new(input: InputVector, weights: WeightMatrix, json: bool) -> Self {
    Self {
      input,
      weights,
      json,
    }
  }

  pub fn run(self) -> Result<SessionSnapshot, Error> {
    let session = Session::with_weights(self.weights);
    session.set_input(self.input);
    let snapshot = SessionSnapshot::of(&session);
    if self.json {
      println!("{}", snapshot.to_json()?);
    } else {
      println!("{}", snapshot.to_text());
    }
    Ok(snapshot)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_with_given_weights() {
    let weights = WeightMatrix::from_groups([[5, 0, 0, 0], [3, 0, 0, 0], [0; 4]]);
    let snapshot = Classify::new([1.0, 0.0, 0.0, 0.0], weights, true).run().unwrap();
    assert_eq!(snapshot.scores, [5.0, 3.0, 0.0]);
    assert_eq!(snapshot.prediction, 0);
  }
}
