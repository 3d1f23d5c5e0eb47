use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Settings for a training run. Also defines the config file format (every field can be omitted).
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
  /// Passes over the training set
  pub epochs: Option<usize>,
  /// Pause between two steps, in milliseconds
  pub step_delay_ms: Option<u64>,
  /// Dataset file used instead of the built-in training set
  pub dataset: Option<PathBuf>,
  /// Print JSON lines instead of text
  pub json: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("cannot read config {path:?}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("invalid config {path:?}: {source}")]
  Yaml {
    path: PathBuf,
    source: serde_yaml::Error,
  },
}

impl AppConfig {
  pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
    // an empty file is a valid, empty config
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(content)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_yaml(&content).map_err(|source| ConfigError::Yaml {
      path: path.to_path_buf(),
      source,
    })
  }

  // merge configs where the second overwrites the first
  pub fn merge(self, other: Self) -> Self {
    Self {
      epochs: other.epochs.or(self.epochs),
      step_delay_ms: other.step_delay_ms.or(self.step_delay_ms),
      dataset: other.dataset.or(self.dataset),
      json: other.json.or(self.json),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn later_config_wins() {
    let file = AppConfig::from_yaml("epochs: 3\nstep_delay_ms: 100\njson: true\n").unwrap();
    let flags = AppConfig {
      epochs: Some(5),
      ..AppConfig::default()
    };
    let merged = file.merge(flags);
    assert_eq!(merged.epochs, Some(5));
    assert_eq!(merged.step_delay_ms, Some(100));
    assert_eq!(merged.json, Some(true));
    assert_eq!(merged.dataset, None);
  }

  #[test]
  fn empty_and_unknown() {
    assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    assert!(AppConfig::from_yaml("epoch: 3").is_err());
  }
}
