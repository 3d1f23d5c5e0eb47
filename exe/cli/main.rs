mod app_config;

use perceptron::*;

use app_config::AppConfig;
use clap::{Parser, Subcommand};
use model::{parse_input, TrainingParams, EPOCHS, STEP_DELAY};
use std::{error::Error, path::PathBuf, time::Duration};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Three-class teaching perceptron")]
struct Cli {
  /// YAML config file; command-line flags override it
  #[arg(short, long, value_name = "PATH", global = true)]
  config: Option<PathBuf>,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run the paced training procedure and print every step
  Train {
    /// Dataset file (four features and a label per line)
    #[arg(short, long, value_name = "PATH")]
    data: Option<PathBuf>,
    #[arg(short, long, value_name = "INT")]
    epochs: Option<usize>,
    /// Pause between steps in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,
    /// Print JSON lines
    #[arg(long)]
    json: bool,
  },
  /// Score one input against a weight matrix
  Classify {
    /// Four feature values, e.g. "1,0,1,1"
    #[arg(short, long, value_parser = parse_input)]
    input: InputVector,
    /// Three groups of four weights, e.g. "1,1,0,1;0,0,0,0;2,1,1,2"
    #[arg(short, long)]
    weights: WeightMatrix,
    #[arg(long)]
    json: bool,
  },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  utils::init_logging()?;
  let args = Cli::parse();

  let file_config = match &args.config {
    Some(path) => AppConfig::load(path)?,
    None => AppConfig::default(),
  };

  match args.command {
    Command::Train {
      data,
      epochs,
      delay_ms,
      json,
    } => {
      let config = file_config.merge(AppConfig {
        epochs,
        step_delay_ms: delay_ms,
        dataset: data,
        json: json.then_some(true),
      });
      let params = TrainingParams {
        epochs: config.epochs.unwrap_or(EPOCHS),
        step_delay: config
          .step_delay_ms
          .map(Duration::from_millis)
          .unwrap_or(STEP_DELAY),
      };
      let app = subcommands::Train::from_dataset(
        params,
        config.dataset.as_deref(),
        config.json.unwrap_or(false),
      )?;

      let cancel = app.cancel_token();
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          info!("interrupt received, stopping after the current step");
          cancel.cancel();
        }
      });
      app.run(TokioPacer).await?;
    }
    Command::Classify {
      input,
      weights,
      json,
    } => {
      let json = json || file_config.json.unwrap_or(false);
      subcommands::Classify::new(input, weights, json).run()?;
    }
  }
  Ok(())
}
