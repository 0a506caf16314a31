use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cough_detector::audio::read_audio;
use cough_detector::{init_logging, CoughClassifier, CoughConfig};

#[derive(Parser, Debug)]
#[command(name = "detect_cough", about = "Estimate the probability that a recording is a cough")]
struct Cli {
    /// Path to input audio file
    #[arg(short = 'i', long = "input")]
    input: PathBuf,
    /// Boosted-tree classifier in XGBoost JSON format
    #[arg(long, default_value = "models/cough_classifier.json")]
    model: PathBuf,
    /// Feature scaler fitted alongside the classifier
    #[arg(long, default_value = "models/cough_classification_scaler.json")]
    scaler: PathBuf,
    /// Optional JSON file overriding the pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = CoughConfig::load_or_default(cli.config.as_ref());
    let classifier = CoughClassifier::load(&cli.model, &cli.scaler, &config).with_context(|| {
        format!(
            "failed to load classifier artifacts ({}, {})",
            cli.model.display(),
            cli.scaler.display()
        )
    })?;

    let wave = read_audio(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let probability = classifier.classify(&wave);
    println!("{} has probability of cough: {}", cli.input.display(), probability);
    Ok(())
}
