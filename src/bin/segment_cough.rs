use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cough_detector::batch::{self, BatchOptions};
use cough_detector::{init_logging, CoughConfig};

/// Segment coughs from a nested date/participant directory structure.
///
/// Scans <input_dir>/<date>/<participant>/<filename> and writes each detected
/// cough to <output_dir>/<participant>/cough-<n>.wav.
#[derive(Parser, Debug)]
#[command(name = "segment_cough")]
struct Cli {
    /// Root directory containing date folders (e.g., ./folder)
    #[arg(short = 'i', long = "input_dir")]
    input_dir: PathBuf,
    /// Base output directory to store the results (e.g., ./newdir)
    #[arg(short = 'o', long = "output_dir", default_value = "./segmented_coughs")]
    output_dir: PathBuf,
    /// The name of the audio file to find within each participant folder
    #[arg(short = 'f', long = "filename", default_value = "cough-heavy.wav")]
    filename: String,
    /// Output sampling rate (also accepted as -fs)
    #[arg(long = "fs_out", visible_alias = "fs", default_value_t = 16_000)]
    fs_out: u32,
    /// Optional JSON file overriding the segmentation parameters
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Rewrite the single-dash `-fs` spelling to `--fs_out`
///
/// clap would otherwise read `-fs` as `-f s`.
fn expand_fs_flag<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-fs") => OsString::from("--fs_out"),
            Some(value) if value.starts_with("-fs=") => {
                OsString::from(format!("--fs_out={}", &value["-fs=".len()..]))
            }
            _ => arg,
        })
        .collect()
}

fn main() -> ExitCode {
    init_logging();
    match run(Cli::parse_from(expand_fs_flag(std::env::args_os()))) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input_dir.is_dir() {
        bail!("Input directory not found: {}", cli.input_dir.display());
    }
    if cli.fs_out == 0 {
        bail!("Output sampling rate must be greater than 0");
    }

    let config = CoughConfig::load_or_default(cli.config.as_ref());
    let options = BatchOptions {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        filename: cli.filename,
        fs_out: cli.fs_out,
    };

    batch::run(&options, &config.segmentation)
        .with_context(|| format!("failed to scan {}", options.input_dir.display()))?;
    Ok(())
}
