// Batch runner - segment coughs across a date/participant directory tree
//
// Layout: <input_dir>/<date>/<participant>/<filename>
// Output: <output_dir>/<participant>/cough-<n>.wav
//
// The date level is dropped from the output path, so a participant recorded on
// two dates writes into one folder and the later date overwrites the earlier
// files. Both levels are visited in sorted order; plain files are ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::analysis::segment_cough;
use crate::audio::{load_resampled, write_wav};
use crate::config::SegmentationConfig;
use crate::error::{log_audio_error, AudioError};

/// One participant folder found during the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    /// The expected recording exists
    Found {
        date: String,
        participant: String,
        path: PathBuf,
    },
    /// The participant folder lacks the expected recording
    Missing {
        date: String,
        participant: String,
        folder: PathBuf,
    },
}

impl ScanEntry {
    pub fn participant(&self) -> &str {
        match self {
            ScanEntry::Found { participant, .. } | ScanEntry::Missing { participant, .. } => {
                participant
            }
        }
    }
}

/// Result of segmenting one recording
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Segments were written as cough-1.wav .. cough-<segments>.wav
    Written { segments: usize, output_dir: PathBuf },
    /// No segment passed the filters; nothing was created
    NoCoughs,
    /// The recording could not be read
    LoadFailed(AudioError),
    /// The output folder or a segment file could not be written
    WriteFailed(AudioError),
}

/// Counters logged at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub found: usize,
    pub missing: usize,
    pub processed: usize,
    pub no_coughs: usize,
    pub failed: usize,
    pub segments_written: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Written { segments, .. } => {
                self.processed += 1;
                self.segments_written += segments;
            }
            FileOutcome::NoCoughs => {
                self.processed += 1;
                self.no_coughs += 1;
            }
            FileOutcome::LoadFailed(_) | FileOutcome::WriteFailed(_) => self.failed += 1,
        }
    }
}

/// Batch parameters taken from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub filename: String,
    pub fs_out: u32,
}

/// Sorted names of the sub-directories of `dir`
fn sorted_subdirs(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// List every `<date>/<participant>` folder under `input_dir`
///
/// Fails only when `input_dir` itself cannot be read; unreadable date folders
/// are logged and skipped.
pub fn scan(input_dir: &Path, filename: &str) -> io::Result<Vec<ScanEntry>> {
    let mut entries = Vec::new();

    for (date, date_path) in sorted_subdirs(input_dir)? {
        let participants = match sorted_subdirs(&date_path) {
            Ok(participants) => participants,
            Err(err) => {
                tracing::warn!("Skipping unreadable folder {}: {}", date_path.display(), err);
                continue;
            }
        };

        for (participant, folder) in participants {
            let path = folder.join(filename);
            if path.exists() {
                entries.push(ScanEntry::Found {
                    date: date.clone(),
                    participant,
                    path,
                });
            } else {
                entries.push(ScanEntry::Missing {
                    date: date.clone(),
                    participant,
                    folder,
                });
            }
        }
    }

    Ok(entries)
}

/// Segment one recording and write its coughs into `output_dir`
pub fn process_file(
    input: &Path,
    output_dir: &Path,
    fs_out: u32,
    config: &SegmentationConfig,
) -> FileOutcome {
    tracing::info!(
        "Segmenting cough from {} -> to -> {}",
        input.display(),
        output_dir.display()
    );

    let wave = match load_resampled(input, fs_out) {
        Ok(wave) => wave,
        Err(err) => {
            log_audio_error(&err, "load_resampled");
            return FileOutcome::LoadFailed(err);
        }
    };

    let segmentation = segment_cough(&wave, config);
    if segmentation.is_empty() {
        tracing::info!("No cough segments found in {}.", input.display());
        return FileOutcome::NoCoughs;
    }

    if !output_dir.exists() {
        if let Err(err) = fs::create_dir_all(output_dir) {
            let err = AudioError::WriteFailed {
                path: output_dir.display().to_string(),
                reason: err.to_string(),
            };
            log_audio_error(&err, "create_dir_all");
            return FileOutcome::WriteFailed(err);
        }
        tracing::info!("Created directory: {}", output_dir.display());
    }

    tracing::info!(
        "Found {} cough segments in {}",
        segmentation.len(),
        input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    );

    for (i, clip) in segmentation.extract(&wave).iter().enumerate() {
        let path = output_dir.join(format!("cough-{}.wav", i + 1));
        if let Err(err) = write_wav(&path, clip) {
            log_audio_error(&err, "write_wav");
            return FileOutcome::WriteFailed(err);
        }
        tracing::info!("  > Wrote segment to {}", path.display());
    }

    FileOutcome::Written {
        segments: segmentation.len(),
        output_dir: output_dir.to_path_buf(),
    }
}

/// Scan `input_dir` and segment every recording found
pub fn run(options: &BatchOptions, config: &SegmentationConfig) -> io::Result<BatchSummary> {
    tracing::info!("Starting scan in root directory: {}", options.input_dir.display());
    tracing::info!(
        "Looking for files named '{}' in participant subfolders.",
        options.filename
    );

    let mut summary = BatchSummary::default();
    for entry in scan(&options.input_dir, &options.filename)? {
        match &entry {
            ScanEntry::Found {
                date,
                participant,
                path,
            } => {
                tracing::info!("Found participant '{}' in '{}'", participant, date);
                summary.found += 1;
                let output_dir = options.output_dir.join(participant);
                let outcome = process_file(path, &output_dir, options.fs_out, config);
                summary.record(&outcome);
            }
            ScanEntry::Missing { folder, .. } => {
                tracing::info!(
                    "Skipping '{}': File '{}' not found.",
                    folder.display(),
                    options.filename
                );
                summary.missing += 1;
            }
        }
    }

    tracing::info!(
        found = summary.found,
        missing = summary.missing,
        failed = summary.failed,
        no_coughs = summary.no_coughs,
        segments = summary.segments_written,
        "All processing complete."
    );
    Ok(summary)
}
