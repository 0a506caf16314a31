// Audio I/O error types and constants

use crate::error::ErrorCode;
use log::error;
use thiserror::Error;

/// Audio error code constants
///
/// Error code range: 1001-1006
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// File could not be opened
    pub const OPEN_FAILED: i32 = 1001;

    /// Container or sample data could not be decoded
    pub const DECODE_FAILED: i32 = 1002;

    /// Sample format not supported by the reader
    pub const UNSUPPORTED_FORMAT: i32 = 1003;

    /// Writing an output file failed
    pub const WRITE_FAILED: i32 = 1004;

    /// Sample rate conversion failed
    pub const RESAMPLE_FAILED: i32 = 1005;

    /// File decoded to zero samples
    pub const EMPTY_AUDIO: i32 = 1006;
}

/// Log an audio error with structured context
///
/// The message carries the numeric code, the component and the
/// human-readable message, so log scrapers can group failures per file.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioIo, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio I/O errors
///
/// These cover reading recordings from disk, converting their sample rate and
/// writing segmented coughs back out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("failed to open {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("failed to decode {path}: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("unsupported sample format in {path}: {details}")]
    UnsupportedFormat { path: String, details: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("failed to resample from {from} Hz to {to} Hz: {reason}")]
    ResampleFailed { from: u32, to: u32, reason: String },

    #[error("{path} contains no audio samples")]
    EmptyAudio { path: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::OpenFailed { .. } => AudioErrorCodes::OPEN_FAILED,
            AudioError::DecodeFailed { .. } => AudioErrorCodes::DECODE_FAILED,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::WriteFailed { .. } => AudioErrorCodes::WRITE_FAILED,
            AudioError::ResampleFailed { .. } => AudioErrorCodes::RESAMPLE_FAILED,
            AudioError::EmptyAudio { .. } => AudioErrorCodes::EMPTY_AUDIO,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
