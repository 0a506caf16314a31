// Error types for the cough detector
//
// This module defines custom error types for audio I/O and signal analysis,
// providing structured error handling with stable numeric error codes so the
// CLIs can log them uniformly.

mod analysis;
mod audio;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use audio::{log_audio_error, AudioError, AudioErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and the command-line tools.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_ranges_do_not_overlap() {
        let audio = AudioError::EmptyAudio {
            path: "a.wav".to_string(),
        };
        let analysis = AnalysisError::SilentSignal;

        assert!((1001..=1099).contains(&audio.code()));
        assert!((2001..=2099).contains(&analysis.code()));
    }

    #[test]
    fn test_message_matches_display() {
        let err = AnalysisError::SignalTooShort {
            len: 3,
            required: 16,
        };
        assert_eq!(err.message(), err.to_string());
    }
}
