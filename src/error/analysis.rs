// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use thiserror::Error;

/// Analysis error code constants
///
/// Error code range: 2001-2009
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Sample rate must be greater than zero
    pub const INVALID_SAMPLE_RATE: i32 = 2001;

    /// Signal is too short for the requested operation
    pub const SIGNAL_TOO_SHORT: i32 = 2002;

    /// Signal carries no energy
    pub const SILENT_SIGNAL: i32 = 2003;

    /// Filter cutoff outside (0, Nyquist)
    pub const INVALID_CUTOFF: i32 = 2004;

    /// A feature evaluated to NaN or infinity
    pub const NON_FINITE_FEATURE: i32 = 2005;

    /// Feature vector length does not match the scaler/model
    pub const FEATURE_COUNT_MISMATCH: i32 = 2006;

    /// Boosted-tree model artifact is malformed
    pub const MODEL_FORMAT: i32 = 2007;

    /// Scaler artifact is malformed
    pub const SCALER_FORMAT: i32 = 2008;

    /// Pipeline configuration is out of range
    pub const INVALID_CONFIG: i32 = 2009;
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=Analysis, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Signal-analysis errors
///
/// Raised by preprocessing, feature extraction and the classifier adapter.
/// [`AnalysisError::is_degenerate_input`] separates problems with the audio
/// itself from problems with the loaded artifacts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("sample rate must be greater than 0 (got {rate})")]
    InvalidSampleRate { rate: u32 },

    #[error("signal too short: {len} samples, need more than {required}")]
    SignalTooShort { len: usize, required: usize },

    #[error("signal is silent")]
    SilentSignal,

    #[error("invalid cutoff: normalized frequency {normalized} must lie in (0, 1)")]
    InvalidCutoff { normalized: f64 },

    #[error("feature {name} is not finite ({value})")]
    NonFiniteFeature { name: String, value: f64 },

    #[error("feature count mismatch: expected {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("invalid model: {reason}")]
    ModelFormat { reason: String },

    #[error("invalid scaler: {reason}")]
    ScalerFormat { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl AnalysisError {
    /// True when the error stems from the input audio rather than the artifacts
    pub fn is_degenerate_input(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidSampleRate { .. }
                | AnalysisError::SignalTooShort { .. }
                | AnalysisError::SilentSignal
                | AnalysisError::InvalidCutoff { .. }
                | AnalysisError::NonFiniteFeature { .. }
        )
    }
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidSampleRate { .. } => AnalysisErrorCodes::INVALID_SAMPLE_RATE,
            AnalysisError::SignalTooShort { .. } => AnalysisErrorCodes::SIGNAL_TOO_SHORT,
            AnalysisError::SilentSignal => AnalysisErrorCodes::SILENT_SIGNAL,
            AnalysisError::InvalidCutoff { .. } => AnalysisErrorCodes::INVALID_CUTOFF,
            AnalysisError::NonFiniteFeature { .. } => AnalysisErrorCodes::NON_FINITE_FEATURE,
            AnalysisError::FeatureCountMismatch { .. } => {
                AnalysisErrorCodes::FEATURE_COUNT_MISMATCH
            }
            AnalysisError::ModelFormat { .. } => AnalysisErrorCodes::MODEL_FORMAT,
            AnalysisError::ScalerFormat { .. } => AnalysisErrorCodes::SCALER_FORMAT,
            AnalysisError::InvalidConfig { .. } => AnalysisErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_input_classification() {
        assert!(AnalysisError::SilentSignal.is_degenerate_input());
        assert!(AnalysisError::SignalTooShort {
            len: 0,
            required: 15
        }
        .is_degenerate_input());
        assert!(!AnalysisError::ModelFormat {
            reason: "no trees".to_string()
        }
        .is_degenerate_input());
        assert!(!AnalysisError::FeatureCountMismatch {
            expected: 57,
            actual: 12
        }
        .is_degenerate_input());
    }

    #[test]
    fn test_analysis_error_codes() {
        assert_eq!(
            AnalysisError::SilentSignal.code(),
            AnalysisErrorCodes::SILENT_SIGNAL
        );
        assert_eq!(
            AnalysisError::ScalerFormat {
                reason: "x".to_string()
            }
            .code(),
            2008
        );
    }
}
