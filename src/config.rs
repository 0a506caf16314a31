//! Configuration management for the cough detection pipelines
//!
//! This module provides runtime configuration loading from JSON files, so the
//! preprocessing, feature and segmentation parameters can be tuned without
//! recompiling. Every section falls back to the values the shipped classifier
//! was trained with.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::features::mfcc::N_MELS;
use crate::error::AnalysisError;

/// Frequency bands (Hz) used by the band-energy features
pub const FREQ_CUTS: [(f64, f64); 8] = [
    (0.0, 200.0),
    (300.0, 425.0),
    (500.0, 650.0),
    (950.0, 1150.0),
    (1400.0, 1800.0),
    (2300.0, 2400.0),
    (2850.0, 2950.0),
    (3800.0, 3900.0),
];

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoughConfig {
    pub preprocess: PreprocessConfig,
    pub features: FeatureConfig,
    pub segmentation: SegmentationConfig,
}

/// Preprocessor stage toggles and cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Low-pass cutoff in Hz; the downsampled rate is twice this value
    pub cutoff_hz: u32,
    /// Scale to peak amplitude 1.0
    pub normalize: bool,
    /// Apply the zero-phase Butterworth low-pass
    pub filter: bool,
    /// Decimate by floor(fs / (2 * cutoff_hz))
    pub downsample: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 6_000,
            normalize: true,
            filter: true,
            downsample: true,
        }
    }
}

impl PreprocessConfig {
    /// All stages off (mono mix only)
    pub fn passthrough() -> Self {
        Self {
            normalize: false,
            filter: false,
            downsample: false,
            ..Self::default()
        }
    }

    /// Target rate after downsampling
    pub fn target_rate(&self) -> u32 {
        self.cutoff_hz * 2
    }
}

/// Feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Band edges (Hz) for EEPD and PSD; order is part of the model contract
    pub freq_bands: Vec<(f64, f64)>,
    /// Number of cepstral coefficients
    pub n_mfcc: usize,
}

impl FeatureConfig {
    /// Reject settings the extractor cannot honor
    ///
    /// The cepstrum is taken over `N_MELS` mel bands, so at most that many
    /// coefficients exist.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.n_mfcc > N_MELS {
            return Err(AnalysisError::InvalidConfig {
                reason: format!("n_mfcc is {} but at most {} are available", self.n_mfcc, N_MELS),
            });
        }
        Ok(())
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            freq_bands: FREQ_CUTS.to_vec(),
            n_mfcc: 13,
        }
    }
}

/// Hysteresis segmentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Symmetric padding added to each segment, seconds
    pub cough_padding: f32,
    /// Shortest accepted cough, seconds
    pub min_cough_len: f32,
    /// Longest accepted cough, seconds (unbounded when absent)
    pub max_cough_len: Option<f32>,
    /// Offset threshold as a multiple of the signal RMS
    pub th_l_multiplier: f32,
    /// Onset threshold as a multiple of the signal RMS
    pub th_h_multiplier: f32,
    /// Time the envelope must stay below the offset threshold, seconds
    pub tolerance: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            cough_padding: 0.0,
            min_cough_len: 0.2,
            max_cough_len: None,
            th_l_multiplier: 0.1,
            th_h_multiplier: 2.0,
            tolerance: 0.01,
        }
    }
}

impl CoughConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration; if the file doesn't exist or the JSON is
    /// invalid, a warning is logged and the defaults are returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => match config.features.validate() {
                    Ok(()) => {
                        log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                        config
                    }
                    Err(err) => {
                        log::warn!(
                            "[Config] Rejected {:?}: {}. Using defaults.",
                            path.as_ref(),
                            err
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from an optional path, defaults when none is given
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::default(),
        }
    }
}
