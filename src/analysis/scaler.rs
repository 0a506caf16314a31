// Scaler - standardization fitted at training time
//
// Stored as JSON: {"mean": [...], "scale": [...], "feature_names": [...]}.
// `feature_names` is optional; when present it is checked against the
// extractor's names so a reordered feature list fails loudly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, AnalysisError> {
        Self {
            mean,
            scale,
            feature_names: None,
        }
        .validated()
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, AnalysisError> {
        self.feature_names = Some(names);
        self.validated()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| scaler_error(format!("failed to read {}: {}", path.display(), e)))?;
        let scaler = Self::from_json(&contents)?;
        log::info!(
            "[Scaler] Loaded {} feature statistics from {:?}",
            scaler.len(),
            path
        );
        Ok(scaler)
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let scaler: Self = serde_json::from_str(json).map_err(|e| scaler_error(e.to_string()))?;
        scaler.validated()
    }

    fn validated(self) -> Result<Self, AnalysisError> {
        if self.mean.len() != self.scale.len() {
            return Err(scaler_error(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                return Err(scaler_error(format!(
                    "{} feature names for {} statistics",
                    names.len(),
                    self.mean.len()
                )));
            }
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(scaler_error("statistics must be finite".to_string()));
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Verify the extractor produces the features this scaler was fitted on
    pub fn check_names(&self, names: &[String]) -> Result<(), AnalysisError> {
        if names.len() != self.len() {
            return Err(AnalysisError::FeatureCountMismatch {
                expected: self.len(),
                actual: names.len(),
            });
        }
        if let Some(expected) = &self.feature_names {
            if let Some((want, got)) = expected.iter().zip(names).find(|(want, got)| want != got) {
                return Err(scaler_error(format!(
                    "expected feature '{}' but extractor yields '{}'",
                    want, got
                )));
            }
        }
        Ok(())
    }

    /// (x - mean) / scale, with a zero scale treated as 1
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        if values.len() != self.len() {
            return Err(AnalysisError::FeatureCountMismatch {
                expected: self.len(),
                actual: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&mean, &scale))| {
                let scale = if scale == 0.0 { 1.0 } else { scale };
                (x - mean) / scale
            })
            .collect())
    }
}

fn scaler_error(reason: String) -> AnalysisError {
    AnalysisError::ScalerFormat { reason }
}
