// Classifier - cough probability from a pretrained boosted-tree model
//
// Pipeline: preprocess -> extract features -> standardize -> boosted trees.
//
// `classify` fails closed: any error along the chain yields probability 0.0.
// Degenerate audio is logged at warn, artifact mismatches at error.
// `try_classify` surfaces the error so callers can tell
// degenerate audio apart from broken artifacts.

use std::path::Path;

use crate::analysis::features::FeatureExtractor;
use crate::analysis::model::BoostedTrees;
use crate::analysis::preprocess::preprocess;
use crate::analysis::scaler::StandardScaler;
use crate::audio::Waveform;
use crate::config::{CoughConfig, PreprocessConfig};
use crate::error::{log_analysis_error, AnalysisError, ErrorCode};

/// Classifier adapter bundling the loaded artifacts with the pipeline
/// configuration they were trained with
pub struct CoughClassifier {
    model: BoostedTrees,
    scaler: StandardScaler,
    preprocess: PreprocessConfig,
    extractor: FeatureExtractor,
}

impl CoughClassifier {
    /// Build a classifier from loaded artifacts
    ///
    /// Fails when the feature settings are out of range, or when the scaler,
    /// model and extractor disagree on the number (or, when the scaler records
    /// them, the names) of features.
    pub fn new(
        model: BoostedTrees,
        scaler: StandardScaler,
        config: &CoughConfig,
    ) -> Result<Self, AnalysisError> {
        config.features.validate()?;
        let extractor = FeatureExtractor::new(config.features.clone());
        scaler.check_names(&extractor.feature_names())?;
        if let Some(expected) = model.num_features() {
            if expected != scaler.len() {
                return Err(AnalysisError::FeatureCountMismatch {
                    expected,
                    actual: scaler.len(),
                });
            }
        }

        Ok(Self {
            model,
            scaler,
            preprocess: config.preprocess.clone(),
            extractor,
        })
    }

    /// Load both artifacts from disk
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        scaler_path: Q,
        config: &CoughConfig,
    ) -> Result<Self, AnalysisError> {
        let model = BoostedTrees::load(model_path)?;
        let scaler = StandardScaler::load(scaler_path)?;
        Self::new(model, scaler, config)
    }

    pub fn model(&self) -> &BoostedTrees {
        &self.model
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Probability that the clip contains a cough
    pub fn try_classify(&self, wave: &Waveform) -> Result<f32, AnalysisError> {
        predict(
            wave,
            &self.model,
            &self.scaler,
            &self.preprocess,
            &self.extractor,
        )
    }

    /// Probability that the clip contains a cough, 0.0 on any failure
    pub fn classify(&self, wave: &Waveform) -> f32 {
        fail_closed(self.try_classify(wave))
    }
}

/// One-shot classification with the default pipeline configuration
///
/// Returns 0.0 on any failure, including artifacts that do not match the
/// extractor's feature layout.
pub fn classify_cough(wave: &Waveform, model: &BoostedTrees, scaler: &StandardScaler) -> f32 {
    let config = CoughConfig::default();
    let extractor = FeatureExtractor::new(config.features);
    fail_closed(predict(wave, model, scaler, &config.preprocess, &extractor))
}

fn predict(
    wave: &Waveform,
    model: &BoostedTrees,
    scaler: &StandardScaler,
    preprocess_config: &PreprocessConfig,
    extractor: &FeatureExtractor,
) -> Result<f32, AnalysisError> {
    let processed = preprocess(wave, preprocess_config)?;
    let features = extractor.extract(&processed)?;
    let scaled = scaler.transform(features.values())?;
    let probability = model.predict_proba(&scaled)?;

    log::debug!(
        "[Classifier] {} features, margin {:.4}, probability {:.4}",
        features.len(),
        model.margin(&scaled),
        probability
    );
    Ok(probability.clamp(0.0, 1.0) as f32)
}

fn fail_closed(result: Result<f32, AnalysisError>) -> f32 {
    match result {
        Ok(probability) => probability,
        Err(err) if err.is_degenerate_input() => {
            log::warn!(
                "[Classifier] Degenerate input (code={}): {}. Reporting 0.0",
                err.code(),
                err.message()
            );
            0.0
        }
        Err(err) => {
            log_analysis_error(&err, "classify");
            0.0
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
