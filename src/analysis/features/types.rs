// Types module - feature groups and the ordered feature vector
//
// The trained scaler and classifier consume features positionally, so the
// group order below is part of the model contract. Adding, removing or
// reordering a group requires retraining both artifacts.

use std::fmt;

/// Named feature groups in model order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    /// Energy-envelope peak count per frequency band
    Eepd,
    /// Zero-crossing rate
    Zcr,
    /// Root-mean-square power
    Rmsp,
    /// Dominant frequency
    Df,
    /// Centroid, rolloff, spread, skewness, kurtosis, bandwidth
    SpectralFeatures,
    /// Spectral flatness and spectral standard deviation
    SfSstd,
    /// Spectral slope and spectral decrease
    SslSd,
    /// MFCC means then MFCC standard deviations
    Mfcc,
    /// Crest factor
    Cf,
    /// Duration in seconds
    Lgth,
    /// Welch PSD integrated per frequency band
    Psd,
}

impl FeatureGroup {
    /// Every group, in the order the model expects
    pub const ALL: [FeatureGroup; 11] = [
        FeatureGroup::Eepd,
        FeatureGroup::Zcr,
        FeatureGroup::Rmsp,
        FeatureGroup::Df,
        FeatureGroup::SpectralFeatures,
        FeatureGroup::SfSstd,
        FeatureGroup::SslSd,
        FeatureGroup::Mfcc,
        FeatureGroup::Cf,
        FeatureGroup::Lgth,
        FeatureGroup::Psd,
    ];

    /// Short tag used in feature names and logs
    pub fn tag(&self) -> &'static str {
        match self {
            FeatureGroup::Eepd => "EEPD",
            FeatureGroup::Zcr => "ZCR",
            FeatureGroup::Rmsp => "RMSP",
            FeatureGroup::Df => "DF",
            FeatureGroup::SpectralFeatures => "spectral_features",
            FeatureGroup::SfSstd => "SF_SSTD",
            FeatureGroup::SslSd => "SSL_SD",
            FeatureGroup::Mfcc => "MFCC",
            FeatureGroup::Cf => "CF",
            FeatureGroup::Lgth => "LGTH",
            FeatureGroup::Psd => "PSD",
        }
    }

    /// Names of the scalars this group yields
    pub fn names(&self, freq_bands: &[(f64, f64)], n_mfcc: usize) -> Vec<String> {
        let band_names = |prefix: &str| -> Vec<String> {
            freq_bands
                .iter()
                .map(|(lo, hi)| format!("{}{}_{}", prefix, *lo as u32, *hi as u32))
                .collect()
        };

        match self {
            FeatureGroup::Eepd => band_names("EEPD"),
            FeatureGroup::Zcr => vec!["ZCR".to_string()],
            FeatureGroup::Rmsp => vec!["RMSP".to_string()],
            FeatureGroup::Df => vec!["DF".to_string()],
            FeatureGroup::SpectralFeatures => [
                "Spectral Centroid",
                "Spectral Rolloff",
                "Spectral Spread",
                "Spectral Skewness",
                "Spectral Kurtosis",
                "Spectral Bandwidth",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            FeatureGroup::SfSstd => vec!["Spectral Flatness".to_string(), "Spectral StDev".to_string()],
            FeatureGroup::SslSd => vec!["Spectral Slope".to_string(), "Spectral Decrease".to_string()],
            FeatureGroup::Mfcc => (0..n_mfcc)
                .map(|i| format!("MFCC_mean{}", i))
                .chain((0..n_mfcc).map(|i| format!("MFCC_std{}", i)))
                .collect(),
            FeatureGroup::Cf => vec!["CF".to_string()],
            FeatureGroup::Lgth => vec!["LGTH".to_string()],
            FeatureGroup::Psd => band_names("PSD"),
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Ordered feature values with their names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
    names: Vec<String>,
}

impl FeatureVector {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
        }
    }

    /// Append one group's scalars
    pub(crate) fn extend(&mut self, names: Vec<String>, values: Vec<f64>) {
        debug_assert_eq!(names.len(), values.len());
        self.names.extend(names);
        self.values.extend(values);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<String>) {
        (self.values, self.names)
    }
}
