// Temporal module - Time-domain feature extraction
//
// This module computes features directly from time-domain audio signals:
// zero-crossing rate, RMS power, crest factor and duration.

/// Temporal feature computation functions
pub struct TemporalFeatures {
    sample_rate: u32,
}

impl TemporalFeatures {
    /// Create a new temporal features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Compute zero-crossing rate (ZCR)
    ///
    /// Number of sign changes divided by the number of sample pairs.
    /// High ZCR indicates high-frequency or noise-like content.
    ///
    /// # Returns
    /// Zero-crossing rate (0.0 to 1.0)
    pub fn compute_zcr(&self, audio: &[f64]) -> f64 {
        if audio.len() < 2 {
            return 0.0;
        }

        let crossings = audio
            .windows(2)
            .filter(|pair| (pair[1] >= 0.0) != (pair[0] >= 0.0))
            .count();

        crossings as f64 / (audio.len() - 1) as f64
    }

    /// Root-mean-square amplitude
    pub fn compute_rms(&self, audio: &[f64]) -> f64 {
        if audio.is_empty() {
            return 0.0;
        }
        (audio.iter().map(|x| x * x).sum::<f64>() / audio.len() as f64).sqrt()
    }

    /// Peak amplitude over RMS amplitude
    ///
    /// Returns 0.0 for silent input.
    pub fn compute_crest_factor(&self, audio: &[f64]) -> f64 {
        let rms = self.compute_rms(audio);
        if rms <= 0.0 {
            return 0.0;
        }
        let peak = audio.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()));
        peak / rms
    }

    /// Signal duration in seconds
    pub fn compute_length(&self, audio: &[f64]) -> f64 {
        audio.len() as f64 / self.sample_rate as f64
    }
}
