// FeatureExtractor - DSP feature extraction for cough classification
//
// This module turns a preprocessed waveform into the fixed-order vector of
// acoustic descriptors consumed by the scaler and the boosted-tree model.
//
// Module organization:
// - types: FeatureGroup (model order) and FeatureVector
// - fft: FFT computation with Hann windowing
// - spectral: Whole-signal spectral descriptors
// - temporal: Time-domain features (ZCR, RMS, crest factor, length)
// - bands: Per-band features (EEPD peak counts, Welch PSD)
// - mfcc: Mel-frequency cepstral coefficients
// - mod.rs: Coordinator (FeatureExtractor)

pub mod bands;
pub mod fft;
pub mod mfcc;
pub mod spectral;
pub mod temporal;
mod types;

pub use types::{FeatureGroup, FeatureVector};

use crate::audio::Waveform;
use crate::config::FeatureConfig;
use crate::error::AnalysisError;

use fft::{next_pow2, FftProcessor};
use mfcc::Mfcc;
use spectral::Spectrum;
use temporal::TemporalFeatures;

/// Whole-signal analysis shared by the spectral groups
struct SignalView<'a> {
    samples: &'a [f64],
    sample_rate: u32,
    magnitudes: Vec<f64>,
    frequencies: Vec<f64>,
}

impl<'a> SignalView<'a> {
    fn new(samples: &'a [f64], sample_rate: u32) -> Self {
        let processor = FftProcessor::with_window_len(next_pow2(samples.len()), samples.len());
        Self {
            samples,
            sample_rate,
            magnitudes: processor.magnitude_spectrum(samples),
            frequencies: processor.bin_frequencies(sample_rate as f64),
        }
    }

    fn spectrum(&self) -> Spectrum<'_> {
        Spectrum::new(&self.magnitudes, &self.frequencies)
    }
}

/// FeatureExtractor coordinates the feature groups in model order
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Names of every extracted value, in order
    pub fn feature_names(&self) -> Vec<String> {
        FeatureGroup::ALL
            .iter()
            .flat_map(|group| group.names(&self.config.freq_bands, self.config.n_mfcc))
            .collect()
    }

    /// Number of extracted values
    pub fn feature_count(&self) -> usize {
        FeatureGroup::ALL
            .iter()
            .map(|group| group.names(&self.config.freq_bands, self.config.n_mfcc).len())
            .sum()
    }

    /// Extract all feature groups from a (preprocessed) waveform
    ///
    /// # Errors
    /// * `SignalTooShort` for empty input or input shorter than the band
    ///   filters need
    /// * `SilentSignal` when the RMS is zero
    /// * `NonFiniteFeature` when any value is NaN or infinite
    /// * `InvalidCutoff` when a frequency band lies above the Nyquist rate
    /// * `InvalidConfig` when more MFCCs are requested than mel bands exist
    pub fn extract(&self, wave: &Waveform) -> Result<FeatureVector, AnalysisError> {
        self.config.validate()?;
        let mono = wave.to_mono();
        let samples: Vec<f64> = mono.samples().iter().map(|&s| s as f64).collect();
        if samples.is_empty() {
            return Err(AnalysisError::SignalTooShort {
                len: 0,
                required: 1,
            });
        }

        let temporal = TemporalFeatures::new(mono.sample_rate());
        if temporal.compute_rms(&samples) == 0.0 {
            return Err(AnalysisError::SilentSignal);
        }

        let view = SignalView::new(&samples, mono.sample_rate());
        let mut vector = FeatureVector::with_capacity(self.feature_count());

        for group in FeatureGroup::ALL {
            let values = self.compute_group(group, &view, &temporal)?;
            let names = group.names(&self.config.freq_bands, self.config.n_mfcc);
            if let Some((name, &value)) = names.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
                return Err(AnalysisError::NonFiniteFeature {
                    name: name.clone(),
                    value,
                });
            }
            vector.extend(names, values);
        }

        log::debug!(
            "Extracted {} features from {} samples at {} Hz",
            vector.len(),
            samples.len(),
            mono.sample_rate()
        );
        Ok(vector)
    }

    fn compute_group(
        &self,
        group: FeatureGroup,
        view: &SignalView<'_>,
        temporal: &TemporalFeatures,
    ) -> Result<Vec<f64>, AnalysisError> {
        let bands = &self.config.freq_bands;
        let values = match group {
            FeatureGroup::Eepd => {
                bands::energy_envelope_peaks(view.samples, view.sample_rate, bands)?
            }
            FeatureGroup::Zcr => vec![temporal.compute_zcr(view.samples)],
            FeatureGroup::Rmsp => vec![temporal.compute_rms(view.samples)],
            FeatureGroup::Df => vec![view.spectrum().dominant_frequency()],
            FeatureGroup::SpectralFeatures => {
                let spectrum = view.spectrum();
                let moments = spectrum.moments();
                vec![
                    moments.centroid,
                    spectrum.rolloff(),
                    moments.spread,
                    moments.skewness,
                    moments.kurtosis,
                    spectrum.bandwidth(moments.centroid),
                ]
            }
            FeatureGroup::SfSstd => {
                let spectrum = view.spectrum();
                vec![spectrum.flatness(), spectrum.std_dev()]
            }
            FeatureGroup::SslSd => {
                let spectrum = view.spectrum();
                vec![spectrum.slope(), spectrum.decrease()]
            }
            FeatureGroup::Mfcc => {
                Mfcc::new(view.sample_rate, self.config.n_mfcc).summary(view.samples)
            }
            FeatureGroup::Cf => vec![temporal.compute_crest_factor(view.samples)],
            FeatureGroup::Lgth => vec![temporal.compute_length(view.samples)],
            FeatureGroup::Psd => bands::band_power(view.samples, view.sample_rate, bands),
        };
        Ok(values)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const RATE: u32 = 12_000;

    /// Noise bursts over a low hum, roughly cough-shaped
    fn generate_cough_like(seed: u64) -> Waveform {
        let mut rng = StdRng::seed_from_u64(seed);
        let samples = (0..RATE as usize)
            .map(|i| {
                let t = i as f32 / RATE as f32;
                let hum = 0.05 * (2.0 * std::f32::consts::PI * 150.0 * t).sin();
                let burst = if (2_000..4_000).contains(&i) || (7_000..8_500).contains(&i) {
                    rng.gen_range(-0.8f32..0.8)
                } else {
                    0.0
                };
                hum + burst
            })
            .collect();
        Waveform::new(samples, RATE).unwrap()
    }

    #[test]
    fn test_extracts_57_named_values() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract(&generate_cough_like(7)).unwrap();
        assert_eq!(features.len(), 57);
        assert_eq!(features.names(), extractor.feature_names().as_slice());
        assert_eq!(extractor.feature_count(), 57);
        assert!(features.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = FeatureExtractor::default();
        let wave = generate_cough_like(11);
        let first = extractor.extract(&wave).unwrap();
        let second = extractor.extract(&wave).unwrap();
        let first_bits: Vec<u64> = first.values().iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u64> = second.values().iter().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn test_length_and_rms_features() {
        let extractor = FeatureExtractor::default();
        let samples: Vec<f32> = (0..6_000)
            .map(|i| (2.0 * std::f32::consts::PI * 1_000.0 * i as f32 / RATE as f32).sin())
            .collect();
        let features = extractor.extract(&Waveform::new(samples, RATE).unwrap()).unwrap();
        assert_eq!(features.get("LGTH"), Some(0.5));
        let rms = features.get("RMSP").unwrap();
        assert!((rms - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        let df = features.get("DF").unwrap();
        assert!((df - 1_000.0).abs() < 2.0, "dominant frequency {}", df);
    }

    #[test]
    fn test_silent_input_rejected() {
        let extractor = FeatureExtractor::default();
        let silence = Waveform::new(vec![0.0; 6_000], RATE).unwrap();
        assert_eq!(extractor.extract(&silence), Err(AnalysisError::SilentSignal));
    }

    #[test]
    fn test_empty_and_short_input_rejected() {
        let extractor = FeatureExtractor::default();
        let empty = Waveform::new(Vec::new(), RATE).unwrap();
        assert!(matches!(
            extractor.extract(&empty),
            Err(AnalysisError::SignalTooShort { .. })
        ));
        let short = Waveform::new(vec![0.5, -0.5, 0.25], RATE).unwrap();
        assert!(matches!(
            extractor.extract(&short),
            Err(AnalysisError::SignalTooShort { .. })
        ));
    }

    #[test]
    fn test_low_sample_rate_rejected() {
        // 3800-3900 Hz band is above Nyquist at 6 kHz
        let extractor = FeatureExtractor::default();
        let samples: Vec<f32> = (0..6_000).map(|i| ((i % 7) as f32 - 3.0) / 3.0).collect();
        let wave = Waveform::new(samples, 6_000).unwrap();
        assert!(matches!(
            extractor.extract(&wave),
            Err(AnalysisError::InvalidCutoff { .. })
        ));
    }

    #[test]
    fn test_more_mfcc_than_mel_bands_rejected() {
        let extractor = FeatureExtractor::new(FeatureConfig {
            n_mfcc: 129,
            ..FeatureConfig::default()
        });
        assert!(matches!(
            extractor.extract(&generate_cough_like(3)),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }
}
