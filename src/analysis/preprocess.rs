// Preprocessor - mono mix, normalization, low-pass filter, decimation
//
// Stages run in a fixed order and are toggled by PreprocessConfig:
// 1. Mono mix (always): average interleaved channels
// 2. Normalize: x / (max|x| + 1e-17)
// 3. Filter: 4th-order Butterworth low-pass, zero-phase, Wn = 2 * cutoff / fs
// 4. Downsample: decimate by q = floor(fs / (2 * cutoff))
//
// The reported output rate is 2 * cutoff whenever downsampling is enabled,
// which is the rate the classifier was trained on.

use crate::audio::Waveform;
use crate::config::PreprocessConfig;
use crate::error::AnalysisError;

use super::filter::{butter, cheby1, FilterKind};

/// Guards the normalization against silent input
const NORMALIZE_EPSILON: f64 = 1e-17;

const LOWPASS_ORDER: usize = 4;

/// Anti-alias filter used by decimation
const DECIMATE_ORDER: usize = 8;
const DECIMATE_RIPPLE_DB: f64 = 0.05;

/// Run the preprocessing chain on a waveform
pub fn preprocess(wave: &Waveform, config: &PreprocessConfig) -> Result<Waveform, AnalysisError> {
    let fs = wave.sample_rate();
    let target_rate = config.target_rate();

    let mono = wave.to_mono();
    let mut x: Vec<f64> = mono.samples().iter().map(|&s| s as f64).collect();

    if config.normalize {
        normalize(&mut x);
    }

    if config.filter {
        x = lowpass(&x, fs, target_rate)?;
    }

    let output_rate = if config.downsample {
        let factor = decimation_factor(fs, target_rate)?;
        x = decimate(&x, factor)?;
        target_rate
    } else {
        fs
    };

    log::debug!(
        "Preprocessed {} samples at {} Hz into {} samples at {} Hz",
        mono.len(),
        fs,
        x.len(),
        output_rate
    );

    Waveform::new(x.into_iter().map(|s| s as f32).collect(), output_rate)
}

/// Scale so the peak magnitude is 1
pub fn normalize(x: &mut [f64]) {
    let peak = x.iter().fold(0.0f64, |acc, &s| acc.max(s.abs()));
    let scale = peak + NORMALIZE_EPSILON;
    for sample in x.iter_mut() {
        *sample /= scale;
    }
}

/// Zero-phase Butterworth low-pass with normalized cutoff `target_rate / fs`
pub fn lowpass(x: &[f64], fs: u32, target_rate: u32) -> Result<Vec<f64>, AnalysisError> {
    let wn = target_rate as f64 / fs as f64;
    let sos = butter(LOWPASS_ORDER, wn, FilterKind::Lowpass)?;
    sos.filtfilt(x)
}

/// Integer decimation factor `floor(fs / target_rate)`
///
/// Errors when the input rate is below the target rate.
pub fn decimation_factor(fs: u32, target_rate: u32) -> Result<usize, AnalysisError> {
    if target_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate { rate: target_rate });
    }
    let factor = (fs / target_rate) as usize;
    if factor < 1 {
        return Err(AnalysisError::InvalidCutoff {
            normalized: target_rate as f64 / fs as f64,
        });
    }
    Ok(factor)
}

/// Anti-alias filter and keep every `factor`-th sample
///
/// Output length is `ceil(len / factor)`; a factor of 1 returns the input
/// unchanged.
pub fn decimate(x: &[f64], factor: usize) -> Result<Vec<f64>, AnalysisError> {
    if factor <= 1 {
        return Ok(x.to_vec());
    }

    let sos = cheby1(DECIMATE_ORDER, DECIMATE_RIPPLE_DB, 0.8 / factor as f64)?;
    let filtered = sos.filtfilt(x)?;
    Ok(filtered.into_iter().step_by(factor).collect())
}
