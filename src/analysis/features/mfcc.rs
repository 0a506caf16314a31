// MFCC module - Mel-frequency cepstral coefficients
//
// Centered STFT (zero padded by half a window on each side), power spectrum,
// Slaney-style mel filterbank with area normalization, decibel scaling with an
// 80 dB dynamic range, then an orthonormal DCT-II per frame. The per-clip
// feature is the mean and population standard deviation of each coefficient
// over frames.

use std::f64::consts::PI;

use super::fft::FftProcessor;

const N_FFT: usize = 2048;
const HOP_LENGTH: usize = 512;
/// Mel bands, also the largest number of cepstral coefficients
pub const N_MELS: usize = 128;

/// Power floor before the log
const AMIN: f64 = 1e-10;

/// Dynamic range kept below the loudest mel bin
const TOP_DB: f64 = 80.0;

// Slaney mel scale: linear below 1 kHz, logarithmic above
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1_000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular mel filters over the one-sided FFT bins, `n_mels` rows
pub fn mel_filterbank(sample_rate: f64, n_fft: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate / n_fft as f64)
        .collect();

    let mel_max = hz_to_mel(sample_rate / 2.0);
    let mel_hz: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (left, center, right) = (mel_hz[m], mel_hz[m + 1], mel_hz[m + 2]);
            let norm = 2.0 / (right - left);
            fft_freqs
                .iter()
                .map(|&f| {
                    let rising = (f - left) / (center - left);
                    let falling = (right - f) / (right - center);
                    rising.min(falling).max(0.0) * norm
                })
                .collect()
        })
        .collect()
}

/// MFCC extractor with a precomputed filterbank
pub struct Mfcc {
    processor: FftProcessor,
    filterbank: Vec<Vec<f64>>,
    n_mfcc: usize,
}

impl Mfcc {
    pub fn new(sample_rate: u32, n_mfcc: usize) -> Self {
        Self {
            processor: FftProcessor::new(N_FFT),
            filterbank: mel_filterbank(sample_rate as f64, N_FFT, N_MELS),
            n_mfcc: n_mfcc.min(N_MELS),
        }
    }

    /// Cepstral coefficients per frame (`frames x n_mfcc`)
    pub fn frames(&self, signal: &[f64]) -> Vec<Vec<f64>> {
        let pad = N_FFT / 2;
        let mut padded = vec![0.0; pad];
        padded.extend_from_slice(signal);
        padded.resize(padded.len() + pad, 0.0);

        let n_frames = 1 + (padded.len() - N_FFT) / HOP_LENGTH;
        let mel_frames: Vec<Vec<f64>> = (0..n_frames)
            .map(|i| {
                let start = i * HOP_LENGTH;
                let power = self.processor.power_spectrum(&padded[start..start + N_FFT]);
                self.filterbank
                    .iter()
                    .map(|filter| filter.iter().zip(&power).map(|(w, p)| w * p).sum())
                    .collect()
            })
            .collect();

        power_to_db(mel_frames)
            .iter()
            .map(|frame| dct_ortho(frame, self.n_mfcc))
            .collect()
    }

    /// Mean of each coefficient followed by its standard deviation
    pub fn summary(&self, signal: &[f64]) -> Vec<f64> {
        let frames = self.frames(signal);
        let n = frames.len().max(1) as f64;

        let means: Vec<f64> = (0..self.n_mfcc)
            .map(|c| frames.iter().map(|f| f[c]).sum::<f64>() / n)
            .collect();
        let stds: Vec<f64> = (0..self.n_mfcc)
            .map(|c| {
                let var = frames.iter().map(|f| (f[c] - means[c]).powi(2)).sum::<f64>() / n;
                var.sqrt()
            })
            .collect();

        means.into_iter().chain(stds).collect()
    }
}

/// 10·log10 with an amplitude floor, clipped to `TOP_DB` below the global max
fn power_to_db(mut frames: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let mut max_db = f64::NEG_INFINITY;
    for value in frames.iter_mut().flatten() {
        *value = 10.0 * value.max(AMIN).log10();
        max_db = max_db.max(*value);
    }
    let floor = max_db - TOP_DB;
    for value in frames.iter_mut().flatten() {
        *value = value.max(floor);
    }
    frames
}

/// First `n_out` coefficients of the orthonormal DCT-II
fn dct_ortho(x: &[f64], n_out: usize) -> Vec<f64> {
    let n = x.len() as f64;
    (0..n_out)
        .map(|k| {
            let sum: f64 = x
                .iter()
                .enumerate()
                .map(|(i, &v)| v * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n)).cos())
                .sum();
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            sum * scale
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [0.0, 200.0, 999.0, 1_000.0, 4_000.0, 6_000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
        assert!((hz_to_mel(1_000.0) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_filterbank_shape_and_coverage() {
        let bank = mel_filterbank(12_000.0, N_FFT, N_MELS);
        assert_eq!(bank.len(), N_MELS);
        assert_eq!(bank[0].len(), N_FFT / 2 + 1);
        assert!(bank.iter().flatten().all(|&w| w >= 0.0));
        assert!(bank.iter().all(|row| row.iter().any(|&w| w > 0.0)));
    }

    #[test]
    fn test_dct_of_constant_is_dc_only() {
        let coeffs = dct_ortho(&[2.0; 16], 4);
        assert!((coeffs[0] - 2.0 * 4.0).abs() < 1e-9);
        for c in &coeffs[1..] {
            assert!(c.abs() < 1e-9);
        }
    }

    #[test]
    fn test_power_to_db_clips_dynamic_range() {
        let db = power_to_db(vec![vec![1.0, 1e-12]]);
        assert_eq!(db[0][0], 0.0);
        assert_eq!(db[0][1], -80.0);
    }

    #[test]
    fn test_summary_layout_and_frame_count() {
        let mfcc = Mfcc::new(12_000, 13);
        let signal: Vec<f64> = (0..6_000)
            .map(|i| (2.0 * PI * 440.0 * i as f64 / 12_000.0).sin())
            .collect();
        assert_eq!(mfcc.frames(&signal).len(), 1 + 6_000 / HOP_LENGTH);

        let summary = mfcc.summary(&signal);
        assert_eq!(summary.len(), 26);
        assert!(summary.iter().all(|v| v.is_finite()));
        assert!(summary[13..].iter().all(|&s| s >= 0.0));
    }
}
