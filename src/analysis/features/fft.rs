// FFT module - Fast Fourier Transform computation
//
// This module handles FFT computation with Hann windowing to reduce spectral
// leakage. Spectra are one-sided (fft_size / 2 + 1 bins) because every input
// is real-valued.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Periodic Hann window (the DFT-even variant used for spectral analysis)
pub fn hann(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / len as f64).cos())
        .collect()
}

/// FFT processor that computes one-sided spectra from audio frames
pub struct FftProcessor {
    fft: Arc<dyn Fft<f64>>,
    fft_size: usize,
    /// Hann window (pre-computed); frames longer than this are truncated
    window: Vec<f64>,
}

impl FftProcessor {
    /// Create a processor whose window spans the whole FFT
    pub fn new(fft_size: usize) -> Self {
        Self::with_window_len(fft_size, fft_size)
    }

    /// Create a processor whose window covers only the first `window_len`
    /// samples; the rest of each frame is zero padding
    pub fn with_window_len(fft_size: usize, window_len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            fft_size,
            window: hann(window_len.min(fft_size)),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn window(&self) -> &[f64] {
        &self.window
    }

    /// Number of one-sided bins
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frequency (Hz) of each one-sided bin
    pub fn bin_frequencies(&self, sample_rate: f64) -> Vec<f64> {
        let width = sample_rate / self.fft_size as f64;
        (0..self.bins()).map(|k| k as f64 * width).collect()
    }

    /// Magnitude spectrum |X[k]| of a windowed, zero-padded frame
    pub fn magnitude_spectrum(&self, frame: &[f64]) -> Vec<f64> {
        self.transform(frame).iter().map(|c| c.norm()).collect()
    }

    /// Power spectrum |X[k]|^2 of a windowed, zero-padded frame
    pub fn power_spectrum(&self, frame: &[f64]) -> Vec<f64> {
        self.transform(frame).iter().map(|c| c.norm_sqr()).collect()
    }

    fn transform(&self, frame: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);
        buffer.truncate(self.bins());
        buffer
    }
}

/// Smallest power of two >= n (at least 2)
pub fn next_pow2(n: usize) -> usize {
    n.max(2).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_bin_matches_tone() {
        let rate = 8_000.0;
        let processor = FftProcessor::new(1024);
        let tone: Vec<f64> = (0..1024)
            .map(|i| (2.0 * PI * 1_000.0 * i as f64 / rate).sin())
            .collect();
        let spectrum = processor.magnitude_spectrum(&tone);
        let (peak, _) = spectrum
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
        let freqs = processor.bin_frequencies(rate);
        assert!((freqs[peak] - 1_000.0).abs() <= rate / 1024.0);
    }

    #[test]
    fn test_short_window_zero_pads() {
        let processor = FftProcessor::with_window_len(16, 4);
        assert_eq!(processor.window().len(), 4);
        assert_eq!(processor.bins(), 9);
        let spectrum = processor.power_spectrum(&[1.0; 8]);
        assert_eq!(spectrum.len(), 9);
    }

    #[test]
    fn test_next_pow2() {
        assert_eq!(next_pow2(0), 2);
        assert_eq!(next_pow2(1000), 1024);
        assert_eq!(next_pow2(1024), 1024);
    }

    #[test]
    fn test_hann_is_periodic() {
        let w = hann(4);
        assert_eq!(w[0], 0.0);
        assert!((w[2] - 1.0).abs() < 1e-12);
    }
}
