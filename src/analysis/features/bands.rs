// Bands module - per-frequency-band features
//
// EEPD (energy envelope peak detection): isolate each band with a zero-phase
// Butterworth filter, square it, smooth the result into an energy envelope
// and count prominent envelope peaks. Coughs show several short energy bursts
// across low and mid bands; steady noise shows few.
//
// PSD: Welch power spectral density integrated over each band.

use crate::analysis::filter::{band, butter, FilterKind};
use crate::error::AnalysisError;

use super::fft::FftProcessor;

/// Order of the band-isolation filters
const BAND_FILTER_ORDER: usize = 4;

/// Cutoff (Hz) of the envelope smoothing low-pass
const ENVELOPE_CUTOFF_HZ: f64 = 10.0;

/// Minimum spacing between counted peaks, seconds
const MIN_PEAK_DISTANCE_S: f64 = 0.05;

/// Welch segment length (samples)
const WELCH_SEGMENT: usize = 256;

/// Count energy-envelope peaks in each band
pub fn energy_envelope_peaks(
    signal: &[f64],
    sample_rate: u32,
    freq_bands: &[(f64, f64)],
) -> Result<Vec<f64>, AnalysisError> {
    let fs = sample_rate as f64;
    let smoother = butter(
        BAND_FILTER_ORDER,
        ENVELOPE_CUTOFF_HZ / (fs / 2.0),
        FilterKind::Lowpass,
    )?;
    let min_distance = ((MIN_PEAK_DISTANCE_S * fs) as usize).max(1);

    freq_bands
        .iter()
        .map(|&(low, high)| {
            let sos = band(BAND_FILTER_ORDER, low, high, fs)?;
            let filtered = sos.filtfilt(signal)?;
            let energy: Vec<f64> = filtered.iter().map(|x| x * x).collect();
            let envelope = smoother.filtfilt(&energy)?;
            Ok(count_peaks(&envelope, min_distance) as f64)
        })
        .collect()
}

/// Local maxima above mean + one standard deviation, at least
/// `min_distance` samples apart
pub fn count_peaks(envelope: &[f64], min_distance: usize) -> usize {
    if envelope.len() < 3 {
        return 0;
    }

    let n = envelope.len() as f64;
    let mean = envelope.iter().sum::<f64>() / n;
    let std = (envelope.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n).sqrt();
    let threshold = mean + std;

    let mut count = 0;
    let mut next_allowed = 0;
    for i in 1..envelope.len() - 1 {
        if i < next_allowed {
            continue;
        }
        let curr = envelope[i];
        if curr > threshold && curr > envelope[i - 1] && curr >= envelope[i + 1] {
            count += 1;
            next_allowed = i + min_distance;
        }
    }
    count
}

/// Welch PSD estimate (Hann window, 50% overlap, constant detrend,
/// one-sided density scaling)
///
/// Returns (frequencies, power density).
pub fn welch(signal: &[f64], sample_rate: u32) -> (Vec<f64>, Vec<f64>) {
    let fs = sample_rate as f64;
    let segment = WELCH_SEGMENT.min(signal.len()).max(1);
    let step = (segment - segment / 2).max(1);
    let processor = FftProcessor::new(segment);
    let window_energy: f64 = processor.window().iter().map(|w| w * w).sum();
    let scale = if window_energy > 0.0 {
        1.0 / (fs * window_energy)
    } else {
        0.0
    };

    let mut psd = vec![0.0; processor.bins()];
    let mut segments = 0usize;
    let mut start = 0usize;
    while start + segment <= signal.len() {
        let frame = &signal[start..start + segment];
        let mean = frame.iter().sum::<f64>() / segment as f64;
        let detrended: Vec<f64> = frame.iter().map(|x| x - mean).collect();
        for (acc, p) in psd.iter_mut().zip(processor.power_spectrum(&detrended)) {
            *acc += p;
        }
        segments += 1;
        start += step;
    }

    let last = psd.len() - 1;
    for (k, value) in psd.iter_mut().enumerate() {
        *value *= scale / segments.max(1) as f64;
        // One-sided: double everything but DC and (for even lengths) Nyquist
        let is_nyquist = k == last && segment % 2 == 0;
        if k != 0 && !is_nyquist {
            *value *= 2.0;
        }
    }

    (processor.bin_frequencies(fs), psd)
}

/// Integrate the Welch PSD over each band (inclusive edges)
pub fn band_power(
    signal: &[f64],
    sample_rate: u32,
    freq_bands: &[(f64, f64)],
) -> Vec<f64> {
    let (freqs, psd) = welch(signal, sample_rate);
    let df = if freqs.len() > 1 { freqs[1] - freqs[0] } else { 0.0 };

    freq_bands
        .iter()
        .map(|&(low, high)| {
            freqs
                .iter()
                .zip(&psd)
                .filter(|(&f, _)| f >= low && f <= high)
                .map(|(_, &p)| p * df)
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FREQ_CUTS;
    use std::f64::consts::PI;

    const RATE: u32 = 12_000;

    fn tone(freq: f64, amplitude: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / RATE as f64).sin())
            .collect()
    }

    #[test]
    fn test_count_peaks_respects_threshold_and_distance() {
        let mut envelope = vec![0.0; 100];
        envelope[20] = 5.0;
        envelope[22] = 4.0;
        envelope[60] = 5.0;
        assert_eq!(count_peaks(&envelope, 10), 2);
        assert_eq!(count_peaks(&envelope, 1), 3);
        assert_eq!(count_peaks(&[1.0, 2.0], 1), 0);
    }

    #[test]
    fn test_eepd_counts_bursts_in_band() {
        // Three 1 kHz bursts, 0.3 s apart
        let mut signal = vec![0.0; RATE as usize];
        for burst in 0..3 {
            let start = 1_200 + burst * 3_600;
            for (i, s) in tone(1_050.0, 1.0, 1_200).into_iter().enumerate() {
                signal[start + i] = s;
            }
        }

        let peaks = energy_envelope_peaks(&signal, RATE, &FREQ_CUTS).unwrap();
        assert_eq!(peaks.len(), 8);
        // The 950-1150 Hz band sees each burst
        assert_eq!(peaks[3], 3.0);
    }

    #[test]
    fn test_eepd_rejects_band_above_nyquist() {
        let signal = tone(100.0, 1.0, 4_000);
        let result = energy_envelope_peaks(&signal, 4_000, &[(3_000.0, 3_500.0)]);
        assert!(matches!(result, Err(AnalysisError::InvalidCutoff { .. })));
    }

    #[test]
    fn test_welch_parseval() {
        // Density integrates to the signal variance
        let signal = tone(1_000.0, 1.0, RATE as usize);
        let (freqs, psd) = welch(&signal, RATE);
        let df = freqs[1] - freqs[0];
        let total: f64 = psd.iter().map(|p| p * df).sum();
        assert!((total - 0.5).abs() < 0.02, "integrated power {}", total);
    }

    #[test]
    fn test_band_power_localizes_tone() {
        let signal = tone(1_050.0, 1.0, RATE as usize);
        let powers = band_power(&signal, RATE, &FREQ_CUTS);
        let strongest = powers
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0;
        assert_eq!(strongest, 3);
        assert!(powers[3] > 0.3);
    }
}
