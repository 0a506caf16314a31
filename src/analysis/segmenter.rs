// Segmenter - hysteresis cough segmentation on the instantaneous power
//
// Algorithm:
// 1. Envelope e[n] = x[n]^2 of the raw (mono) signal
// 2. Thresholds from the global RMS: high = th_h * rms, low = th_l * rms
// 3. Onset: first sample with e[n] > high while idle
//    Offset: the sample at which e has stayed below low for more than
//    `tolerance` samples; a cough still open at the end closes on the last
//    sample
// 4. Keep candidates longer than min_cough_len (and not longer than
//    max_cough_len); lengths are measured before padding
// 5. Pad both sides, clamp to the signal, merge overlapping or touching
//    segments
//
// Segmentation never fails: empty, silent or quiet input simply yields no
// segments.

use std::ops::Range;

use crate::audio::Waveform;
use crate::config::SegmentationConfig;

/// Sample range of one detected cough, `start` inclusive, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoughSegment {
    pub start: usize,
    pub end: usize,
}

impl CoughSegment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.len() as f64 / sample_rate as f64
    }
}

/// Segments in temporal order plus the per-sample cough mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub segments: Vec<CoughSegment>,
    pub mask: Vec<bool>,
}

impl Segmentation {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Cut each segment out of the (mono) waveform it was computed on
    pub fn extract(&self, wave: &Waveform) -> Vec<Waveform> {
        let mono = wave.to_mono();
        self.segments
            .iter()
            .map(|segment| mono.slice(segment.range()))
            .collect()
    }
}

fn seconds_to_samples(seconds: f32, sample_rate: u32) -> usize {
    (seconds.max(0.0) as f64 * sample_rate as f64).round() as usize
}

/// Detect cough segments in a waveform
pub fn segment_cough(wave: &Waveform, config: &SegmentationConfig) -> Segmentation {
    let mono = wave.to_mono();
    let x = mono.samples();
    let fs = mono.sample_rate();
    let n = x.len();

    let mut mask = vec![false; n];
    if n == 0 {
        return Segmentation {
            segments: Vec::new(),
            mask,
        };
    }

    let rms = (x.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / n as f64).sqrt();
    let th_low = config.th_l_multiplier as f64 * rms;
    let th_high = config.th_h_multiplier as f64 * rms;

    let padding = seconds_to_samples(config.cough_padding, fs);
    let min_samples = seconds_to_samples(config.min_cough_len, fs);
    let max_samples = config.max_cough_len.map(|len| seconds_to_samples(len, fs));
    let tolerance = seconds_to_samples(config.tolerance, fs);

    let accept = |onset: usize, offset: usize| {
        let len = offset + 1 - onset;
        len > min_samples && max_samples.map_or(true, |max| len <= max)
    };

    let mut candidates: Vec<(usize, usize)> = Vec::new();
    let mut onset: Option<usize> = None;
    let mut below_count = 0usize;

    for (i, &sample) in x.iter().enumerate() {
        let power = (sample as f64).powi(2);
        match onset {
            Some(start) => {
                if power < th_low {
                    below_count += 1;
                    if below_count > tolerance {
                        if accept(start, i) {
                            candidates.push((start, i));
                        }
                        onset = None;
                    }
                } else {
                    below_count = 0;
                }
            }
            None => {
                if power > th_high {
                    onset = Some(i);
                    below_count = 0;
                }
            }
        }
    }
    if let Some(start) = onset {
        if accept(start, n - 1) {
            candidates.push((start, n - 1));
        }
    }

    let mut segments: Vec<CoughSegment> = Vec::with_capacity(candidates.len());
    for (start, offset) in candidates {
        let padded = CoughSegment {
            start: start.saturating_sub(padding),
            end: offset.saturating_add(padding).saturating_add(1).min(n),
        };
        match segments.last_mut() {
            Some(last) if last.end >= padded.start => last.end = last.end.max(padded.end),
            _ => segments.push(padded),
        }
    }

    for segment in &segments {
        mask[segment.range()].fill(true);
    }

    log::debug!(
        "[Segmenter] {} segments in {} samples at {} Hz (rms {:.5})",
        segments.len(),
        n,
        fs,
        rms
    );

    Segmentation { segments, mask }
}
