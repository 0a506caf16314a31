// Waveform - interleaved samples plus sample rate
//
// Every pipeline stage takes and returns a Waveform. Input files may be
// multichannel; `to_mono` reduces them before any analysis runs.

use std::ops::Range;

use crate::error::AnalysisError;

/// Audio samples with their sample rate and channel count
///
/// Samples are stored interleaved (`[l0, r0, l1, r1, ...]`) when there is
/// more than one channel. The sample rate is always greater than zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl Waveform {
    /// Create a single-channel waveform
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::interleaved(samples, sample_rate, 1)
    }

    /// Create a waveform from interleaved samples
    ///
    /// A trailing partial frame is dropped so that `samples.len()` is always a
    /// multiple of the channel count. A channel count of 0 is treated as mono.
    pub fn interleaved(
        mut samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate { rate: sample_rate });
        }
        let channels = channels.max(1);
        let frames = samples.len() / channels as usize;
        samples.truncate(frames * channels as usize);

        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    /// Number of frames (samples per channel)
    pub fn len(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value (0.0 for empty input)
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// Average all channels into one
    pub fn to_mono(&self) -> Waveform {
        if self.is_mono() {
            return self.clone();
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Waveform {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }

    /// Copy a frame range into a new waveform with the same rate
    ///
    /// The range is clamped to the waveform length.
    pub fn slice(&self, frames: Range<usize>) -> Waveform {
        let channels = self.channels as usize;
        let end = frames.end.min(self.len());
        let start = frames.start.min(end);

        Waveform {
            samples: self.samples[start * channels..end * channels].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Replace the samples and sample rate of a mono waveform
    pub(crate) fn mono_with_rate(samples: Vec<f32>, sample_rate: u32) -> Waveform {
        Waveform {
            samples,
            sample_rate,
            channels: 1,
        }
    }
}
