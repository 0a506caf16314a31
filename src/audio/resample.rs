// Sample rate conversion with rubato
//
// Whole-file conversion: the signal is pushed through an FFT resampler in
// fixed chunks, the tail is flushed with partial chunks, and the resampler's
// output delay is trimmed so that output sample 0 lines up with input
// sample 0.

use rubato::{FftFixedIn, Resampler};

use super::Waveform;
use crate::error::AudioError;

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resample a mono waveform to `target_rate`
///
/// The output holds `ceil(len * target_rate / source_rate)` samples.
pub fn resample(wave: &Waveform, target_rate: u32) -> Result<Waveform, AudioError> {
    let source_rate = wave.sample_rate();
    if source_rate == target_rate || wave.is_empty() {
        return Ok(Waveform::mono_with_rate(
            wave.to_mono().into_samples(),
            target_rate,
        ));
    }

    let failed = |reason: String| AudioError::ResampleFailed {
        from: source_rate,
        to: target_rate,
        reason,
    };

    let mono = wave.to_mono();
    let samples = mono.samples();

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1,
    )
    .map_err(|err| failed(err.to_string()))?;

    let delay = resampler.output_delay();
    let expected =
        (samples.len() as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;
    let mut output: Vec<f32> = Vec::with_capacity(expected + delay + CHUNK_SIZE);

    let mut pos = 0usize;
    while pos + resampler.input_frames_next() <= samples.len() {
        let frames = resampler.input_frames_next();
        let input = [&samples[pos..pos + frames]];
        let chunk = resampler
            .process(&input[..], None)
            .map_err(|err| failed(err.to_string()))?;
        output.extend_from_slice(&chunk[0]);
        pos += frames;
    }

    if pos < samples.len() {
        let tail = [&samples[pos..]];
        let chunk = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|err| failed(err.to_string()))?;
        output.extend_from_slice(&chunk[0]);
    }

    while output.len() < expected + delay {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|err| failed(err.to_string()))?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);

    Ok(Waveform::mono_with_rate(output, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: u32, frequency: f32, frames: usize) -> Waveform {
        let samples = (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_same_rate_is_identity() {
        let wave = sine(16_000, 440.0, 1_000);
        let out = resample(&wave, 16_000).unwrap();
        assert_eq!(out, wave);
    }

    #[test]
    fn test_downsample_length() {
        let wave = sine(44_100, 440.0, 44_100);
        let out = resample(&wave, 16_000).unwrap();
        assert_eq!(out.sample_rate(), 16_000);
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn test_upsample_preserves_amplitude() {
        let wave = sine(8_000, 200.0, 8_000);
        let out = resample(&wave, 16_000).unwrap();
        assert_eq!(out.len(), 16_000);

        // Ignore edges where the FFT resampler ramps in and out
        let middle = &out.samples()[2_000..14_000];
        let peak = middle.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!((peak - 1.0).abs() < 0.05, "peak after resampling was {}", peak);
    }

    #[test]
    fn test_empty_input() {
        let wave = Waveform::new(Vec::new(), 44_100).unwrap();
        let out = resample(&wave, 16_000).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate(), 16_000);
    }
}
