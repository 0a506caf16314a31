// Audio file I/O
//
// WAV files are read and written with hound. Other containers (FLAC,
// OGG/Vorbis, ...) are decoded with symphonia. Integer PCM is scaled to
// [-1, 1) by 2^(bits-1).

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::resample::resample;
use super::Waveform;
use crate::error::AudioError;

/// Read an audio file into an interleaved waveform at its native rate
pub fn read_audio(path: &Path) -> Result<Waveform, AudioError> {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);

    let (samples, sample_rate, channels) = if is_wav {
        match read_wav(path) {
            Ok(decoded) => decoded,
            Err(err @ AudioError::OpenFailed { .. }) => return Err(err),
            Err(err) => {
                log::debug!(
                    "hound could not read {} ({}), retrying with symphonia",
                    path.display(),
                    err
                );
                decode_with_symphonia(path)?
            }
        }
    } else {
        decode_with_symphonia(path)?
    };

    if samples.is_empty() {
        return Err(AudioError::EmptyAudio {
            path: path.display().to_string(),
        });
    }

    Waveform::interleaved(samples, sample_rate, channels).map_err(|err| {
        AudioError::DecodeFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    })
}

/// Read, mix to mono and resample to `sample_rate`
pub fn load_resampled(path: &Path, sample_rate: u32) -> Result<Waveform, AudioError> {
    let wave = read_audio(path)?.to_mono();
    if wave.sample_rate() == sample_rate {
        return Ok(wave);
    }

    log::debug!(
        "Resampling {} from {} Hz to {} Hz",
        path.display(),
        wave.sample_rate(),
        sample_rate
    );
    resample(&wave, sample_rate)
}

/// Write a mono waveform as 16-bit signed PCM WAV
///
/// Samples are clamped to [-1, 1] before quantization.
pub fn write_wav(path: &Path, wave: &Waveform) -> Result<(), AudioError> {
    let write_failed = |err: hound::Error| AudioError::WriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    };

    let spec = hound::WavSpec {
        channels: wave.channels(),
        sample_rate: wave.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(write_failed)?;
    for &sample in wave.samples() {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(quantized).map_err(write_failed)?;
    }
    writer.finalize().map_err(write_failed)
}

fn read_wav(path: &Path) -> Result<(Vec<f32>, u32, u16), AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| match err {
        hound::Error::IoError(io) => AudioError::OpenFailed {
            path: path.display().to_string(),
            reason: io.to_string(),
        },
        other => AudioError::DecodeFailed {
            path: path.display().to_string(),
            reason: other.to_string(),
        },
    })?;
    let spec = reader.spec();
    let decode_failed = |err: hound::Error| AudioError::DecodeFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    };

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(decode_failed))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            match spec.bits_per_sample {
                8 => reader
                    .samples::<i8>()
                    .map(|sample| sample.map(|v| v as f32 / scale).map_err(decode_failed))
                    .collect::<Result<Vec<f32>, _>>()?,
                16 => reader
                    .samples::<i16>()
                    .map(|sample| sample.map(|v| v as f32 / scale).map_err(decode_failed))
                    .collect::<Result<Vec<f32>, _>>()?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / scale).map_err(decode_failed))
                    .collect::<Result<Vec<f32>, _>>()?,
                bits => {
                    return Err(AudioError::UnsupportedFormat {
                        path: path.display().to_string(),
                        details: format!("bits_per_sample={}", bits),
                    })
                }
            }
        }
    };

    Ok((samples, spec.sample_rate, spec.channels))
}

fn decode_with_symphonia(path: &Path) -> Result<(Vec<f32>, u32, u16), AudioError> {
    let decode_failed = |err: SymphoniaError| AudioError::DecodeFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    };

    let file = File::open(path).map_err(|err| AudioError::OpenFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_failed)?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format
            .default_track()
            .ok_or_else(|| AudioError::UnsupportedFormat {
                path: path.display().to_string(),
                details: "no default audio track".to_string(),
            })?;
        (track.id, track.codec_params.clone())
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(decode_failed)?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut samples = Vec::<f32>::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(err) => return Err(decode_failed(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), reason);
                continue;
            }
            Err(err) => return Err(decode_failed(err)),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;

        let needs_alloc = sample_buf
            .as_ref()
            .map(|b| b.capacity() < decoded.capacity())
            .unwrap_or(true);
        if needs_alloc {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    if sample_rate == 0 {
        return Err(AudioError::UnsupportedFormat {
            path: path.display().to_string(),
            details: "unknown sample rate".to_string(),
        });
    }

    Ok((samples, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: u32, frequency: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| {
                0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32)
                    .sin()
            })
            .collect()
    }

    #[test]
    fn test_write_then_read_preserves_rate_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let wave = Waveform::new(sine(16_000, 440.0, 1_600), 16_000).unwrap();

        write_wav(&path, &wave).unwrap();
        let loaded = read_audio(&path).unwrap();

        assert_eq!(loaded.sample_rate(), 16_000);
        assert_eq!(loaded.len(), 1_600);
        for (a, b) in loaded.samples().iter().zip(wave.samples()) {
            assert!((a - b).abs() < 1e-3, "quantization error too large");
        }
    }

    #[test]
    fn test_write_clamps_out_of_range_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loud.wav");
        let wave = Waveform::new(vec![2.0, -3.0, 0.0], 8_000).unwrap();

        write_wav(&path, &wave).unwrap();
        let mut reader = hound::WavReader::open(&path).unwrap();
        let raw: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(raw, vec![i16::MAX, -i16::MAX, 0]);
        assert_eq!(reader.spec().bits_per_sample, 16);
    }

    #[test]
    fn test_read_stereo_keeps_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16_384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let wave = read_audio(&path).unwrap();
        assert_eq!(wave.channels(), 2);
        assert_eq!(wave.len(), 100);
        let mono = wave.to_mono();
        assert!((mono.samples()[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = read_audio(Path::new("/nonexistent/cough-heavy.wav")).unwrap_err();
        assert!(matches!(err, AudioError::OpenFailed { .. }));
    }

    #[test]
    fn test_load_resampled_changes_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hi.wav");
        let wave = Waveform::new(sine(48_000, 440.0, 48_000), 48_000).unwrap();
        write_wav(&path, &wave).unwrap();

        let loaded = load_resampled(&path, 16_000).unwrap();
        assert_eq!(loaded.sample_rate(), 16_000);
        assert_eq!(loaded.len(), 16_000);
    }
}
