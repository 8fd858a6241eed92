//! In-memory WAV encode/decode.
//!
//! Everything the server ships over HTTP is built in memory; nothing here
//! touches the filesystem. Decoding accepts any PCM or float WAV and folds
//! multi-channel input down to mono, since both the merge pipeline and the
//! clone reference path want a single channel.

use crate::error::AudioError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

/// Decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Clip {
    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decodes a WAV byte buffer to mono f32. Multi-channel input is downmixed
/// by averaging each interleaved frame.
pub fn read_wav(bytes: &[u8]) -> Result<Clip, AudioError> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
    };

    let samples = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok(Clip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Encodes mono f32 samples as a 16-bit PCM WAV, clamping to [-1, 1].
/// This is the container every audio endpoint ships.
pub fn write_wav_i16(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut buf = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut buf, spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i16_round_trip_is_close() {
        let samples = vec![0.0f32, 0.5, -0.5, 0.1];
        let bytes = write_wav_i16(&samples, 16_000).unwrap();

        let clip = read_wav(&bytes).unwrap();
        assert_eq!(clip.sample_rate, 16_000);
        assert_eq!(clip.samples.len(), samples.len());
        for (got, want) in clip.samples.iter().zip(&samples) {
            // 16-bit quantization error plus float noise.
            assert!((got - want).abs() < 1e-3, "got {} want {}", got, want);
        }
    }

    #[test]
    fn i16_clamps_out_of_range_samples() {
        let bytes = write_wav_i16(&[2.0, -2.0], 16_000).unwrap();
        let clip = read_wav(&bytes).unwrap();
        assert!(clip.samples[0] <= 1.0 && clip.samples[0] > 0.99);
        assert!(clip.samples[1] >= -1.0 && clip.samples[1] < -0.99);
    }

    #[test]
    fn float_input_decodes_unscaled() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut buf = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut buf, spec).unwrap();
        for value in [0.0f32, 0.5, -0.5, 0.99] {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let clip = read_wav(&buf.into_inner()).unwrap();
        assert_eq!(clip.sample_rate, 24_000);
        assert_eq!(clip.samples, vec![0.0, 0.5, -0.5, 0.99]);
    }

    #[test]
    fn stereo_input_downmixes_to_mono() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut buf = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut buf, spec).unwrap();
        // Two frames: (L=1.0, R=0.0) and (L=-1.0, R=-1.0).
        for value in [32767i16, 0, -32767, -32767] {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let clip = read_wav(&buf.into_inner()).unwrap();
        assert_eq!(clip.samples.len(), 2);
        assert!((clip.samples[0] - 0.5).abs() < 1e-3);
        assert!((clip.samples[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(
            read_wav(b"definitely not a wav"),
            Err(AudioError::Wav(_))
        ));
    }
}
