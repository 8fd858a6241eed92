//! Clip concatenation with silence gaps.

use crate::error::AudioError;
use crate::wav::Clip;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Gap inserted between consecutive clips.
const SILENCE_BETWEEN_MS: u64 = 1_000;

/// Concatenates `clips` in order with one second of silence between each
/// pair. Nothing is prepended or appended. Clips whose rate differs from
/// the highest input rate are resampled up to it, so merging never degrades
/// the best recording in the batch.
pub fn merge_clips(clips: &[Clip]) -> Result<Clip, AudioError> {
    let rate = clips
        .iter()
        .map(|clip| clip.sample_rate)
        .max()
        .filter(|&rate| rate > 0)
        .ok_or_else(|| AudioError::BadInput("no clips to merge".to_string()))?;

    let gap_len = (u64::from(rate) * SILENCE_BETWEEN_MS / 1_000) as usize;
    let mut samples = Vec::new();
    for (i, clip) in clips.iter().enumerate() {
        if i > 0 {
            samples.resize(samples.len() + gap_len, 0.0);
        }
        if clip.sample_rate == rate {
            samples.extend_from_slice(&clip.samples);
        } else {
            samples.extend(resample(&clip.samples, clip.sample_rate, rate)?);
        }
    }

    Ok(Clip {
        samples,
        sample_rate: rate,
    })
}

/// One-shot whole-buffer resample. Output length lands within a filter
/// delay of `len * to / from`, which is fine for merging speech clips.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let mut resampler =
        FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Septic, samples.len(), 1)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
    let mut output = resampler
        .process(&[samples], None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;
    output
        .pop()
        .ok_or_else(|| AudioError::Resample("resampler produced no output".to_string()))
}
