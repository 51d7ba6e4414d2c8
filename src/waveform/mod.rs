// src/waveform/mod.rs
pub mod terminal;

use crate::decoder::DecodedClip;
use crate::error::EnvelopeError;

/// Mean chunk amplitude is divided by this to get the noise floor that
/// maps to an empty bar.
const FLOOR_DIVISOR: f64 = 1.25;

/// Fixed-resolution amplitude summary of a clip, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub buckets: Vec<f32>,
    pub duration_secs: f64,
}

impl Envelope {
    pub fn from_clip(clip: &DecodedClip, resolution: usize) -> Result<Self, EnvelopeError> {
        Ok(Self {
            buckets: extract_buckets(&clip.samples, resolution)?,
            duration_secs: clip.format.duration_secs(),
        })
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Downsamples `samples` into `resolution` normalized buckets.
///
/// Samples past `resolution * (len / resolution)` are ignored so every
/// bucket covers the same number of samples.
pub fn extract_buckets(samples: &[i32], resolution: usize) -> Result<Vec<f32>, EnvelopeError> {
    let chunk_len = samples.len().checked_div(resolution).unwrap_or(0);
    if chunk_len == 0 {
        return Err(EnvelopeError::TooShort);
    }

    let means: Vec<f64> = samples
        .chunks_exact(chunk_len)
        .take(resolution)
        .map(|chunk| chunk.iter().map(|&s| (s as f64).abs()).sum::<f64>() / chunk_len as f64)
        .collect();

    if means.iter().all(|&m| m == 0.0) {
        return Err(EnvelopeError::Silent);
    }

    let peak = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let floor = means.iter().sum::<f64>() / means.len() as f64 / FLOOR_DIVISOR;
    let range = peak - floor;
    if !(range.is_finite() && range > 0.0) {
        return Err(EnvelopeError::Flat);
    }

    Ok(means
        .iter()
        .map(|&m| ((m - floor) / range).max(0.0) as f32)
        .collect())
}
