// src/decoder/resample.rs

use crate::decoder::dsp;
use anyhow::Result;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    calculate_cutoff,
};

/// Sample-rate conversion from the clip rate to the device rate.
///
/// Input arrives interleaved in arbitrary block sizes; it is staged per
/// channel until the resampler has a full chunk.
pub struct RateConverter {
    resampler: SincFixedIn<f32>,
    staged: Vec<Vec<f32>>,
}

impl RateConverter {
    /// `None` when the rates already match.
    pub fn new(src_rate: u32, dst_rate: u32, channels: usize) -> Result<Option<Self>> {
        if src_rate == dst_rate {
            return Ok(None);
        }
        let ratio = dst_rate as f64 / src_rate as f64;
        let sinc_len = 256usize;
        let window = WindowFunction::BlackmanHarris2;
        let params = SincInterpolationParameters {
            sinc_len,
            f_cutoff: calculate_cutoff(sinc_len, window),
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window,
        };
        let resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, 1024, channels)?;
        Ok(Some(Self {
            resampler,
            staged: vec![Vec::with_capacity(4096); channels],
        }))
    }

    pub fn push_interleaved(&mut self, interleaved: &[f32]) {
        dsp::append_interleaved_to_planar(interleaved, &mut self.staged);
    }

    /// Next converted block, interleaved, once enough input is staged.
    pub fn pop_ready(&mut self) -> Result<Option<Vec<f32>>> {
        let need = self.resampler.input_frames_next();
        if dsp::planar_len(&self.staged) < need {
            return Ok(None);
        }
        let block = dsp::take_from_planar(&mut self.staged, need);
        let out = self.resampler.process(&block, None)?;
        Ok(Some(dsp::interleave(&out)))
    }

    /// Converts whatever is still staged plus the resampler's tail.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let mut out = Vec::new();
        let remaining = dsp::planar_len(&self.staged);
        if remaining > 0 {
            let block = dsp::take_from_planar(&mut self.staged, remaining);
            let converted = self.resampler.process_partial(Some(block.as_slice()), None)?;
            out.extend(dsp::interleave(&converted));
        }
        let tail = self.resampler.process_partial::<Vec<f32>>(None, None)?;
        out.extend(dsp::interleave(&tail));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_needs_no_converter() {
        assert!(RateConverter::new(48_000, 48_000, 2).unwrap().is_none());
    }

    #[test]
    fn test_upsampling_roughly_doubles_frames() {
        let mut conv = RateConverter::new(24_000, 48_000, 1).unwrap().unwrap();
        conv.push_interleaved(&vec![0.25f32; 24_000]);

        let mut produced = 0usize;
        while let Some(block) = conv.pop_ready().unwrap() {
            produced += block.len();
        }
        produced += conv.flush().unwrap().len();

        assert!(produced > 46_000, "produced {produced}");
        assert!(produced < 52_000, "produced {produced}");
    }
}
