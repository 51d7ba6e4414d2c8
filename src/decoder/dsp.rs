// src/decoder/dsp.rs

/// Split interleaved frames onto the end of per-channel queues.
pub fn append_interleaved_to_planar(interleaved: &[f32], planar: &mut [Vec<f32>]) {
    let channels = planar.len();
    if channels == 0 {
        return;
    }
    for frame in interleaved.chunks_exact(channels) {
        for (queue, &s) in planar.iter_mut().zip(frame) {
            queue.push(s);
        }
    }
}

/// Frames available on every channel.
pub fn planar_len(planar: &[Vec<f32>]) -> usize {
    planar.iter().map(Vec::len).min().unwrap_or(0)
}

/// Remove up to `frames` frames from the front of each channel queue.
pub fn take_from_planar(planar: &mut [Vec<f32>], frames: usize) -> Vec<Vec<f32>> {
    planar
        .iter_mut()
        .map(|queue| {
            let n = frames.min(queue.len());
            let tail = queue.split_off(n);
            std::mem::replace(queue, tail)
        })
        .collect()
}

pub fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let channels = planar.len();
    let frames = planar_len(planar);
    let mut out = Vec::with_capacity(frames * channels);
    for f in 0..frames {
        out.extend(planar.iter().map(|queue| queue[f]));
    }
    out
}

/// Remix interleaved audio to a different channel count.
///
/// Mono fans out to every channel; wider sources are averaged down in
/// contiguous groups; anything else wraps channels around.
pub fn remix_interleaved(input: &[f32], in_ch: usize, out_ch: usize) -> Vec<f32> {
    if in_ch == out_ch || in_ch == 0 || out_ch == 0 {
        return input.to_vec();
    }
    let frames = input.len() / in_ch;
    let mut out = Vec::with_capacity(frames * out_ch);

    for frame in input.chunks_exact(in_ch) {
        if in_ch == 1 {
            out.extend(std::iter::repeat_n(frame[0], out_ch));
        } else if out_ch < in_ch {
            let factor = in_ch as f32 / out_ch as f32;
            for oc in 0..out_ch {
                let start = (oc as f32 * factor).floor() as usize;
                let end = (((oc + 1) as f32 * factor).ceil() as usize).min(in_ch);
                let group = &frame[start..end];
                let mixed = if group.is_empty() {
                    0.0
                } else {
                    group.iter().sum::<f32>() / group.len() as f32
                };
                out.push(mixed);
            }
        } else {
            out.extend((0..out_ch).map(|oc| frame[oc % in_ch]));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_fans_out() {
        assert_eq!(remix_interleaved(&[0.5, -0.5], 1, 2), vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_stereo_averages_down() {
        assert_eq!(remix_interleaved(&[1.0, 0.0, 0.2, 0.4], 2, 1), vec![0.5, 0.3]);
    }

    #[test]
    fn test_planar_roundtrip_keeps_remainder() {
        let mut planar = vec![Vec::new(), Vec::new()];
        append_interleaved_to_planar(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &mut planar);
        assert_eq!(planar_len(&planar), 3);

        let head = take_from_planar(&mut planar, 2);
        assert_eq!(interleave(&head), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(planar, vec![vec![5.0], vec![6.0]]);
    }
}
