// src/waveform/terminal.rs

const PLAYED: char = '█';
const UNPLAYED: char = '░';

/// Draws envelope buckets as vertical bars, one column per bucket, bottom
/// aligned. Columns before `progress` (0..=1) use the solid glyph.
pub fn render_ascii(buckets: &[f32], height: usize, progress: f64) -> Vec<String> {
    let h = height.max(2);
    let count = buckets.len();
    let filled: Vec<usize> = buckets
        .iter()
        .map(|&v| ((v.clamp(0.0, 1.0) * h as f32).round() as usize).max(1))
        .collect();

    (0..h)
        .map(|row| {
            let level = h - row;
            filled
                .iter()
                .enumerate()
                .map(|(i, &n)| {
                    if n < level {
                        ' '
                    } else if (i as f64) / (count as f64) < progress {
                        PLAYED
                    } else {
                        UNPLAYED
                    }
                })
                .collect()
        })
        .collect()
}
