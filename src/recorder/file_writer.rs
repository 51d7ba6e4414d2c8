// src/recorder/file_writer.rs

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use ringbuf::traits::Consumer;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Writes mono f32 samples from the ring buffer as 16-bit PCM.
pub struct FileWriter {
    writer: WavWriter<BufWriter<File>>,
}

impl FileWriter {
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::new(BufWriter::new(File::create(path)?), spec)?;
        Ok(Self { writer })
    }

    /// Drains `consumer` until `stop` is raised and the buffer is empty,
    /// then finalizes the header.
    pub fn run<C>(mut self, mut consumer: C, stop: Arc<AtomicBool>, written: Arc<AtomicU64>) -> Result<()>
    where
        C: Consumer<Item = f32>,
    {
        let mut tmp = vec![0.0f32; 4096];

        loop {
            let popped = consumer.pop_slice(tmp.as_mut_slice());
            if popped == 0 {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(Duration::from_millis(5));
                continue;
            }

            for &s in &tmp[..popped] {
                self.writer.write_sample(to_i16(s))?;
            }
            written.fetch_add(popped as u64, Ordering::Relaxed);
        }

        self.writer.finalize()?;
        Ok(())
    }
}

fn to_i16(s: f32) -> i16 {
    if s.is_finite() {
        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::HeapRb;
    use ringbuf::traits::{Producer, Split};

    #[test]
    fn test_drains_buffer_before_stopping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let (mut prod, cons) = HeapRb::<f32>::new(16_384).split();
        let input: Vec<f32> = (0..10_000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert_eq!(prod.push_slice(&input), input.len());

        let stop = Arc::new(AtomicBool::new(true));
        let written = Arc::new(AtomicU64::new(0));
        let writer = FileWriter::new(&path, 48_000).unwrap();
        writer.run(cons, stop, written.clone()).unwrap();

        assert_eq!(written.load(Ordering::Relaxed), 10_000);
        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 48_000);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 10_000);
        assert_eq!(samples[0], i16::MAX / 2);
        assert_eq!(samples[1], -(i16::MAX / 2));
    }

    #[test]
    fn test_clamps_and_zeroes_non_finite() {
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), -i16::MAX);
        assert_eq!(to_i16(f32::NAN), 0);
    }
}
