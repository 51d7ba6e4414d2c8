// src/recorder/mod.rs

pub mod file_writer;
pub mod input;

use crate::recorder::{file_writer::FileWriter, input::AudioInput};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use log::{info, warn};
use ringbuf::{HeapRb, traits::Split};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::thread;
use std::time::Duration;

const RECORD_CAPACITY: usize = 192_000;

/// Captures a voice note from the default input device into a temp file.
pub struct VoiceRecorder {
    input: Option<AudioInput>,
    path: PathBuf,
    stop: Arc<AtomicBool>,
    written: Arc<AtomicU64>,
    writer_handle: Option<thread::JoinHandle<Result<()>>>,
}

impl VoiceRecorder {
    pub fn start(temp_path: &Path) -> Result<Self> {
        let (producer, consumer) = HeapRb::<f32>::new(RECORD_CAPACITY).split();
        let input = AudioInput::open(producer)?;

        let writer = FileWriter::new(temp_path, input.sample_rate)
            .with_context(|| format!("creating {}", temp_path.display()))?;
        let stop = Arc::new(AtomicBool::new(false));
        let written = Arc::new(AtomicU64::new(0));

        let writer_stop = stop.clone();
        let writer_written = written.clone();
        let writer_handle = thread::Builder::new()
            .name("voice-writer".into())
            .spawn(move || writer.run(consumer, writer_stop, writer_written))
            .context("spawning writer thread")?;

        info!("recording to {}", temp_path.display());
        Ok(Self {
            input: Some(input),
            path: temp_path.to_path_buf(),
            stop,
            written,
            writer_handle: Some(writer_handle),
        })
    }

    pub fn elapsed(&self) -> Duration {
        let rate = self.input.as_ref().map_or(0, |i| i.sample_rate);
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.written.load(Ordering::Relaxed) as f64 / rate as f64)
    }

    /// Stops capture, flushes what is buffered and finalizes the file.
    pub fn stop(mut self) -> Result<PathBuf> {
        self.finish()?;
        Ok(self.path.clone())
    }

    fn finish(&mut self) -> Result<()> {
        // Dropping the stream ends capture before the writer drains.
        self.input.take();
        self.stop.store(true, Ordering::Release);
        match self.writer_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("writer thread panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("recording {} not finalized: {e}", self.path.display());
        }
    }
}

/// Moves a finished recording to `<dir>/<epoch millis>.wav`.
pub fn store_recording(temp: &Path, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let target = dir.join(format!("{}.wav", now.timestamp_millis()));
    if fs::rename(temp, &target).is_err() {
        // Different filesystem.
        fs::copy(temp, &target)
            .with_context(|| format!("copying {} to {}", temp.display(), target.display()))?;
        fs::remove_file(temp).ok();
    }
    info!("stored recording at {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_store_names_file_by_epoch_millis() {
        let tmp = tempfile::tempdir().unwrap();
        let temp = tmp.path().join("capture.wav");
        fs::write(&temp, b"RIFF").unwrap();
        let dir = tmp.path().join(".idea");
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();

        let stored = store_recording(&temp, &dir, now).unwrap();
        assert_eq!(stored, dir.join("1700000000123.wav"));
        assert!(stored.is_file());
        assert!(!temp.exists());
    }

    #[test]
    fn test_store_missing_temp_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let now = Utc.timestamp_millis_opt(1).unwrap();
        assert!(store_recording(&tmp.path().join("nope.wav"), tmp.path(), now).is_err());
    }
}
