// src/player.rs

use crate::audio::{PlaybackCounters, build_stream_for_device, setup_output_device};
use crate::decoder::StreamDecoder;
use crate::error::PlaybackError;
use crate::playback::{PlaybackResource, ResourceOpener};
use anyhow::{Context, anyhow};
use cpal::traits::StreamTrait;
use log::{debug, info};
use ringbuf::{HeapRb, traits::Split};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

const RING_CAPACITY: usize = 131_072;

/// A voice clip opened on the default output device.
///
/// The cpal stream lives on its own thread for its whole life, so the clip
/// itself is `Send` on every platform; the decoder thread keeps the ring
/// buffer filled.
pub struct CpalClip {
    counters: PlaybackCounters,
    output_sample_rate: u32,
    shutdown: Arc<AtomicBool>,
    output_stop: Option<mpsc::Sender<()>>,
    output_handle: Option<JoinHandle<()>>,
    decoder_handle: Option<JoinHandle<()>>,
}

impl CpalClip {
    /// Opens the output device and starts decoding `path`, paused.
    pub fn open(path: &Path) -> Result<Self, anyhow::Error> {
        let (producer, consumer) = HeapRb::<f32>::new(RING_CAPACITY).split();
        let counters = PlaybackCounters::new();

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(usize, u32), anyhow::Error>>(1);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let callback_counters = counters.clone();

        let output_handle = thread::Builder::new()
            .name("voice-output".into())
            .spawn(move || {
                let started = setup_output_device().and_then(|output| {
                    let stream = build_stream_for_device(&output, callback_counters, consumer)?;
                    stream.play()?;
                    Ok((stream, output.output_channels, output.output_sample_rate))
                });
                match started {
                    Ok((stream, channels, rate)) => {
                        let _ = ready_tx.send(Ok((channels, rate)));
                        // Parked until the clip is closed.
                        let _ = stop_rx.recv();
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .context("spawning output thread")?;

        let (output_channels, output_sample_rate) = ready_rx
            .recv()
            .map_err(|_| anyhow!("output thread exited before reporting"))??;

        let mut clip = Self {
            counters,
            output_sample_rate,
            shutdown: Arc::new(AtomicBool::new(false)),
            output_stop: Some(stop_tx),
            output_handle: Some(output_handle),
            decoder_handle: None,
        };

        // From here on, dropping `clip` tears the output thread down again.
        let decoder = StreamDecoder::open(path, output_channels, output_sample_rate)?;
        clip.decoder_handle = Some(decoder.spawn(
            producer,
            clip.shutdown.clone(),
            clip.counters.exhausted.clone(),
        )?);

        info!("opened {} for playback", path.display());
        Ok(clip)
    }
}

impl PlaybackResource for CpalClip {
    fn start(&mut self) {
        self.counters.is_playing.store(true, Ordering::Relaxed);
    }

    fn stop(&mut self) {
        self.counters.is_playing.store(false, Ordering::Relaxed);
    }

    fn is_running(&self) -> bool {
        self.counters.is_playing.load(Ordering::Relaxed)
    }

    fn position_secs(&self) -> f64 {
        if self.output_sample_rate == 0 {
            return 0.0;
        }
        self.counters.frames_played.load(Ordering::Relaxed) as f64 / self.output_sample_rate as f64
    }
}

impl Drop for CpalClip {
    fn drop(&mut self) {
        self.counters.is_playing.store(false, Ordering::Relaxed);
        self.shutdown.store(true, Ordering::Relaxed);
        drop(self.output_stop.take());
        if let Some(h) = self.decoder_handle.take() {
            let _ = h.join();
        }
        if let Some(h) = self.output_handle.take() {
            let _ = h.join();
        }
        debug!("playback resource closed");
    }
}

/// Opens clips on the system's default output device.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalOpener;

impl ResourceOpener for CpalOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn PlaybackResource>, PlaybackError> {
        if !path.exists() {
            return Err(PlaybackError::FileMissing(path.to_path_buf()));
        }
        Ok(Box::new(CpalClip::open(path)?))
    }
}
