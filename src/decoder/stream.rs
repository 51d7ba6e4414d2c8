// src/decoder/stream.rs

use crate::decoder::resample::RateConverter;
use crate::decoder::{OpenedTrack, dsp, open_track, output};
use anyhow::{Context, anyhow};
use log::{debug, warn};
use ringbuf::traits::Producer as RbProducer;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::errors::Error as SymphoniaError;

/// Decodes a clip for playback, converted to the output device layout.
///
/// The container is probed on the calling thread so open failures surface
/// immediately; decoding itself runs on a dedicated thread.
pub struct StreamDecoder {
    path: PathBuf,
    track: OpenedTrack,
    source_sample_rate: u32,
    output_channels: usize,
    output_sample_rate: u32,
}

impl StreamDecoder {
    pub fn open(
        path: &Path,
        output_channels: usize,
        output_sample_rate: u32,
    ) -> Result<Self, anyhow::Error> {
        let track = open_track(path)?;
        let source_sample_rate = track
            .sample_rate
            .context("clip does not declare a sample rate")?;
        Ok(Self {
            path: path.to_path_buf(),
            track,
            source_sample_rate,
            output_channels: output_channels.max(1),
            output_sample_rate,
        })
    }

    /// Starts the decoder thread. `exhausted` is raised once the last sample
    /// was pushed (or decoding stopped for any reason).
    pub fn spawn<P>(
        self,
        producer: P,
        shutdown: Arc<AtomicBool>,
        exhausted: Arc<AtomicBool>,
    ) -> Result<JoinHandle<()>, anyhow::Error>
    where
        P: RbProducer<Item = f32> + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("voice-decoder".into())
            .spawn(move || {
                let path = self.path.clone();
                if let Err(e) = self.run(producer, &shutdown) {
                    warn!("decoder thread for {} failed: {e:#}", path.display());
                }
                exhausted.store(true, Ordering::Release);
            })?;
        Ok(handle)
    }

    fn run<P>(mut self, mut producer: P, shutdown: &AtomicBool) -> Result<(), anyhow::Error>
    where
        P: RbProducer<Item = f32>,
    {
        let mut converter = RateConverter::new(
            self.source_sample_rate,
            self.output_sample_rate,
            self.output_channels,
        )?;
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }

            let packet = match self.track.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(anyhow!(e)),
            };
            if packet.track_id() != self.track.track_id {
                continue;
            }

            let decoded = match self.track.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(anyhow!(e)),
            };

            let spec = *decoded.spec();
            let decoded_ch = spec.channels.count();
            if sample_buf
                .as_ref()
                .is_none_or(|b| b.capacity() < decoded.capacity() * decoded_ch)
            {
                sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            let Some(buf) = sample_buf.as_mut() else {
                continue;
            };
            buf.copy_interleaved_ref(decoded);

            let mixed = dsp::remix_interleaved(buf.samples(), decoded_ch, self.output_channels);

            match converter.as_mut() {
                Some(conv) => {
                    conv.push_interleaved(&mixed);
                    while let Some(block) = conv.pop_ready()? {
                        if !output::push_all(&mut producer, &block, shutdown) {
                            return Ok(());
                        }
                    }
                }
                None => {
                    if !output::push_all(&mut producer, &mixed, shutdown) {
                        return Ok(());
                    }
                }
            }
        }

        if let Some(conv) = converter.as_mut() {
            let tail = conv.flush()?;
            output::push_all(&mut producer, &tail, shutdown);
        }
        debug!("finished decoding {}", self.path.display());
        Ok(())
    }
}
