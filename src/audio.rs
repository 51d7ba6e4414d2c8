// src/audio.rs

use anyhow::{anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{info, warn};
use ringbuf::traits::Consumer;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

/// Helper struct to hold output device info
pub struct OutputConfig {
    pub device: Device,
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Finds the default audio output device and its config.
pub fn setup_output_device() -> Result<OutputConfig, anyhow::Error> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device available"))?;
    let supported_config = device.default_output_config()?;
    let sample_format = supported_config.sample_format();
    let config = supported_config.config();
    let output_channels = config.channels as usize;
    let output_sample_rate = config.sample_rate.0;

    info!(
        "output device: channels: {}, sample_rate: {}",
        output_channels, output_sample_rate
    );

    Ok(OutputConfig {
        device,
        config,
        sample_format,
        output_channels,
        output_sample_rate,
    })
}

/// Flags and counters shared between a clip and its output callback.
#[derive(Clone, Default)]
pub struct PlaybackCounters {
    pub is_playing: Arc<AtomicBool>,
    /// Output frames rendered while playing.
    pub frames_played: Arc<AtomicU64>,
    /// Raised by the decoder once no more samples will arrive.
    pub exhausted: Arc<AtomicBool>,
}

impl PlaybackCounters {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build CPAL output stream.
///
/// Playback time advances only for frames that carried audio, or for
/// silence after the decoder is exhausted, so start-up underruns do not
/// count as elapsed time while the tail always reaches the end of the clip.
pub fn build_stream<T, C>(
    device: &Device,
    config: &StreamConfig,
    counters: PlaybackCounters,
    mut consumer: C,
) -> Result<Stream, anyhow::Error>
where
    T: cpal::Sample + cpal::FromSample<f32> + SizedSample + Send + 'static,
    C: Consumer<Item = f32> + Send + 'static,
{
    let channels = config.channels.max(1) as usize;
    let silence = T::from_sample(0.0f32);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let playing = counters.is_playing.load(Ordering::Relaxed);
                for frame in data.chunks_mut(channels) {
                    if !playing {
                        frame.fill(silence);
                        continue;
                    }
                    let mut carried_audio = false;
                    for out in frame.iter_mut() {
                        *out = match consumer.try_pop() {
                            Some(s) => {
                                carried_audio = true;
                                T::from_sample(s)
                            }
                            None => silence,
                        };
                    }
                    if carried_audio || counters.exhausted.load(Ordering::Acquire) {
                        counters.frames_played.fetch_add(1, Ordering::Relaxed);
                    }
                }
            },
            |err| warn!("output stream error: {err}"),
            None,
        )
        .map_err(Into::into)
}

/// Picks the sample type matching the device's native format.
pub fn build_stream_for_device<C>(
    output: &OutputConfig,
    counters: PlaybackCounters,
    consumer: C,
) -> Result<Stream, anyhow::Error>
where
    C: Consumer<Item = f32> + Send + 'static,
{
    match output.sample_format {
        SampleFormat::F32 => build_stream::<f32, _>(&output.device, &output.config, counters, consumer),
        SampleFormat::I16 => build_stream::<i16, _>(&output.device, &output.config, counters, consumer),
        SampleFormat::U16 => build_stream::<u16, _>(&output.device, &output.config, counters, consumer),
        other => bail!("unsupported sample format: {:?}", other),
    }
}
