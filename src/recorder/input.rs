// src/recorder/input.rs

use anyhow::{Result, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    Device, FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
    SupportedStreamConfig,
};
use log::{info, warn};
use ringbuf::traits::Producer;

/// Rate voice notes are recorded at when the device allows it.
pub const PREFERRED_SAMPLE_RATE: u32 = 48_000;

/// Holds the cpal input stream; the producer lives in its callback.
pub struct AudioInput {
    _stream: Stream,
    pub sample_rate: u32,
    pub device_channels: usize,
}

impl AudioInput {
    /// Opens the default input device and starts capturing its first channel.
    pub fn open<P>(producer: P) -> Result<Self>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no input device available"))?;

        let supported = choose_config(&device)?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let device_channels = config.channels.max(1) as usize;
        let sample_rate = config.sample_rate.0;

        info!(
            "input device: channels: {}, sample_rate: {}, format: {:?}",
            device_channels, sample_rate, sample_format
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32, _>(&device, &config, producer)?,
            SampleFormat::I16 => build_stream::<i16, _>(&device, &config, producer)?,
            SampleFormat::U16 => build_stream::<u16, _>(&device, &config, producer)?,
            other => bail!("unsupported sample format: {:?}", other),
        };
        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate,
            device_channels,
        })
    }
}

/// The device default, moved to 48 kHz when a config with the same sample
/// format covers it.
fn choose_config(device: &Device) -> Result<SupportedStreamConfig> {
    let default = device.default_input_config()?;
    if default.sample_rate().0 == PREFERRED_SAMPLE_RATE {
        return Ok(default);
    }

    let preferred = SampleRate(PREFERRED_SAMPLE_RATE);
    let ranges = match device.supported_input_configs() {
        Ok(ranges) => ranges,
        Err(e) => {
            warn!("could not list input configs, using default: {e}");
            return Ok(default);
        }
    };

    let matching = ranges
        .filter(|r| r.sample_format() == default.sample_format())
        .find(|r| r.min_sample_rate() <= preferred && preferred <= r.max_sample_rate());

    Ok(match matching {
        Some(range) => range.with_sample_rate(preferred),
        None => default,
    })
}

fn build_stream<T, P>(device: &Device, config: &StreamConfig, mut producer: P) -> Result<Stream>
where
    T: Sample + SizedSample,
    f32: FromSample<T>,
    P: Producer<Item = f32> + Send + 'static,
{
    let channels = config.channels.max(1) as usize;
    let mut mono = Vec::<f32>::new();

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            mono.clear();
            mono.extend(data.iter().step_by(channels).map(|&s| f32::from_sample(s)));
            // A full buffer drops the remainder of this block.
            let _ = producer.push_slice(&mono);
        },
        |err| warn!("input stream error: {err}"),
        None,
    )?;
    Ok(stream)
}
