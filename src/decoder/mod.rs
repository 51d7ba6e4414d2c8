// src/decoder/mod.rs

pub mod dsp;
pub mod output;
pub mod resample;
pub mod stream;

use crate::error::DecodeError;
use log::debug;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder as CodecDecoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

pub use stream::StreamDecoder;

/// Format parameters of a clip, read once at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipFormat {
    pub sample_rate: u32,
    pub frame_count: u64,
    pub channels: usize,
    pub bits_per_sample: u32,
}

impl ClipFormat {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.sample_rate as f64
    }
}

/// Mono integer samples of a clip. Only channel 0 survives decoding.
#[derive(Debug, Clone)]
pub struct DecodedClip {
    pub path: PathBuf,
    pub format: ClipFormat,
    pub samples: Vec<i32>,
}

/// A probed container with a codec ready for its default track.
pub(crate) struct OpenedTrack {
    pub format: Box<dyn FormatReader>,
    pub decoder: Box<dyn CodecDecoder>,
    pub track_id: u32,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub bits_per_sample: Option<u32>,
}

pub(crate) fn open_track(path: &Path) -> Result<OpenedTrack, DecodeError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DecodeError::NotFound(path.to_path_buf()),
        _ => DecodeError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| classify(path, e))?;
    let format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::NoTrack(path.to_path_buf()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let decoder = get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| classify(path, e))?;

    Ok(OpenedTrack {
        format,
        decoder,
        track_id,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
        bits_per_sample: params.bits_per_sample,
    })
}

fn classify(path: &Path, err: SymphoniaError) -> DecodeError {
    match err {
        SymphoniaError::IoError(source) => DecodeError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => DecodeError::Unsupported(format!("{}: {other}", path.display())),
    }
}

/// The stored little-endian bytes of one sample, zero-padded to four bytes
/// and read as `i32`.
///
/// symphonia hands out full-scale `i32`; narrower samples are shifted back
/// down without sign extension, so a 16-bit `-1` reads as `65535`. 8-bit
/// PCM is stored unsigned and comes back as its raw byte.
pub fn stored_value(full_scale: i32, bits_per_sample: u32) -> i32 {
    if !(1..32).contains(&bits_per_sample) {
        return full_scale;
    }
    let raw = (full_scale as u32) >> (32 - bits_per_sample);
    if bits_per_sample == 8 {
        (raw ^ 0x80) as i32
    } else {
        raw as i32
    }
}

/// Reads a whole clip into channel-0 integer samples (see [`stored_value`]).
pub fn decode(path: &Path) -> Result<DecodedClip, DecodeError> {
    let mut track = open_track(path)?;

    let bits_per_sample = track.bits_per_sample.unwrap_or(32);

    let mut sample_rate = track.sample_rate;
    let mut channels = track.channels.unwrap_or(1);
    let mut samples: Vec<i32> = Vec::new();
    let mut sample_buf: Option<(SignalSpec, u64, SampleBuffer<i32>)> = None;

    loop {
        let packet = match track.format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(classify(path, e)),
        };
        if packet.track_id() != track.track_id {
            continue;
        }

        let decoded = match track.decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                debug!("skipping bad packet in {}: {msg}", path.display());
                continue;
            }
            Err(SymphoniaError::IoError(_)) => continue,
            Err(e) => return Err(classify(path, e)),
        };

        let spec = *decoded.spec();
        let capacity = decoded.capacity() as u64;
        channels = spec.channels.count().max(1);
        sample_rate.get_or_insert(spec.rate);

        let reusable = matches!(&sample_buf, Some((s, cap, _)) if *s == spec && *cap >= capacity);
        if !reusable {
            sample_buf = Some((spec, capacity, SampleBuffer::<i32>::new(capacity, spec)));
        }
        let Some((_, _, buf)) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        samples.extend(
            buf.samples()
                .chunks(channels)
                .map(|frame| stored_value(frame[0], bits_per_sample)),
        );
    }

    let sample_rate = sample_rate
        .ok_or_else(|| DecodeError::Unsupported(format!("{}: missing sample rate", path.display())))?;
    if samples.is_empty() {
        return Err(DecodeError::Empty(path.to_path_buf()));
    }

    let format = ClipFormat {
        sample_rate,
        frame_count: samples.len() as u64,
        channels,
        bits_per_sample,
    };
    debug!(
        "decoded {}: {} frames, {} Hz, {} ch, {} bit",
        path.display(),
        format.frame_count,
        format.sample_rate,
        format.channels,
        format.bits_per_sample
    );

    Ok(DecodedClip {
        path: path.to_path_buf(),
        format,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, bits: u16, frames: &[Vec<i32>]) {
        let spec = WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                match bits {
                    16 => writer.write_sample(s as i16).unwrap(),
                    _ => writer.write_sample(s).unwrap(),
                }
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_zero_pads_16bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signed.wav");
        write_wav(&path, 1, 16, &[vec![1024], vec![-1], vec![0], vec![-32768]]);

        let clip = decode(&path).unwrap();
        assert_eq!(clip.samples, vec![1024, 65535, 0, 32768]);
        assert_eq!(clip.format.bits_per_sample, 16);
        assert_eq!(clip.format.frame_count, 4);
    }

    #[test]
    fn test_decode_zero_pads_24bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.wav");
        write_wav(&path, 1, 24, &[vec![4096], vec![-1]]);

        let clip = decode(&path).unwrap();
        assert_eq!(clip.samples, vec![4096, 0x00FF_FFFF]);
        assert_eq!(clip.format.bits_per_sample, 24);
    }

    #[test]
    fn test_decode_8bit_reads_raw_unsigned_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("byte.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        // hound stores 8-bit samples offset by 128.
        for s in [-1i8, 0, -128, 127] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let clip = decode(&path).unwrap();
        assert_eq!(clip.samples, vec![127, 128, 0, 255]);
    }

    #[test]
    fn test_stored_value_widths() {
        assert_eq!(stored_value(-1 << 16, 16), 0xFFFF);
        assert_eq!(stored_value(i32::MIN, 16), 0x8000);
        assert_eq!(stored_value(1024 << 16, 16), 1024);
        assert_eq!(stored_value(-1 << 8, 24), 0x00FF_FFFF);
        assert_eq!(stored_value(-7, 32), -7);
        assert_eq!(stored_value(-7, 0), -7);
    }

    #[test]
    fn test_decode_uses_first_channel_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 16, &[vec![10, 900], vec![20, 900], vec![-30, 900]]);

        let clip = decode(&path).unwrap();
        assert_eq!(clip.format.channels, 2);
        assert_eq!(clip.samples, vec![10, 20, -30]);
    }

    #[test]
    fn test_missing_file() {
        let err = decode(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, DecodeError::NotFound(_)));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        std::fs::write(&path, b"this is not audio at all, just bytes").unwrap();
        let err = decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }

    #[test]
    fn test_duration_from_format() {
        let format = ClipFormat {
            sample_rate: 48_000,
            frame_count: 96_000,
            channels: 1,
            bits_per_sample: 16,
        };
        assert!((format.duration_secs() - 2.0).abs() < 1e-9);
    }
}
