// src/clip.rs

use crate::decoder::{self, ClipFormat};
use crate::error::{ClipError, DecodeError};
use crate::waveform::Envelope;
use chrono::{DateTime, Local};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Everything the player needs to know about a voice note, computed once.
#[derive(Debug, Clone)]
pub struct VoiceClip {
    pub path: PathBuf,
    pub format: ClipFormat,
    pub envelope: Envelope,
    /// `HH:MM` of the file's creation, local time.
    pub created_label: String,
    pub modified: SystemTime,
}

impl VoiceClip {
    /// Decodes `path` and builds its envelope. Silent clips are rejected
    /// with [`ClipError::Degenerate`]; no player should be shown for them.
    pub fn load(path: &Path, resolution: usize) -> Result<Self, ClipError> {
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DecodeError::NotFound(path.to_path_buf()),
            _ => DecodeError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        // Some filesystems do not record a birth time.
        let created = meta.created().unwrap_or(modified);

        let decoded = decoder::decode(path)?;
        let envelope = Envelope::from_clip(&decoded, resolution)?;
        debug!(
            "envelope for {}: {} buckets over {:.2}s",
            path.display(),
            envelope.len(),
            envelope.duration_secs
        );

        Ok(Self {
            path: decoded.path,
            format: decoded.format,
            envelope,
            created_label: clock_label(created),
            modified,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.envelope.duration_secs
    }
}

/// Formats a timestamp as local `HH:MM`.
pub fn clock_label(at: SystemTime) -> String {
    DateTime::<Local>::from(at).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_label_shape() {
        let label = clock_label(SystemTime::now());
        assert_eq!(label.len(), 5);
        assert_eq!(&label[2..3], ":");
        assert!(label[..2].parse::<u32>().unwrap() < 24);
        assert!(label[3..].parse::<u32>().unwrap() < 60);
    }

    #[test]
    fn test_missing_clip_is_decode_error() {
        let err = VoiceClip::load(Path::new("/no/such/voice.wav"), 40).unwrap_err();
        assert!(matches!(err, ClipError::Decode(DecodeError::NotFound(_))));
    }
}
