// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning an audio file into samples.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio format: {0}")]
    Unsupported(String),

    #[error("no audio track in {}", .0.display())]
    NoTrack(PathBuf),

    #[error("clip has no frames: {}", .0.display())]
    Empty(PathBuf),
}

/// The clip decoded fine but cannot produce a meaningful envelope.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("fewer samples than buckets")]
    TooShort,

    #[error("clip is silent")]
    Silent,

    #[error("clip has no dynamic range")]
    Flat,
}

/// Why a clip did not turn into a player.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("degenerate envelope: {0}")]
    Degenerate(#[from] EnvelopeError),
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("backing file is gone: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("failed to open playback resource: {0}")]
    Open(#[from] anyhow::Error),

    #[error("failed to spawn poller thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    #[error("render target is no longer available")]
    TargetUnavailable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
