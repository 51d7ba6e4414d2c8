// src/lib.rs

pub mod annotation;
pub mod audio;
pub mod cache;
pub mod clip;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod playback;
mod player;
pub mod recorder;
pub mod render;
pub mod waveform;

pub use annotation::VoiceAnnotation;
pub use cache::ClipCache;
pub use clip::VoiceClip;
pub use config::{PlaybackTiming, PlayerConfig};
pub use controller::{VoiceFold, VoiceFoldController};
pub use decoder::{ClipFormat, DecodedClip, decode};
pub use error::{ClipError, DecodeError, EnvelopeError, PlaybackError, RenderError};
pub use playback::{
    PlaybackSession, PlaybackSnapshot, PlaybackState, RedrawFlag, RedrawSink, ToggleOutcome,
};
pub use player::{CpalClip, CpalOpener};
pub use recorder::{VoiceRecorder, store_recording};
pub use waveform::Envelope;
