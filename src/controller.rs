// src/controller.rs

use crate::clip::VoiceClip;
use crate::config::PlaybackTiming;
use crate::error::RenderError;
use crate::playback::{
    PlaybackSession, PlaybackSnapshot, RedrawSink, ResourceOpener, ToggleOutcome,
};
use crate::render::{self, PaintSurface, Point, Rect, RenderRequest};
use log::trace;
use std::sync::Arc;

/// What the host editor talks to for one folded voice comment.
pub trait VoiceFoldController {
    fn toggle(&mut self) -> ToggleOutcome;

    /// Tears down playback; the fold is about to disappear.
    fn dispose(&mut self);

    /// Paints the player with its top-left corner at `origin`.
    fn paint(&self, surface: &mut dyn PaintSurface, origin: Point) -> Result<(), RenderError>;

    /// Routes a click; only clicks on the play button toggle.
    fn click(&mut self, origin: Point, point: Point) -> Option<ToggleOutcome>;

    /// Re-aligns the player with its comment, e.g. after a re-fold.
    fn set_indent(&mut self, columns: u32);

    fn size(&self) -> (f32, f32) {
        (render::WIDTH, render::HEIGHT)
    }
}

/// A voice clip bound to its own playback session.
pub struct VoiceFold {
    clip: Arc<VoiceClip>,
    session: PlaybackSession,
    font_family: String,
    font_size: f32,
    indent_columns: u32,
}

impl VoiceFold {
    pub fn new(
        clip: Arc<VoiceClip>,
        timing: PlaybackTiming,
        opener: Arc<dyn ResourceOpener>,
        redraw: Arc<dyn RedrawSink>,
    ) -> Self {
        let session = PlaybackSession::new(
            clip.path.clone(),
            clip.duration_secs(),
            timing,
            opener,
            redraw,
        );
        Self {
            clip,
            session,
            font_family: String::from("monospace"),
            font_size: 13.0,
            indent_columns: 0,
        }
    }

    /// Editor font used for labels and, by size, for the indent offset.
    pub fn with_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self
    }

    pub fn clip(&self) -> &VoiceClip {
        &self.clip
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.session.snapshot()
    }

    pub fn indent_offset(&self) -> f32 {
        render::indent_offset(self.font_size, self.indent_columns)
    }
}

impl VoiceFoldController for VoiceFold {
    fn toggle(&mut self) -> ToggleOutcome {
        self.session.toggle()
    }

    fn dispose(&mut self) {
        self.session.dispose();
    }

    fn paint(&self, surface: &mut dyn PaintSurface, origin: Point) -> Result<(), RenderError> {
        let (width, height) = self.size();
        let request = RenderRequest {
            viewport: Rect::new(origin.x, origin.y, width, height),
            font_family: &self.font_family,
            snapshot: self.session.snapshot(),
            buckets: &self.clip.envelope.buckets,
            created_label: &self.clip.created_label,
            indent_offset: self.indent_offset(),
        };
        let commands = render::render(&request);
        render::paint(surface, &commands).inspect_err(|_| {
            trace!("dropped redraw for {}", self.clip.path.display());
        })
    }

    fn click(&mut self, origin: Point, point: Point) -> Option<ToggleOutcome> {
        render::toggle_hit(origin, self.indent_offset(), point).then(|| self.toggle())
    }

    fn set_indent(&mut self, columns: u32) {
        self.indent_columns = columns;
    }
}
