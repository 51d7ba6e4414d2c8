// src/playback/mod.rs

pub mod poller;

use crate::config::PlaybackTiming;
use crate::error::PlaybackError;
use log::{debug, info, warn};
use poller::Poller;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An opened clip that can be started, stopped and asked for its position.
/// Dropping it releases the underlying audio resource.
pub trait PlaybackResource: Send {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    /// Seconds played since the resource was opened.
    fn position_secs(&self) -> f64;
}

/// Opens a fresh playback resource for a clip. Never shared between sessions.
pub trait ResourceOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PlaybackResource>, PlaybackError>;
}

/// Receives "needs redraw" from the poller thread.
pub trait RedrawSink: Send + Sync {
    fn request_redraw(&self);
}

/// A redraw sink the host polls from its own loop.
#[derive(Debug, Default)]
pub struct RedrawFlag(AtomicBool);

impl RedrawFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the flag, returning whether a redraw was pending.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl RedrawSink for RedrawFlag {
    fn request_redraw(&self) {
        self.0.store(true, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    /// Never played, paused (non-zero time) or rewound.
    Idle = 0,
    Playing = 1,
    Finished = 2,
}

impl PlaybackState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Playing,
            2 => Self::Finished,
            _ => Self::Idle,
        }
    }
}

/// What a click on the play button did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Paused,
    /// Stopped right at the end; the next play starts from zero.
    Rewound,
    FileMissing,
    OpenFailed,
    Disposed,
}

impl ToggleOutcome {
    pub fn succeeded(self) -> bool {
        matches!(self, Self::Started | Self::Paused | Self::Rewound)
    }
}

/// Consistent view of a session for one paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub current_time: f64,
    pub duration: f64,
}

impl PlaybackSnapshot {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Idle && self.current_time > 0.0
    }

    /// Played fraction in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.current_time / self.duration).clamp(0.0, 1.0)
    }
}

/// State written by the poller thread and read by the paint path.
struct Shared {
    state: AtomicU8,
    time_bits: AtomicU64,
    resource: Mutex<Option<Box<dyn PlaybackResource>>>,
}

impl Shared {
    fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PlaybackState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn time(&self) -> f64 {
        f64::from_bits(self.time_bits.load(Ordering::Acquire))
    }

    fn set_time(&self, secs: f64) {
        self.time_bits.store(secs.to_bits(), Ordering::Release);
    }

    fn resource(&self) -> MutexGuard<'_, Option<Box<dyn PlaybackResource>>> {
        self.resource.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Playback lifecycle of one player widget.
///
/// Mutations from the owner (toggle, dispose) happen only after the poller
/// has been cancelled and joined; while it runs, the poller is the only
/// writer of time and state.
pub struct PlaybackSession {
    path: PathBuf,
    duration: f64,
    timing: PlaybackTiming,
    opener: Arc<dyn ResourceOpener>,
    redraw: Arc<dyn RedrawSink>,
    shared: Arc<Shared>,
    poller: Option<Poller>,
    disposed: bool,
}

impl PlaybackSession {
    pub fn new(
        path: impl Into<PathBuf>,
        duration: f64,
        timing: PlaybackTiming,
        opener: Arc<dyn ResourceOpener>,
        redraw: Arc<dyn RedrawSink>,
    ) -> Self {
        Self {
            path: path.into(),
            duration: duration.max(0.0),
            timing,
            opener,
            redraw,
            shared: Arc::new(Shared {
                state: AtomicU8::new(PlaybackState::Idle as u8),
                time_bits: AtomicU64::new(0f64.to_bits()),
                resource: Mutex::new(None),
            }),
            poller: None,
            disposed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    pub fn current_time(&self) -> f64 {
        self.shared.time()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.shared.state(),
            current_time: self.shared.time(),
            duration: self.duration,
        }
    }

    pub fn is_resource_open(&self) -> bool {
        self.shared.resource().is_some()
    }

    pub fn is_poller_active(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_active)
    }

    fn near_end(&self, time: f64) -> bool {
        self.duration - time < self.timing.finish_tolerance
    }

    fn cancel_poller(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.cancel();
        }
    }

    /// Play when stopped, stop when playing.
    pub fn toggle(&mut self) -> ToggleOutcome {
        if self.disposed {
            debug!("toggle on disposed session for {}", self.path.display());
            return ToggleOutcome::Disposed;
        }

        if self.shared.state() == PlaybackState::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    fn pause(&mut self) -> ToggleOutcome {
        self.cancel_poller();

        let mut resource = self.shared.resource();
        let time = match resource.as_mut() {
            Some(r) => {
                r.stop();
                r.position_secs().min(self.duration)
            }
            None => self.shared.time(),
        };

        let outcome = if self.near_end(time) {
            resource.take();
            self.shared.set_time(0.0);
            ToggleOutcome::Rewound
        } else {
            self.shared.set_time(time);
            ToggleOutcome::Paused
        };
        drop(resource);

        self.shared.set_state(PlaybackState::Idle);
        self.redraw.request_redraw();
        debug!("{:?} {} at {:.2}s", outcome, self.path.display(), time);
        outcome
    }

    fn play(&mut self) -> ToggleOutcome {
        self.cancel_poller();

        let rewind = self.near_end(self.shared.time());
        let mut resource = self.shared.resource();
        let must_open = rewind || resource.is_none();

        if must_open && !self.path.exists() {
            warn!("voice clip is gone: {}", self.path.display());
            return ToggleOutcome::FileMissing;
        }

        // The old resource and time are only replaced once the open succeeded.
        if must_open {
            match self.opener.open(&self.path) {
                Ok(r) => *resource = Some(r),
                Err(PlaybackError::FileMissing(p)) => {
                    warn!("voice clip is gone: {}", p.display());
                    return ToggleOutcome::FileMissing;
                }
                Err(e) => {
                    warn!("cannot play {}: {e}", self.path.display());
                    return ToggleOutcome::OpenFailed;
                }
            }
        }
        if rewind {
            self.shared.set_time(0.0);
        }

        if let Some(r) = resource.as_mut() {
            r.start();
        }
        drop(resource);

        self.shared.set_state(PlaybackState::Playing);
        if let Err(e) = self.start_poller() {
            warn!("cannot track playback of {}: {e}", self.path.display());
        }
        self.redraw.request_redraw();
        info!("playing {}", self.path.display());
        ToggleOutcome::Started
    }

    fn start_poller(&mut self) -> Result<(), PlaybackError> {
        let shared = self.shared.clone();
        let redraw = self.redraw.clone();
        let duration = self.duration;
        let tolerance = self.timing.finish_tolerance;
        let grace = self.timing.grace_delay;

        let poller = Poller::spawn("voice-poller", self.timing.poll_period, move |ticker| {
            let time = {
                let mut resource = shared.resource();
                let Some(r) = resource.as_mut() else {
                    return ControlFlow::Break(());
                };
                let time = r.position_secs().min(duration);
                if duration - time < tolerance {
                    r.stop();
                }
                time
            };
            shared.set_time(time);

            if duration - time >= tolerance {
                redraw.request_redraw();
                return ControlFlow::Continue(());
            }

            shared.set_state(PlaybackState::Finished);
            redraw.request_redraw();

            // Keep the last frame on screen before letting go of the device.
            if ticker.wait(grace) {
                shared.resource().take();
                debug!("released playback resource after completion");
                redraw.request_redraw();
            }
            ControlFlow::Break(())
        })
        .map_err(PlaybackError::Spawn)?;

        self.poller = Some(poller);
        Ok(())
    }

    /// Stops everything and releases the resource. Further toggles do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_poller();
        if let Some(mut r) = self.shared.resource().take() {
            r.stop();
        }
        self.shared.set_state(PlaybackState::Idle);
        self.disposed = true;
        debug!("disposed session for {}", self.path.display());
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
