//! Playback state machine and the engine boundary it drives.
//!
//! States: `idle -> loading -> playing <-> paused`, `playing/loading -> error`,
//! `playing -> ended -> (loading | idle)`.

mod controller;
mod engine;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use crate::library::Track;
use crate::persist::DEFAULT_VOLUME_PERCENT;

pub use controller::{EngineOutcome, PlaybackController, PlaybackNotice};
pub use engine::{AudioEngine, EngineError, EngineEvent, EngineMessage};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Error,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Ended => "ended",
            PlaybackState::Error => "error",
        })
    }
}

/// What is playing right now. Owned by `PlaybackController`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub(crate) current_track: Option<Track>,
    pub(crate) state: PlaybackState,
    pub(crate) position_seconds: f64,
    pub(crate) duration_seconds: f64,
    pub(crate) volume_percent: u8,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current_track: None,
            state: PlaybackState::Idle,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume_percent: DEFAULT_VOLUME_PERCENT,
        }
    }
}

impl PlaybackSession {
    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    /// 0 while unknown.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn volume_percent(&self) -> u8 {
        self.volume_percent
    }

    /// Progress through the current track in `[0, 1]`, 0 when the duration
    /// is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
