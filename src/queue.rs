//! The active playback queue.
//!
//! `QueueModel` holds its own copy of the tracks it was loaded with, so
//! later edits to the source playlist never reach a queue that is already
//! playing. It decides what comes next; it never talks to the engine.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ShufflePolicySetting;
use crate::error::{Error, Result};
use crate::events::Notifier;
use crate::library::{Track, TrackId};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    /// off -> one -> all -> off
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        })
    }
}

impl FromStr for RepeatMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(RepeatMode::Off),
            "one" | "track" => Ok(RepeatMode::One),
            "all" | "queue" => Ok(RepeatMode::All),
            other => Err(Error::InvalidArgument(format!(
                "unknown repeat mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// What the controller should do when the current track finishes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NextAction {
    RepeatSameTrack,
    AdvanceToNext,
    Stop,
}

/// How `advance(Next)` picks an index while shuffle is on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ShufflePolicy {
    /// Any index, the current one included.
    #[default]
    Uniform,
    /// Any index except the current one, when there is a choice.
    AvoidRepeat,
}

impl From<ShufflePolicySetting> for ShufflePolicy {
    fn from(s: ShufflePolicySetting) -> Self {
        match s {
            ShufflePolicySetting::Uniform => ShufflePolicy::Uniform,
            ShufflePolicySetting::AvoidRepeat => ShufflePolicy::AvoidRepeat,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Loaded { len: usize, start: usize },
    Enqueued { len: usize },
    CursorMoved(usize),
    ShuffleChanged(bool),
    RepeatChanged(RepeatMode),
    Cleared,
}

#[derive(Debug)]
pub struct QueueModel {
    tracks: Vec<Track>,
    cursor: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    policy: ShufflePolicy,
    rng: StdRng,
    notifier: Notifier<QueueEvent>,
}

impl Default for QueueModel {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl QueueModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic shuffle, for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            cursor: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            policy: ShufflePolicy::Uniform,
            rng,
            notifier: Notifier::new(),
        }
    }

    pub fn subscribe(&mut self) -> std::sync::mpsc::Receiver<QueueEvent> {
        self.notifier.subscribe()
    }

    /// Replace the queue with `tracks`, positioned at `start`.
    ///
    /// On error the previous queue is left untouched.
    pub fn load(&mut self, tracks: Vec<Track>, start: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(Error::EmptyQueue);
        }
        if start >= tracks.len() {
            return Err(Error::InvalidIndex {
                index: start,
                len: tracks.len(),
            });
        }
        let len = tracks.len();
        self.tracks = tracks;
        self.cursor = Some(start);
        info!(len, start, "queue loaded");
        self.notifier.emit(QueueEvent::Loaded { len, start });
        Ok(())
    }

    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.tracks.get(i))
    }

    /// Move the cursor and return the track now under it.
    ///
    /// `Previous` always steps back by one and wraps; only `Next` is
    /// randomized under shuffle.
    pub fn advance(&mut self, direction: Direction) -> Result<&Track> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(Error::EmptyQueue);
        }

        let next = match (direction, self.cursor) {
            (Direction::Previous, Some(i)) if i > 0 => i - 1,
            (Direction::Previous, _) => len - 1,
            (Direction::Next, cursor) if self.shuffle => self.pick_shuffled(cursor),
            (Direction::Next, Some(i)) => (i + 1) % len,
            (Direction::Next, None) => 0,
        };

        debug!(?direction, from = ?self.cursor, to = next, "queue advance");
        self.cursor = Some(next);
        self.notifier.emit(QueueEvent::CursorMoved(next));
        Ok(&self.tracks[next])
    }

    fn pick_shuffled(&mut self, cursor: Option<usize>) -> usize {
        let len = self.tracks.len();
        match (self.policy, cursor) {
            (ShufflePolicy::AvoidRepeat, Some(current)) if len > 1 => {
                // Draw from the other len - 1 slots and skip over `current`.
                let pick = self.rng.random_range(0..len - 1);
                if pick >= current { pick + 1 } else { pick }
            }
            _ => self.rng.random_range(0..len),
        }
    }

    /// Move the cursor straight to `index`.
    pub fn jump_to(&mut self, index: usize) -> Result<&Track> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(Error::EmptyQueue);
        }
        if index >= len {
            return Err(Error::InvalidIndex { index, len });
        }
        self.cursor = Some(index);
        self.notifier.emit(QueueEvent::CursorMoved(index));
        Ok(&self.tracks[index])
    }

    /// Append a track to the end of the queue. The cursor does not move.
    pub fn enqueue(&mut self, track: Track) {
        debug!(track = %track.id(), "enqueue");
        self.tracks.push(track);
        self.notifier.emit(QueueEvent::Enqueued {
            len: self.tracks.len(),
        });
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.cursor = None;
        self.notifier.emit(QueueEvent::Cleared);
    }

    /// Resolve a finished track. Repeat-one wins over everything, repeat-all
    /// always continues, and off stops only at the last index.
    pub fn on_track_ended(&self) -> NextAction {
        match self.repeat {
            RepeatMode::One => NextAction::RepeatSameTrack,
            RepeatMode::All if !self.tracks.is_empty() => NextAction::AdvanceToNext,
            RepeatMode::All => NextAction::Stop,
            RepeatMode::Off => match self.cursor {
                Some(i) if i + 1 < self.tracks.len() => NextAction::AdvanceToNext,
                _ => NextAction::Stop,
            },
        }
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
        debug!(enabled, "shuffle set");
        self.notifier.emit(QueueEvent::ShuffleChanged(enabled));
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.set_shuffle(!self.shuffle);
        self.shuffle
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
        debug!(%mode, "repeat mode set");
        self.notifier.emit(QueueEvent::RepeatChanged(mode));
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.set_repeat_mode(self.repeat.cycled());
        self.repeat
    }

    pub fn set_policy(&mut self, policy: ShufflePolicy) {
        self.policy = policy;
    }

    /// Fill unknown durations of `track_id` in the queue's copy.
    pub fn update_duration(&mut self, track_id: &TrackId, seconds: f64) -> usize {
        let mut updated = 0;
        for track in &mut self.tracks {
            if track.id() == track_id && !track.has_known_duration() {
                *track = track.clone().with_duration(seconds);
                if track.has_known_duration() {
                    updated += 1;
                }
            }
        }
        updated
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn policy(&self) -> ShufflePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests;
