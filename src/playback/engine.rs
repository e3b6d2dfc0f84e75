use thiserror::Error;

use crate::library::TrackId;

/// Synchronous rejection from the engine, e.g. a play request it cannot honour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Asynchronous engine notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MetadataReady { duration_seconds: f64 },
    PositionChanged(f64),
    Started,
    Paused,
    Ended,
    Error(String),
}

/// An engine event tagged with the track it belongs to, so the controller
/// can drop results of a load that has since been superseded.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineMessage {
    pub track_id: TrackId,
    pub event: EngineEvent,
}

impl EngineMessage {
    pub fn new(track_id: TrackId, event: EngineEvent) -> Self {
        Self { track_id, event }
    }
}

/// Whatever actually makes sound.
///
/// Calls must not block; outcomes come back later as `EngineMessage`s,
/// delivered onto the same loop that drives the controller.
pub trait AudioEngine {
    /// Bind to `locator`, discarding whatever was loaded before.
    fn load(&mut self, track_id: &TrackId, locator: &str);
    fn play(&mut self) -> Result<(), EngineError>;
    fn pause(&mut self);
    fn set_position(&mut self, seconds: f64);
    /// `fraction` is in `[0, 1]`.
    fn set_volume(&mut self, fraction: f32);
}

impl<E: AudioEngine + ?Sized> AudioEngine for Box<E> {
    fn load(&mut self, track_id: &TrackId, locator: &str) {
        (**self).load(track_id, locator)
    }

    fn play(&mut self) -> Result<(), EngineError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn set_position(&mut self, seconds: f64) {
        (**self).set_position(seconds)
    }

    fn set_volume(&mut self, fraction: f32) {
        (**self).set_volume(fraction)
    }
}
