//! A recording engine for controller and orchestrator tests.

use crate::library::TrackId;

use super::engine::{AudioEngine, EngineError, EngineEvent, EngineMessage};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineCall {
    Load { track_id: TrackId, locator: String },
    Play,
    Pause,
    SetPosition(f64),
    SetVolume(f32),
}

#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    pub(crate) calls: Vec<EngineCall>,
    /// When set, `play` is rejected with this detail.
    pub(crate) reject_play: Option<String>,
    pub(crate) loaded: Option<TrackId>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }

    /// Build a message for whatever is currently loaded.
    pub(crate) fn message(&self, event: EngineEvent) -> EngineMessage {
        let id = self.loaded.clone().unwrap_or_else(|| TrackId::from("none"));
        EngineMessage::new(id, event)
    }
}

impl AudioEngine for FakeEngine {
    fn load(&mut self, track_id: &TrackId, locator: &str) {
        self.loaded = Some(track_id.clone());
        self.calls.push(EngineCall::Load {
            track_id: track_id.clone(),
            locator: locator.to_string(),
        });
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.calls.push(EngineCall::Play);
        match &self.reject_play {
            Some(detail) => Err(EngineError(detail.clone())),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
    }

    fn set_position(&mut self, seconds: f64) {
        self.calls.push(EngineCall::SetPosition(seconds));
    }

    fn set_volume(&mut self, fraction: f32) {
        self.calls.push(EngineCall::SetVolume(fraction));
    }
}
