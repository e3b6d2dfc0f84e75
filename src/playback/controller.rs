use std::sync::mpsc::Receiver;

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::events::Notifier;
use crate::library::{Track, TrackId, sanitize_seconds};
use crate::queue::{Direction, NextAction, QueueModel};

use super::engine::{AudioEngine, EngineEvent, EngineMessage};
use super::{PlaybackSession, PlaybackState};

/// Notifications for whoever renders the session.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackNotice {
    StateChanged(PlaybackState),
    TrackChanged(TrackId),
    Position { position: f64, duration: f64 },
    VolumeChanged(u8),
    /// A failure the engine reported on its own, or one hit while
    /// auto-advancing. Failures of a direct call are returned to the caller
    /// instead, so each is reported once.
    Failed(String),
}

/// Result of feeding one engine message to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// The message belonged to a track that is no longer current.
    Stale,
    Applied,
    /// The engine reported the duration of the current track.
    DurationKnown { track_id: TrackId, seconds: f64 },
}

pub struct PlaybackController<E: AudioEngine> {
    engine: E,
    session: PlaybackSession,
    notifier: Notifier<PlaybackNotice>,
}

impl<E: AudioEngine> PlaybackController<E> {
    pub fn new(mut engine: E, volume_percent: u8) -> Self {
        let volume_percent = volume_percent.min(100);
        engine.set_volume(f32::from(volume_percent) / 100.0);
        Self {
            engine,
            session: PlaybackSession {
                volume_percent,
                ..PlaybackSession::default()
            },
            notifier: Notifier::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<PlaybackNotice> {
        self.notifier.subscribe()
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.current_track.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Bind the engine to `track` and enter `loading`.
    ///
    /// A track without a locator puts the session in `error` instead.
    pub fn load_track(&mut self, track: Track) -> Result<()> {
        let id = track.id().clone();
        self.session.position_seconds = 0.0;
        self.session.duration_seconds = track.duration_seconds();
        let locator = track.source_locator().trim().to_string();
        self.session.current_track = Some(track);
        self.notifier.emit(PlaybackNotice::TrackChanged(id.clone()));

        if locator.is_empty() {
            let err = Error::TrackUnavailable(id.to_string());
            self.fail(&err.to_string());
            return Err(err);
        }

        info!(track = %id, "loading track");
        self.set_state(PlaybackState::Loading);
        self.engine.load(&id, &locator);
        Ok(())
    }

    /// Start or resume playback.
    ///
    /// From `idle` or `error` the current track is reloaded first, so a user
    /// can retry after a failure or replay a finished queue.
    pub fn play(&mut self) -> Result<()> {
        match self.session.state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Loading | PlaybackState::Paused | PlaybackState::Ended => {
                self.start_engine()
            }
            PlaybackState::Idle | PlaybackState::Error => {
                let Some(track) = self.session.current_track.clone() else {
                    return Err(Error::TrackUnavailable("no track loaded".into()));
                };
                self.load_track(track)?;
                self.start_engine()
            }
        }
    }

    fn start_engine(&mut self) -> Result<()> {
        match self.engine.play() {
            Ok(()) => {
                self.set_state(PlaybackState::Playing);
                Ok(())
            }
            Err(e) => {
                self.fail(&e.0);
                Err(Error::PlaybackFailed(e.0))
            }
        }
    }

    /// `playing -> paused`; anything else is a no-op.
    pub fn pause(&mut self) {
        if self.session.state == PlaybackState::Playing {
            self.engine.pause();
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Pause and rewind to the start, keeping the current track.
    pub fn stop(&mut self) {
        if self.session.current_track.is_none() {
            return;
        }
        if self.session.state != PlaybackState::Error {
            self.engine.pause();
            self.engine.set_position(0.0);
        }
        self.session.position_seconds = 0.0;
        self.emit_position();
        self.set_state(PlaybackState::Idle);
    }

    /// Move to `seconds`, clamped to the track. Returns the position applied.
    ///
    /// The upper bound only applies once the duration is known.
    pub fn seek(&mut self, seconds: f64) -> Result<f64> {
        if self.session.state == PlaybackState::Error {
            return Err(Error::InvalidState {
                op: "seek",
                state: self.session.state,
            });
        }
        let mut target = sanitize_seconds(seconds);
        if self.session.duration_seconds > 0.0 {
            target = target.min(self.session.duration_seconds);
        }
        debug!(requested = seconds, target, "seek");
        self.session.position_seconds = target;
        self.engine.set_position(target);
        self.emit_position();
        Ok(target)
    }

    /// Relative seek, as used by the forward/back controls.
    pub fn seek_by(&mut self, delta_seconds: f64) -> Result<f64> {
        self.seek(self.session.position_seconds + delta_seconds)
    }

    /// Set the volume, clamped to `[0, 100]`. Returns the applied value.
    pub fn set_volume(&mut self, percent: i64) -> u8 {
        let percent = percent.clamp(0, 100) as u8;
        self.session.volume_percent = percent;
        self.engine.set_volume(f32::from(percent) / 100.0);
        self.notifier.emit(PlaybackNotice::VolumeChanged(percent));
        percent
    }

    /// Forget the current track entirely.
    pub fn reset(&mut self) {
        if self.session.current_track.is_some() {
            self.stop();
        }
        self.session.current_track = None;
        self.session.duration_seconds = 0.0;
    }

    /// Apply one engine message.
    ///
    /// `queue` is consulted when the current track ends. Errors returned here
    /// come from starting the follow-up track and have already been reported
    /// through `PlaybackNotice::Failed`.
    pub fn handle_engine_event(
        &mut self,
        msg: EngineMessage,
        queue: &mut QueueModel,
    ) -> Result<EngineOutcome> {
        let is_current = self
            .session
            .current_track
            .as_ref()
            .is_some_and(|t| t.id() == &msg.track_id);
        if !is_current {
            debug!(track = %msg.track_id, event = ?msg.event, "dropping stale engine event");
            return Ok(EngineOutcome::Stale);
        }

        match msg.event {
            EngineEvent::MetadataReady { duration_seconds } => {
                let seconds = sanitize_seconds(duration_seconds);
                if seconds <= 0.0 {
                    return Ok(EngineOutcome::Applied);
                }
                self.session.duration_seconds = seconds;
                if let Some(track) = self.session.current_track.as_mut() {
                    if !track.has_known_duration() {
                        *track = track.clone().with_duration(seconds);
                    }
                }
                queue.update_duration(&msg.track_id, seconds);
                self.emit_position();
                Ok(EngineOutcome::DurationKnown {
                    track_id: msg.track_id,
                    seconds,
                })
            }
            EngineEvent::PositionChanged(seconds) => {
                if matches!(
                    self.session.state,
                    PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Loading
                ) {
                    let mut position = sanitize_seconds(seconds);
                    if self.session.duration_seconds > 0.0 {
                        position = position.min(self.session.duration_seconds);
                    }
                    self.session.position_seconds = position;
                    self.emit_position();
                }
                Ok(EngineOutcome::Applied)
            }
            EngineEvent::Started => {
                if matches!(
                    self.session.state,
                    PlaybackState::Loading | PlaybackState::Paused
                ) {
                    self.set_state(PlaybackState::Playing);
                }
                Ok(EngineOutcome::Applied)
            }
            EngineEvent::Paused => {
                if self.session.state == PlaybackState::Playing {
                    self.set_state(PlaybackState::Paused);
                }
                Ok(EngineOutcome::Applied)
            }
            EngineEvent::Ended => {
                // The engine may report the end before it has seen a pause or
                // stop sent after it.
                if self.session.state != PlaybackState::Playing {
                    debug!(state = %self.session.state, "ignoring end of track");
                    return Ok(EngineOutcome::Applied);
                }
                self.session.position_seconds = self.session.duration_seconds;
                self.set_state(PlaybackState::Ended);
                if let Err(e) = self.on_ended(queue) {
                    self.notifier.emit(PlaybackNotice::Failed(e.to_string()));
                    return Err(e);
                }
                Ok(EngineOutcome::Applied)
            }
            EngineEvent::Error(detail) => {
                self.fail(&detail);
                self.notifier.emit(PlaybackNotice::Failed(detail));
                Ok(EngineOutcome::Applied)
            }
        }
    }

    fn on_ended(&mut self, queue: &mut QueueModel) -> Result<()> {
        let action = queue.on_track_ended();
        debug!(?action, "track ended");
        match action {
            NextAction::RepeatSameTrack => {
                self.seek(0.0)?;
                self.play()
            }
            NextAction::AdvanceToNext => {
                let next = queue.advance(Direction::Next)?.clone();
                self.load_track(next)?;
                self.play()
            }
            NextAction::Stop => {
                self.set_state(PlaybackState::Idle);
                Ok(())
            }
        }
    }

    fn fail(&mut self, detail: &str) {
        error!(%detail, "playback failed");
        self.set_state(PlaybackState::Error);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.session.state == state {
            return;
        }
        debug!(from = %self.session.state, to = %state, "playback state");
        self.session.state = state;
        self.notifier.emit(PlaybackNotice::StateChanged(state));
    }

    fn emit_position(&mut self) {
        self.notifier.emit(PlaybackNotice::Position {
            position: self.session.position_seconds,
            duration: self.session.duration_seconds,
        });
    }
}
