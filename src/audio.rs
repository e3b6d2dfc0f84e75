//! `rodio`-backed implementation of the `AudioEngine` boundary.
//!
//! The engine owns a dedicated audio thread. Calls on `RodioEngine` only
//! send commands; results come back as `EngineMessage`s through the
//! callback given to `RodioEngine::spawn`.

mod sink;
mod thread;
mod types;

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::warn;

use crate::config::AudioSettings;
use crate::library::TrackId;
use crate::playback::{AudioEngine, EngineError, EngineMessage};

pub(crate) use sink::resolve_locator;
use thread::spawn_audio_thread;
use types::EngineCmd;

pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    join: Option<JoinHandle<()>>,
}

impl RodioEngine {
    /// Start the audio thread. `on_event` runs on that thread.
    pub fn spawn<F>(audio_settings: AudioSettings, on_event: F) -> Self
    where
        F: Fn(EngineMessage) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let join = spawn_audio_thread(rx, Box::new(on_event), audio_settings);
        Self {
            tx,
            join: Some(join),
        }
    }

    fn send(&self, cmd: EngineCmd) -> Result<(), EngineError> {
        self.tx
            .send(cmd)
            .map_err(|_| EngineError("audio thread is not running".into()))
    }

    /// Fade out over `fade_out` and wait for the audio thread to finish.
    pub fn quit_softly(&mut self, fade_out: Duration) {
        let _ = self.send(EngineCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, track_id: &TrackId, locator: &str) {
        let cmd = match resolve_locator(locator) {
            Ok(path) => EngineCmd::Load {
                track_id: track_id.clone(),
                path,
            },
            Err(detail) => EngineCmd::Reject {
                track_id: track_id.clone(),
                detail,
            },
        };
        if let Err(e) = self.send(cmd) {
            warn!(track = %track_id, error = %e, "load not delivered");
        }
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.send(EngineCmd::Play)
    }

    fn pause(&mut self) {
        let _ = self.send(EngineCmd::Pause);
    }

    fn set_position(&mut self, seconds: f64) {
        let _ = self.send(EngineCmd::Seek(seconds));
    }

    fn set_volume(&mut self, fraction: f32) {
        let _ = self.send(EngineCmd::SetVolume(fraction));
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.quit_softly(Duration::ZERO);
        }
    }
}
