//! Commands sent from `RodioEngine` to its audio thread.

use std::path::PathBuf;

use crate::library::TrackId;

#[derive(Debug)]
pub(super) enum EngineCmd {
    /// Replace the current sink with a paused one for `path`.
    Load { track_id: TrackId, path: PathBuf },
    /// The locator could not be resolved to a file; report it from the thread
    /// so the failure arrives as an event like every other one.
    Reject { track_id: TrackId, detail: String },
    Play,
    Pause,
    /// Absolute position in seconds.
    Seek(f64),
    /// Linear gain in `[0, 1]`.
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}
