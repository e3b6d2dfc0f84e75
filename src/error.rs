//! Crate-wide error type.
//!
//! Validation errors (`InvalidIndex`, `InvalidArgument`, `NotFound`) go back
//! to the immediate caller. Engine failures move the playback state machine
//! to `error` and are reported once. `PersistenceCorrupt` never escapes
//! `persist::deserialize`.

use thiserror::Error;

use crate::playback::PlaybackState;

#[derive(Debug, Error)]
pub enum Error {
    /// The active queue has no tracks.
    #[error("queue is empty")]
    EmptyQueue,

    /// A positional argument is outside the target sequence.
    #[error("index {index} out of range (length {len})")]
    InvalidIndex { index: usize, len: usize },

    /// Playlist or track lookup miss.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The track has no usable source locator.
    #[error("track unavailable: {0}")]
    TrackUnavailable(String),

    /// The audio engine rejected a play request.
    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    #[error("cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: PlaybackState,
    },

    #[error("persisted data is corrupt: {0}")]
    PersistenceCorrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn playlist_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "playlist",
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
