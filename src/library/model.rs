use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Opaque, stable track identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique playlist identity within a `PlaylistStore`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlaylistId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlaylistId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A playable item. Immutable once built; identity is `id`.
///
/// `Track::new` rejects an empty id or locator. Deserialized tracks are taken
/// as stored, so a persisted track with a blank locator still loads and is
/// reported as unavailable when someone tries to play it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    id: TrackId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    source_locator: String,
    /// Seconds; 0 means unknown.
    #[serde(default)]
    duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cover_locator: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        source_locator: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        if id.as_str().trim().is_empty() {
            return Err(Error::InvalidArgument("track id must not be empty".into()));
        }
        let source_locator = source_locator.into();
        if source_locator.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "track {id} has no source locator"
            )));
        }
        Ok(Self {
            id,
            title: title.into(),
            artist: artist.into(),
            source_locator,
            duration_seconds: 0.0,
            cover_locator: None,
        })
    }

    /// Return a copy carrying `seconds` as its duration. Negative or
    /// non-finite values are treated as unknown.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = sanitize_seconds(seconds);
        self
    }

    pub fn with_cover(mut self, locator: impl Into<String>) -> Self {
        self.cover_locator = Some(locator.into());
        self
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn source_locator(&self) -> &str {
        &self.source_locator
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn has_known_duration(&self) -> bool {
        self.duration_seconds > 0.0
    }

    pub fn cover_locator(&self) -> Option<&str> {
        self.cover_locator.as_deref()
    }

    /// Text the local search matches against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }

    #[cfg(test)]
    pub(crate) fn unchecked(id: &str, title: &str, artist: &str, locator: &str) -> Self {
        Self {
            id: TrackId::from(id),
            title: title.to_string(),
            artist: artist.to_string(),
            source_locator: locator.to_string(),
            duration_seconds: 0.0,
            cover_locator: None,
        }
    }
}

pub(crate) fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// A named, ordered list of tracks. Duplicates by id are allowed.
///
/// Only `PlaylistStore` mutates playlists; everyone else gets shared
/// references or clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub(crate) id: PlaylistId,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) tracks: Vec<Track>,
    #[serde(default = "Utc::now")]
    pub(crate) created_at: DateTime<Utc>,
}

impl Playlist {
    pub(crate) fn new(id: PlaylistId, name: String) -> Self {
        Self {
            id,
            name,
            tracks: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &PlaylistId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total of the known track durations, in seconds.
    pub fn total_seconds(&self) -> f64 {
        self.tracks.iter().map(Track::duration_seconds).sum()
    }
}
