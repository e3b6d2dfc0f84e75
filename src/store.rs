//! The playlist collection.
//!
//! `PlaylistStore` owns every `Playlist` and is the only place they change.
//! It knows nothing about storage: each successful mutation emits a
//! `StoreEvent`, and the orchestrating `AppContext` persists in response.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::Notifier;
use crate::library::{Playlist, PlaylistId, Track, TrackId};

/// Change notifications emitted by `PlaylistStore`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Created(PlaylistId),
    Deleted(PlaylistId),
    Renamed(PlaylistId),
    TracksChanged(PlaylistId),
    Cleared,
}

#[derive(Debug, Default)]
pub struct PlaylistStore {
    playlists: Vec<Playlist>,
    notifier: Notifier<StoreEvent>,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously persisted playlists.
    ///
    /// Later entries reusing an id already seen are dropped so ids stay unique.
    pub fn from_playlists(playlists: Vec<Playlist>) -> Self {
        let mut kept: Vec<Playlist> = Vec::with_capacity(playlists.len());
        for p in playlists {
            if kept.iter().any(|k| k.id == p.id) {
                warn!(playlist = %p.id, "dropping playlist with duplicate id");
                continue;
            }
            kept.push(p);
        }
        Self {
            playlists: kept,
            notifier: Notifier::new(),
        }
    }

    pub fn subscribe(&mut self) -> std::sync::mpsc::Receiver<StoreEvent> {
        self.notifier.subscribe()
    }

    /// Create a playlist and append it to the store.
    ///
    /// A missing or blank name becomes `Playlist <n>`, `n` being the count
    /// after insertion.
    pub fn create(&mut self, name: Option<&str>) -> Playlist {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => format!("Playlist {}", self.playlists.len() + 1),
        };

        let mut id = PlaylistId::generate();
        while self.index_of(&id).is_some() {
            id = PlaylistId::generate();
        }

        let playlist = Playlist::new(id.clone(), name);
        info!(playlist = %id, name = %playlist.name, "playlist created");
        self.playlists.push(playlist.clone());
        self.notifier.emit(StoreEvent::Created(id));
        playlist
    }

    /// Remove a playlist. Returns whether anything was removed; absent ids
    /// are not an error.
    pub fn delete(&mut self, id: &PlaylistId) -> bool {
        let Some(pos) = self.index_of(id) else {
            debug!(playlist = %id, "delete of unknown playlist ignored");
            return false;
        };
        self.playlists.remove(pos);
        info!(playlist = %id, "playlist deleted");
        self.notifier.emit(StoreEvent::Deleted(id.clone()));
        true
    }

    pub fn rename(&mut self, id: &PlaylistId, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(Error::InvalidArgument(
                "playlist name must not be empty".into(),
            ));
        }
        let playlist = self.get_mut(id)?;
        playlist.name = new_name.to_string();
        self.notifier.emit(StoreEvent::Renamed(id.clone()));
        Ok(())
    }

    pub fn add_track(&mut self, id: &PlaylistId, track: Track) -> Result<()> {
        let playlist = self.get_mut(id)?;
        debug!(playlist = %id, track = %track.id(), "adding track");
        playlist.tracks.push(track);
        self.notifier.emit(StoreEvent::TracksChanged(id.clone()));
        Ok(())
    }

    /// Append several tracks with a single change notification.
    pub fn add_tracks(&mut self, id: &PlaylistId, tracks: Vec<Track>) -> Result<usize> {
        let playlist = self.get_mut(id)?;
        let added = tracks.len();
        playlist.tracks.extend(tracks);
        if added > 0 {
            self.notifier.emit(StoreEvent::TracksChanged(id.clone()));
        }
        Ok(added)
    }

    /// Remove the track at `index`, returning it.
    pub fn remove_track_at(&mut self, id: &PlaylistId, index: usize) -> Result<Track> {
        let playlist = self.get_mut(id)?;
        let len = playlist.tracks.len();
        if index >= len {
            return Err(Error::InvalidIndex { index, len });
        }
        let removed = playlist.tracks.remove(index);
        self.notifier.emit(StoreEvent::TracksChanged(id.clone()));
        Ok(removed)
    }

    /// Fill in the duration of every copy of `track_id` whose duration is
    /// still unknown. Returns how many copies were updated.
    pub fn fill_unknown_duration(&mut self, track_id: &TrackId, seconds: f64) -> usize {
        if !(seconds.is_finite() && seconds > 0.0) {
            return 0;
        }
        let mut changed: Vec<PlaylistId> = Vec::new();
        let mut updated = 0;
        for playlist in &mut self.playlists {
            let before = updated;
            for track in &mut playlist.tracks {
                if track.id() == track_id && !track.has_known_duration() {
                    *track = track.clone().with_duration(seconds);
                    updated += 1;
                }
            }
            if updated > before {
                changed.push(playlist.id.clone());
            }
        }
        for id in changed {
            self.notifier.emit(StoreEvent::TracksChanged(id));
        }
        updated
    }

    /// Drop every playlist.
    pub fn clear(&mut self) {
        self.playlists.clear();
        self.notifier.emit(StoreEvent::Cleared);
    }

    pub fn get(&self, id: &PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| &p.id == id)
    }

    /// All playlists in insertion order.
    pub fn all(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    /// Find a playlist by exact id, else by 1-based position.
    pub fn resolve(&self, selector: &str) -> Option<&Playlist> {
        let selector = selector.trim();
        if let Some(p) = self.playlists.iter().find(|p| p.id.as_str() == selector) {
            return Some(p);
        }
        selector
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.playlists.get(i))
    }

    fn index_of(&self, id: &PlaylistId) -> Option<usize> {
        self.playlists.iter().position(|p| &p.id == id)
    }

    fn get_mut(&mut self, id: &PlaylistId) -> Result<&mut Playlist> {
        self.playlists
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| Error::playlist_not_found(id.as_str()))
    }
}
