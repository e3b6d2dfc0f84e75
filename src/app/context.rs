//! `AppContext`: the one place components are wired together.
//!
//! The store and queue never touch storage. They emit change events; after
//! every operation the context drains those events and issues a single
//! `save()` when anything persisted changed. Volume and theme are saved
//! directly since they live here and in the controller.

use std::path::Path;
use std::sync::mpsc::Receiver;

use tracing::{debug, error, info, warn};

use crate::config::LibrarySettings;
use crate::error::{Error, Result};
use crate::events::Notifier;
use crate::library::{Playlist, PlaylistId, Track, ingest};
use crate::persist::{
    self, CURRENT_SCHEMA_VERSION, KeyValueStore, LoadOutcome, PersistedSettings, SETTINGS_KEY,
    ThemePreference,
};
use crate::playback::{
    AudioEngine, EngineMessage, EngineOutcome, PlaybackController, PlaybackNotice,
    PlaybackSession, PlaybackState,
};
use crate::queue::{Direction, QueueEvent, QueueModel, RepeatMode};
use crate::search::{self, SearchHit, SearchProvider, SearchSource};
use crate::store::{PlaylistStore, StoreEvent};

/// Application-level notifications that are not about playback itself.
#[derive(Debug, Clone, PartialEq)]
pub enum AppNotice {
    /// Durable save failed; the in-memory state is still in effect.
    SaveFailed(String),
}

pub struct AppContext<E: AudioEngine> {
    store: PlaylistStore,
    queue: QueueModel,
    playback: PlaybackController<E>,
    storage: Box<dyn KeyValueStore>,
    theme: ThemePreference,
    store_events: Receiver<StoreEvent>,
    queue_events: Receiver<QueueEvent>,
    notifier: Notifier<AppNotice>,
}

impl<E: AudioEngine> AppContext<E> {
    /// Restore persisted state from `storage` and assemble the components.
    ///
    /// `queue` is taken as given apart from its shuffle and repeat modes,
    /// which come from the persisted settings.
    pub fn open(
        engine: E,
        storage: Box<dyn KeyValueStore>,
        mut queue: QueueModel,
    ) -> (Self, LoadOutcome) {
        let blob = match storage.get(SETTINGS_KEY) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "could not read settings, starting fresh");
                None
            }
        };
        let (settings, outcome) = persist::decode(blob.as_deref());
        info!(
            ?outcome,
            playlists = settings.playlists.len(),
            "settings restored"
        );

        queue.set_shuffle(settings.shuffle_enabled);
        queue.set_repeat_mode(settings.repeat_mode);

        let mut store = PlaylistStore::from_playlists(settings.playlists);
        let store_events = store.subscribe();
        let queue_events = queue.subscribe();

        let mut ctx = Self {
            store,
            queue,
            playback: PlaybackController::new(engine, settings.volume_percent),
            storage,
            theme: settings.theme_preference,
            store_events,
            queue_events,
            notifier: Notifier::new(),
        };

        if let LoadOutcome::Migrated { from } = outcome {
            debug!(from, "rewriting migrated settings");
            let _ = ctx.save();
        }
        (ctx, outcome)
    }

    pub fn subscribe(&mut self) -> Receiver<AppNotice> {
        self.notifier.subscribe()
    }

    pub fn subscribe_playback(&mut self) -> Receiver<PlaybackNotice> {
        self.playback.subscribe()
    }

    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    pub fn queue(&self) -> &QueueModel {
        &self.queue
    }

    pub fn session(&self) -> &PlaybackSession {
        self.playback.session()
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.playback.engine_mut()
    }

    /// The durable view of the current state.
    pub fn snapshot(&self) -> PersistedSettings {
        PersistedSettings {
            schema_version: CURRENT_SCHEMA_VERSION,
            playlists: self.store.all().to_vec(),
            volume_percent: self.playback.session().volume_percent(),
            theme_preference: self.theme,
            repeat_mode: self.queue.repeat_mode(),
            shuffle_enabled: self.queue.shuffle_enabled(),
        }
    }

    /// Write the current state to storage.
    ///
    /// A failure is logged and reported as `AppNotice::SaveFailed`; nothing
    /// in memory is rolled back.
    pub fn save(&mut self) -> Result<()> {
        let result = persist::serialize(&self.snapshot())
            .and_then(|blob| self.storage.set(SETTINGS_KEY, &blob));
        if let Err(e) = &result {
            error!(error = %e, "failed to save settings");
            self.notifier.emit(AppNotice::SaveFailed(e.to_string()));
        }
        result
    }

    /// Drain pending change events and save once if any of them touched
    /// persisted state.
    fn autosave(&mut self) {
        let store_changed = self.store_events.try_iter().count() > 0;
        let queue_changed = self
            .queue_events
            .try_iter()
            .filter(|e| {
                matches!(
                    e,
                    QueueEvent::ShuffleChanged(_) | QueueEvent::RepeatChanged(_)
                )
            })
            .count()
            > 0;
        if store_changed || queue_changed {
            let _ = self.save();
        }
    }

    /// Run `op`, then autosave whether or not it succeeded; a failed
    /// operation leaves the components unchanged, so nothing is written.
    fn mutate<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = op(self);
        self.autosave();
        result
    }

    // Playlists

    pub fn create_playlist(&mut self, name: Option<&str>) -> Playlist {
        let playlist = self.store.create(name);
        self.autosave();
        playlist
    }

    pub fn delete_playlist(&mut self, id: &PlaylistId) -> bool {
        let removed = self.store.delete(id);
        self.autosave();
        removed
    }

    pub fn rename_playlist(&mut self, id: &PlaylistId, name: &str) -> Result<()> {
        self.mutate(|ctx| ctx.store.rename(id, name))
    }

    pub fn add_track(&mut self, id: &PlaylistId, track: Track) -> Result<()> {
        self.mutate(|ctx| ctx.store.add_track(id, track))
    }

    pub fn remove_track_at(&mut self, id: &PlaylistId, index: usize) -> Result<Track> {
        self.mutate(|ctx| ctx.store.remove_track_at(id, index))
    }

    /// Add every audio file found under `dir` to the playlist.
    pub fn import_directory(
        &mut self,
        id: &PlaylistId,
        dir: &Path,
        library: &LibrarySettings,
    ) -> Result<usize> {
        if self.store.get(id).is_none() {
            return Err(Error::playlist_not_found(id.as_str()));
        }
        if !dir.is_dir() {
            return Err(Error::NotFound {
                entity: "directory",
                id: dir.display().to_string(),
            });
        }
        let tracks = ingest::scan(dir, library);
        self.mutate(|ctx| ctx.store.add_tracks(id, tracks))
    }

    // Queue and playback

    /// Replace the queue with a copy of the playlist and start at `start`.
    pub fn play_playlist(&mut self, id: &PlaylistId, start: usize) -> Result<()> {
        let tracks = self
            .store
            .get(id)
            .ok_or_else(|| Error::playlist_not_found(id.as_str()))?
            .tracks()
            .to_vec();
        self.play_tracks(tracks, start)
    }

    /// Replace the queue with `tracks` (e.g. search results) and start at `start`.
    pub fn play_tracks(&mut self, tracks: Vec<Track>, start: usize) -> Result<()> {
        self.mutate(|ctx| {
            ctx.queue.load(tracks, start)?;
            ctx.play_current()
        })
    }

    fn play_current(&mut self) -> Result<()> {
        let track = self.queue.current().cloned().ok_or(Error::EmptyQueue)?;
        self.playback.load_track(track)?;
        self.playback.play()
    }

    pub fn enqueue(&mut self, track: Track) {
        self.queue.enqueue(track);
        self.autosave();
    }

    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        self.mutate(|ctx| {
            ctx.queue.jump_to(index)?;
            ctx.play_current()
        })
    }

    /// Toggle between playing and paused. With nothing loaded, start the
    /// queue from its cursor, or from the top if it never started.
    pub fn play_pause(&mut self) -> Result<()> {
        if self.playback.current_track().is_none() {
            if self.queue.is_empty() {
                return Err(Error::EmptyQueue);
            }
            if self.queue.cursor().is_none() {
                self.queue.jump_to(0)?;
            }
            return self.mutate(|ctx| ctx.play_current());
        }
        match self.playback.state() {
            PlaybackState::Playing => {
                self.playback.pause();
                Ok(())
            }
            _ => self.playback.play(),
        }
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn next(&mut self) -> Result<()> {
        self.skip(Direction::Next)
    }

    pub fn previous(&mut self) -> Result<()> {
        self.skip(Direction::Previous)
    }

    fn skip(&mut self, direction: Direction) -> Result<()> {
        self.mutate(|ctx| {
            ctx.queue.advance(direction)?;
            ctx.play_current()
        })
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn seek(&mut self, seconds: f64) -> Result<f64> {
        self.playback.seek(seconds)
    }

    pub fn seek_by(&mut self, delta_seconds: f64) -> Result<f64> {
        self.playback.seek_by(delta_seconds)
    }

    pub fn set_volume(&mut self, percent: i64) -> u8 {
        let applied = self.playback.set_volume(percent);
        let _ = self.save();
        applied
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.queue.set_shuffle(enabled);
        self.autosave();
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.queue.toggle_shuffle();
        self.autosave();
        enabled
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.queue.set_repeat_mode(mode);
        self.autosave();
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.queue.cycle_repeat_mode();
        self.autosave();
        mode
    }

    pub fn set_theme(&mut self, theme: ThemePreference) {
        self.theme = theme;
        let _ = self.save();
    }

    pub fn search(
        &self,
        source: SearchSource,
        query: &str,
        remote: &dyn SearchProvider,
    ) -> Result<Vec<SearchHit>> {
        search::perform_search(source, query, &self.store, remote)
    }

    /// Feed one engine message through the controller, filling in a newly
    /// learned duration everywhere the track is stored.
    pub fn handle_engine_message(&mut self, msg: EngineMessage) -> Result<()> {
        self.mutate(|ctx| {
            let outcome = ctx.playback.handle_engine_event(msg, &mut ctx.queue)?;
            if let EngineOutcome::DurationKnown { track_id, seconds } = outcome {
                let filled = ctx.store.fill_unknown_duration(&track_id, seconds);
                debug!(track = %track_id, seconds, filled, "duration learned");
            }
            Ok(())
        })
    }

    /// Forget all playlists, the queue and the current track, and remove
    /// the stored blob.
    pub fn clear_all(&mut self) -> Result<()> {
        self.playback.reset();
        self.queue.clear();
        self.store.clear();
        // Drop the resulting events: nothing should be rewritten now.
        self.store_events.try_iter().for_each(drop);
        self.queue_events.try_iter().for_each(drop);
        info!("all data cleared");
        self.storage.remove(SETTINGS_KEY)
    }
}
