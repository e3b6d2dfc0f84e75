use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::*;
use crate::config::LibrarySettings;
use crate::error::{Error, Result};
use crate::library::{PlaylistId, Track, TrackId};
use crate::persist::{self, KeyValueStore, LoadOutcome, SETTINGS_KEY, ThemePreference};
use crate::playback::testing::{EngineCall, FakeEngine};
use crate::playback::{EngineEvent, EngineMessage, PlaybackState};
use crate::queue::{QueueModel, RepeatMode};
use crate::search::{SearchSource, UnavailableProvider};

/// Storage the test keeps a handle to after handing a clone to the context.
#[derive(Clone, Default)]
struct SharedStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl SharedStore {
    fn blob(&self) -> Option<String> {
        self.entries.borrow().get(SETTINGS_KEY).cloned()
    }

    fn saved(&self) -> persist::PersistedSettings {
        persist::deserialize(self.blob().as_deref())
    }

    fn with_blob(blob: &str) -> Self {
        let s = Self::default();
        s.entries
            .borrow_mut()
            .insert(SETTINGS_KEY.to_string(), blob.to_string());
        s
    }
}

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.writes.set(self.writes.get() + 1);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

fn open(storage: &SharedStore) -> (AppContext<FakeEngine>, LoadOutcome) {
    AppContext::open(
        FakeEngine::new(),
        Box::new(storage.clone()),
        QueueModel::with_seed(11),
    )
}

fn track(id: &str) -> Track {
    Track::new(id, format!("Song {id}"), "Band", format!("/m/{id}.mp3")).unwrap()
}

fn app_with_playlist(storage: &SharedStore, n: usize) -> (AppContext<FakeEngine>, PlaylistId) {
    let (mut app, _) = open(storage);
    let p = app.create_playlist(Some("Mix"));
    for i in 0..n {
        app.add_track(p.id(), track(&format!("t{i}"))).unwrap();
    }
    (app, p.id().clone())
}

#[test]
fn fresh_storage_starts_with_defaults() {
    let storage = SharedStore::default();
    let (app, outcome) = open(&storage);
    assert_eq!(outcome, LoadOutcome::Missing);
    assert!(app.store().is_empty());
    assert_eq!(app.session().volume_percent(), 70);
    assert_eq!(app.theme(), ThemePreference::Auto);
    assert_eq!(app.queue().repeat_mode(), RepeatMode::Off);
    assert_eq!(storage.writes.get(), 0);
}

#[test]
fn every_successful_mutation_saves_once() {
    let storage = SharedStore::default();
    let (mut app, _) = open(&storage);

    let p = app.create_playlist(None);
    assert_eq!(storage.writes.get(), 1);
    app.add_track(p.id(), track("a")).unwrap();
    assert_eq!(storage.writes.get(), 2);
    app.rename_playlist(p.id(), "Gym").unwrap();
    assert_eq!(storage.writes.get(), 3);

    assert!(app.rename_playlist(p.id(), " ").is_err());
    assert!(app.remove_track_at(p.id(), 9).is_err());
    assert!(!app.delete_playlist(&PlaylistId::from("ghost")));
    assert_eq!(storage.writes.get(), 3);

    let saved = storage.saved();
    assert_eq!(saved.playlists.len(), 1);
    assert_eq!(saved.playlists[0].name(), "Gym");
    assert_eq!(saved.playlists[0].tracks()[0].id().as_str(), "a");
}

#[test]
fn state_survives_a_reopen() {
    let storage = SharedStore::default();
    {
        let (mut app, _) = app_with_playlist(&storage, 2);
        app.set_volume(35);
        app.set_theme(ThemePreference::Dark);
        app.set_repeat_mode(RepeatMode::All);
        app.toggle_shuffle();
    }

    let (app, outcome) = open(&storage);
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(app.store().len(), 1);
    assert_eq!(app.store().all()[0].len(), 2);
    assert_eq!(app.session().volume_percent(), 35);
    assert_eq!(app.theme(), ThemePreference::Dark);
    assert_eq!(app.queue().repeat_mode(), RepeatMode::All);
    assert!(app.queue().shuffle_enabled());
}

#[test]
fn failed_save_keeps_memory_authoritative_and_reports_once_per_save() {
    let storage = SharedStore::default();
    let (mut app, _) = open(&storage);
    let notices = app.subscribe();

    storage.fail_writes.set(true);
    let p = app.create_playlist(Some("Unsaved"));
    app.toggle_shuffle();

    assert_eq!(app.store().len(), 1);
    assert!(app.queue().shuffle_enabled());
    let failures: Vec<AppNotice> = notices.try_iter().collect();
    assert_eq!(failures.len(), 2);
    assert!(matches!(&failures[0], AppNotice::SaveFailed(msg) if msg.contains("disk full")));
    assert!(storage.blob().is_none());

    storage.fail_writes.set(false);
    app.set_repeat_mode(RepeatMode::One);
    let saved = storage.saved();
    assert_eq!(saved.playlists[0].id(), p.id());
    assert!(saved.shuffle_enabled);
    assert_eq!(saved.repeat_mode, RepeatMode::One);
}

#[test]
fn save_reports_the_error_to_the_caller() {
    let storage = SharedStore::default();
    let (mut app, _) = open(&storage);
    storage.fail_writes.set(true);
    assert!(matches!(app.save(), Err(Error::Io(_))));
}

#[test]
fn repeat_and_shuffle_are_mirrored_after_each_save() {
    let storage = SharedStore::default();
    let (mut app, _) = open(&storage);
    for _ in 0..4 {
        let mode = app.cycle_repeat_mode();
        let enabled = app.toggle_shuffle();
        let saved = storage.saved();
        assert_eq!(saved.repeat_mode, mode);
        assert_eq!(saved.shuffle_enabled, enabled);
        assert_eq!(saved.repeat_mode, app.queue().repeat_mode());
    }
}

#[test]
fn corrupt_storage_does_not_prevent_startup() {
    let storage = SharedStore::with_blob("{ definitely not json");
    let (mut app, outcome) = open(&storage);
    assert_eq!(outcome, LoadOutcome::Corrupt);
    assert!(app.store().is_empty());

    app.create_playlist(None);
    assert_eq!(storage.saved().playlists.len(), 1);
}

#[test]
fn migrated_settings_are_rewritten_in_the_current_schema() {
    let storage = SharedStore::with_blob(r#"{"playlists":[],"volume":40,"theme":"dark"}"#);
    let (app, outcome) = open(&storage);
    assert_eq!(outcome, LoadOutcome::Migrated { from: 0 });
    assert_eq!(app.session().volume_percent(), 40);

    let blob: serde_json::Value = serde_json::from_str(&storage.blob().unwrap()).unwrap();
    assert_eq!(blob["schemaVersion"], 1);
    assert_eq!(blob["volumePercent"], 40);
    assert_eq!(blob["themePreference"], "dark");
}

#[test]
fn playing_a_playlist_snapshots_its_tracks() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 3);

    app.play_playlist(&pid, 1).unwrap();
    assert_eq!(app.session().state(), PlaybackState::Playing);
    assert_eq!(app.session().current_track().unwrap().id().as_str(), "t1");

    app.add_track(&pid, track("late")).unwrap();
    assert_eq!(app.queue().len(), 3);
    assert_eq!(app.store().get(&pid).unwrap().len(), 4);
}

#[test]
fn playing_an_empty_playlist_reports_empty_queue() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 0);
    assert!(matches!(app.play_playlist(&pid, 0), Err(Error::EmptyQueue)));
    assert!(matches!(
        app.play_playlist(&PlaylistId::from("nope"), 0),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn end_of_queue_stops_and_keeps_the_last_track() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 3);
    app.play_playlist(&pid, 2).unwrap();

    let ended = app.engine_mut().message(EngineEvent::Ended);
    app.handle_engine_message(ended).unwrap();

    assert_eq!(app.session().state(), PlaybackState::Idle);
    assert_eq!(app.session().current_track().unwrap().id().as_str(), "t2");
}

#[test]
fn end_queued_before_a_stop_does_not_advance() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 3);
    app.play_playlist(&pid, 0).unwrap();
    let ended = app.engine_mut().message(EngineEvent::Ended);
    app.stop();
    app.engine_mut().take_calls();

    app.handle_engine_message(ended).unwrap();

    assert_eq!(app.session().state(), PlaybackState::Idle);
    assert_eq!(app.queue().current().unwrap().id().as_str(), "t0");
    assert!(app.engine_mut().take_calls().is_empty());
}

#[test]
fn learned_duration_reaches_the_store_and_is_saved() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 2);
    app.play_playlist(&pid, 0).unwrap();
    let writes = storage.writes.get();

    let meta = app.engine_mut().message(EngineEvent::MetadataReady {
        duration_seconds: 240.0,
    });
    app.handle_engine_message(meta).unwrap();

    assert_eq!(app.session().duration_seconds(), 240.0);
    assert_eq!(app.queue().tracks()[0].duration_seconds(), 240.0);
    assert_eq!(
        app.store().get(&pid).unwrap().tracks()[0].duration_seconds(),
        240.0
    );
    assert_eq!(storage.writes.get(), writes + 1);
    assert_eq!(
        storage.saved().playlists[0].tracks()[0].duration_seconds(),
        240.0
    );
}

#[test]
fn stale_engine_messages_change_nothing() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 2);
    app.play_playlist(&pid, 0).unwrap();
    app.next().unwrap();

    let stale = EngineMessage::new(TrackId::from("t0"), EngineEvent::Error("late".into()));
    app.handle_engine_message(stale).unwrap();
    assert_eq!(app.session().state(), PlaybackState::Playing);
    assert_eq!(app.session().current_track().unwrap().id().as_str(), "t1");
}

#[test]
fn play_pause_starts_the_queue_from_the_top() {
    let storage = SharedStore::default();
    let (mut app, _) = open(&storage);
    assert!(matches!(app.play_pause(), Err(Error::EmptyQueue)));

    app.enqueue(track("x"));
    app.enqueue(track("y"));
    app.play_pause().unwrap();
    assert_eq!(app.session().state(), PlaybackState::Playing);
    assert_eq!(app.queue().cursor(), Some(0));

    app.play_pause().unwrap();
    assert_eq!(app.session().state(), PlaybackState::Paused);
    app.play_pause().unwrap();
    assert_eq!(app.session().state(), PlaybackState::Playing);
}

#[test]
fn next_and_previous_wrap_and_reject_empty_queue() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 2);
    assert!(matches!(app.next(), Err(Error::EmptyQueue)));

    app.play_playlist(&pid, 0).unwrap();
    app.previous().unwrap();
    assert_eq!(app.session().current_track().unwrap().id().as_str(), "t1");
    app.next().unwrap();
    assert_eq!(app.session().current_track().unwrap().id().as_str(), "t0");
}

#[test]
fn jump_plays_the_chosen_entry() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 3);
    app.play_playlist(&pid, 0).unwrap();
    app.jump_to(2).unwrap();
    assert_eq!(app.session().current_track().unwrap().id().as_str(), "t2");
    assert!(matches!(app.jump_to(7), Err(Error::InvalidIndex { .. })));
}

#[test]
fn volume_is_clamped_and_saved() {
    let storage = SharedStore::default();
    let (mut app, _) = open(&storage);
    assert_eq!(app.set_volume(180), 100);
    assert_eq!(storage.saved().volume_percent, 100);
    assert_eq!(
        app.engine_mut().calls.last(),
        Some(&EngineCall::SetVolume(1.0))
    );
}

#[test]
fn clear_all_resets_everything_and_removes_the_blob() {
    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 2);
    app.play_playlist(&pid, 0).unwrap();
    assert!(storage.blob().is_some());

    app.clear_all().unwrap();
    assert!(app.store().is_empty());
    assert!(app.queue().is_empty());
    assert!(app.session().current_track().is_none());
    assert_eq!(app.session().state(), PlaybackState::Idle);
    assert!(storage.blob().is_none());
}

#[test]
fn local_search_goes_through_the_context() {
    let storage = SharedStore::default();
    let (app, pid) = app_with_playlist(&storage, 3);
    let hits = app
        .search(SearchSource::Local, "song t1", &UnavailableProvider)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].origin.as_ref().unwrap().playlist_id, pid);
    assert!(app
        .search(SearchSource::Local, "", &UnavailableProvider)
        .is_err());
}

#[test]
fn import_directory_adds_audio_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.mp3"), b"").unwrap();
    std::fs::write(dir.path().join("a.flac"), b"").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

    let storage = SharedStore::default();
    let (mut app, pid) = app_with_playlist(&storage, 0);
    let added = app
        .import_directory(&pid, dir.path(), &LibrarySettings::default())
        .unwrap();
    assert_eq!(added, 2);
    let titles: Vec<&str> = app
        .store()
        .get(&pid)
        .unwrap()
        .tracks()
        .iter()
        .map(|t| t.title())
        .collect();
    assert_eq!(titles, vec!["a", "b"]);

    assert!(matches!(
        app.import_directory(&pid, &dir.path().join("missing"), &LibrarySettings::default()),
        Err(Error::NotFound { .. })
    ));
}
