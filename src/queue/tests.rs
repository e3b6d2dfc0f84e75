use super::*;
use proptest::prelude::*;

fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track::new(format!("t{i}"), format!("Track {i}"), "A", format!("/m/{i}.mp3")).unwrap())
        .collect()
}

fn loaded(n: usize, start: usize) -> QueueModel {
    let mut q = QueueModel::with_seed(7);
    q.load(tracks(n), start).unwrap();
    q
}

#[test]
fn load_rejects_empty_and_out_of_range_without_touching_state() {
    let mut q = loaded(2, 1);

    assert!(matches!(q.load(Vec::new(), 0), Err(Error::EmptyQueue)));
    assert!(matches!(
        q.load(tracks(3), 3),
        Err(Error::InvalidIndex { index: 3, len: 3 })
    ));

    assert_eq!(q.len(), 2);
    assert_eq!(q.cursor(), Some(1));
}

#[test]
fn empty_queue_has_no_current_and_cannot_advance() {
    let mut q = QueueModel::with_seed(1);
    assert!(q.current().is_none());
    assert!(matches!(q.advance(Direction::Next), Err(Error::EmptyQueue)));
    assert!(matches!(q.advance(Direction::Previous), Err(Error::EmptyQueue)));
    assert_eq!(q.on_track_ended(), NextAction::Stop);
}

#[test]
fn next_wraps_without_shuffle() {
    let mut q = loaded(3, 2);
    assert_eq!(q.advance(Direction::Next).unwrap().id().as_str(), "t0");
    assert_eq!(q.cursor(), Some(0));
}

#[test]
fn previous_from_zero_wraps_to_last() {
    let mut q = loaded(4, 0);
    q.advance(Direction::Previous).unwrap();
    assert_eq!(q.cursor(), Some(3));
    q.advance(Direction::Previous).unwrap();
    assert_eq!(q.cursor(), Some(2));
}

#[test]
fn previous_is_never_randomized() {
    let mut q = loaded(10, 5);
    q.set_shuffle(true);
    for expected in [4, 3, 2, 1, 0, 9] {
        q.advance(Direction::Previous).unwrap();
        assert_eq!(q.cursor(), Some(expected));
    }
}

#[test]
fn last_track_ended_with_repeat_off_stops() {
    let q = loaded(3, 2);
    assert_eq!(q.on_track_ended(), NextAction::Stop);
    assert_eq!(q.current().unwrap().id().as_str(), "t2");
}

#[test]
fn repeat_all_continues_past_the_end() {
    let mut q = loaded(3, 2);
    q.set_repeat_mode(RepeatMode::All);
    assert_eq!(q.on_track_ended(), NextAction::AdvanceToNext);
}

#[test]
fn cycle_repeat_mode_goes_off_one_all() {
    let mut q = QueueModel::with_seed(0);
    assert_eq!(q.cycle_repeat_mode(), RepeatMode::One);
    assert_eq!(q.cycle_repeat_mode(), RepeatMode::All);
    assert_eq!(q.cycle_repeat_mode(), RepeatMode::Off);
}

#[test]
fn repeat_mode_parses_and_displays() {
    assert_eq!("ALL".parse::<RepeatMode>().unwrap(), RepeatMode::All);
    assert_eq!("off".parse::<RepeatMode>().unwrap(), RepeatMode::Off);
    assert!("sometimes".parse::<RepeatMode>().is_err());
    assert_eq!(RepeatMode::One.to_string(), "one");
}

#[test]
fn uniform_shuffle_stays_in_bounds_and_can_repeat_current() {
    let mut q = loaded(3, 0);
    q.set_shuffle(true);
    let mut repeated = false;
    for _ in 0..200 {
        let before = q.cursor();
        q.advance(Direction::Next).unwrap();
        let after = q.cursor().unwrap();
        assert!(after < 3);
        repeated |= before == Some(after);
    }
    assert!(repeated, "uniform policy never re-picked the current index");
}

#[test]
fn avoid_repeat_shuffle_never_repicks_current() {
    let mut q = loaded(3, 0);
    q.set_policy(ShufflePolicy::AvoidRepeat);
    q.set_shuffle(true);
    for _ in 0..200 {
        let before = q.cursor().unwrap();
        q.advance(Direction::Next).unwrap();
        let after = q.cursor().unwrap();
        assert!(after < 3);
        assert_ne!(before, after);
    }
}

#[test]
fn avoid_repeat_with_single_track_stays_put() {
    let mut q = loaded(1, 0);
    q.set_policy(ShufflePolicy::AvoidRepeat);
    q.set_shuffle(true);
    q.advance(Direction::Next).unwrap();
    assert_eq!(q.cursor(), Some(0));
}

#[test]
fn enqueue_appends_without_moving_cursor() {
    let mut q = loaded(2, 1);
    let extra = Track::new("x", "Extra", "A", "/m/x.mp3").unwrap();
    q.enqueue(extra);
    assert_eq!(q.len(), 3);
    assert_eq!(q.cursor(), Some(1));
    assert_eq!(q.on_track_ended(), NextAction::AdvanceToNext);
}

#[test]
fn enqueue_into_empty_queue_leaves_cursor_unset() {
    let mut q = QueueModel::with_seed(0);
    q.enqueue(Track::new("x", "Extra", "A", "/m/x.mp3").unwrap());
    assert!(q.current().is_none());
    assert_eq!(q.advance(Direction::Next).unwrap().id().as_str(), "x");
}

#[test]
fn jump_to_validates_index() {
    let mut q = loaded(3, 0);
    assert!(matches!(
        q.jump_to(3),
        Err(Error::InvalidIndex { index: 3, len: 3 })
    ));
    assert_eq!(q.jump_to(2).unwrap().id().as_str(), "t2");
    assert_eq!(q.cursor(), Some(2));
}

#[test]
fn clear_resets_tracks_and_cursor_but_keeps_modes() {
    let mut q = loaded(3, 1);
    q.set_shuffle(true);
    q.set_repeat_mode(RepeatMode::One);
    q.clear();
    assert!(q.is_empty());
    assert!(q.cursor().is_none());
    assert!(q.shuffle_enabled());
    assert_eq!(q.repeat_mode(), RepeatMode::One);
}

#[test]
fn queue_is_a_snapshot_of_loaded_tracks() {
    let mut source = tracks(2);
    let mut q = QueueModel::with_seed(0);
    q.load(source.clone(), 0).unwrap();
    source.push(Track::new("late", "Late", "A", "/m/late.mp3").unwrap());
    assert_eq!(q.len(), 2);
}

#[test]
fn update_duration_fills_only_unknown_copies() {
    let mut ts = tracks(2);
    ts.push(ts[0].clone().with_duration(50.0));
    let mut q = QueueModel::with_seed(0);
    q.load(ts, 0).unwrap();

    assert_eq!(q.update_duration(&TrackId::from("t0"), 180.0), 1);
    assert_eq!(q.tracks()[0].duration_seconds(), 180.0);
    assert_eq!(q.tracks()[2].duration_seconds(), 50.0);
    assert_eq!(q.update_duration(&TrackId::from("t1"), -1.0), 0);
}

#[test]
fn setters_notify_subscribers() {
    let mut q = QueueModel::with_seed(0);
    let rx = q.subscribe();
    q.load(tracks(2), 0).unwrap();
    q.set_shuffle(true);
    q.set_repeat_mode(RepeatMode::All);
    q.advance(Direction::Next).unwrap();
    q.clear();

    let events: Vec<QueueEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0], QueueEvent::Loaded { len: 2, start: 0 });
    assert_eq!(events[1], QueueEvent::ShuffleChanged(true));
    assert_eq!(events[2], QueueEvent::RepeatChanged(RepeatMode::All));
    assert!(matches!(events[3], QueueEvent::CursorMoved(_)));
    assert_eq!(events[4], QueueEvent::Cleared);
}

#[test]
fn policy_follows_config_setting() {
    assert_eq!(
        ShufflePolicy::from(ShufflePolicySetting::AvoidRepeat),
        ShufflePolicy::AvoidRepeat
    );
    assert_eq!(
        ShufflePolicy::from(ShufflePolicySetting::Uniform),
        ShufflePolicy::Uniform
    );
}

proptest! {
    #[test]
    fn repeat_off_stops_only_at_the_last_index(len in 1usize..40, start_seed in any::<usize>()) {
        let start = start_seed % len;
        let mut q = loaded(len, start);
        if start == len - 1 {
            prop_assert_eq!(q.on_track_ended(), NextAction::Stop);
        } else {
            prop_assert_eq!(q.on_track_ended(), NextAction::AdvanceToNext);
            q.advance(Direction::Next).unwrap();
            prop_assert_eq!(q.cursor(), Some(start + 1));
        }
    }

    #[test]
    fn repeat_all_cycles_every_index_and_wraps(len in 1usize..40) {
        let mut q = loaded(len, 0);
        q.set_repeat_mode(RepeatMode::All);
        let mut seen = vec![false; len];
        seen[0] = true;
        for _ in 0..len {
            prop_assert_eq!(q.on_track_ended(), NextAction::AdvanceToNext);
            q.advance(Direction::Next).unwrap();
            seen[q.cursor().unwrap()] = true;
        }
        prop_assert!(seen.iter().all(|s| *s));
        prop_assert_eq!(q.cursor(), Some(0));
    }

    #[test]
    fn repeat_one_always_repeats(len in 1usize..40, start_seed in any::<usize>(), shuffle in any::<bool>()) {
        let mut q = loaded(len, start_seed % len);
        q.set_shuffle(shuffle);
        q.set_repeat_mode(RepeatMode::One);
        prop_assert_eq!(q.on_track_ended(), NextAction::RepeatSameTrack);
    }

    #[test]
    fn previous_decrements_or_wraps(len in 1usize..40, start_seed in any::<usize>(), shuffle in any::<bool>()) {
        let start = start_seed % len;
        let mut q = loaded(len, start);
        q.set_shuffle(shuffle);
        q.advance(Direction::Previous).unwrap();
        let expected = if start == 0 { len - 1 } else { start - 1 };
        prop_assert_eq!(q.cursor(), Some(expected));
    }
}
