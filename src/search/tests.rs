use super::*;

fn t(id: &str, title: &str, artist: &str) -> Track {
    Track::new(id, title, artist, format!("/music/{id}.mp3")).unwrap()
}

fn store_with(tracks: &[(&str, &str, &str)]) -> (PlaylistStore, PlaylistId) {
    let mut store = PlaylistStore::new();
    let p = store.create(Some("Mix"));
    for (id, title, artist) in tracks {
        store.add_track(p.id(), t(id, title, artist)).unwrap();
    }
    (store, p.id().clone())
}

#[test]
fn matches_title_case_insensitively_and_tags_origin() {
    let (store, pid) = store_with(&[("1", "Rock Anthem", "A"), ("2", "Jazz Tune", "B")]);
    let hits = search_local(&store, "rock");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].track.title(), "Rock Anthem");
    let origin = hits[0].origin.as_ref().unwrap();
    assert_eq!(origin.playlist_id, pid);
    assert_eq!(origin.playlist_name, "Mix");
}

#[test]
fn matches_across_title_and_artist_boundary() {
    let (store, _) = store_with(&[("1", "Blue", "Moon Band")]);
    assert_eq!(search_local(&store, "blue moon").len(), 1);
    assert_eq!(search_local(&store, "MOON").len(), 1);
    assert!(search_local(&store, "bluemoon").is_empty());
}

#[test]
fn empty_query_matches_everything_in_order() {
    let mut store = PlaylistStore::new();
    let a = store.create(Some("a"));
    let b = store.create(Some("b"));
    store.add_track(b.id(), t("3", "Third", "x")).unwrap();
    store.add_track(a.id(), t("1", "First", "x")).unwrap();
    store.add_track(a.id(), t("2", "Second", "x")).unwrap();

    let titles: Vec<String> = search_local(&store, "")
        .into_iter()
        .map(|h| h.track.title().to_string())
        .collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
}

#[test]
fn perform_search_rejects_blank_queries() {
    let (store, _) = store_with(&[]);
    assert!(matches!(
        perform_search(SearchSource::Local, "  ", &store, &UnavailableProvider),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn remote_search_is_empty_not_an_error() {
    let (store, _) = store_with(&[("1", "Anything", "x")]);
    let hits =
        perform_search(SearchSource::Remote, "anything", &store, &UnavailableProvider).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn url_search_yields_a_single_untagged_hit() {
    let (store, _) = store_with(&[]);
    let hits = perform_search(
        SearchSource::Url,
        " https://example.com/a/song.ogg ",
        &store,
        &UnavailableProvider,
    )
    .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].track.title(), "song");
    assert!(hits[0].origin.is_none());

    let none = perform_search(
        SearchSource::Url,
        "https://youtu.be/xyz",
        &store,
        &UnavailableProvider,
    )
    .unwrap();
    assert!(none.is_empty());
}

#[test]
fn search_source_parses_names() {
    assert_eq!("LOCAL".parse::<SearchSource>().unwrap(), SearchSource::Local);
    assert_eq!("youtube".parse::<SearchSource>().unwrap(), SearchSource::Remote);
    assert!("ftp".parse::<SearchSource>().is_err());
}
