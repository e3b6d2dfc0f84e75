//! Search over the playlist store and the (stubbed) remote sources.
//!
//! Local search is a linear scan with no ranking: results come back in
//! playlist order, then track order.

use tracing::debug;

use crate::error::{Error, Result};
use crate::library::ingest::track_from_url;
use crate::library::{PlaylistId, Track};
use crate::store::PlaylistStore;

/// Where a local search hit came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOrigin {
    pub playlist_id: PlaylistId,
    pub playlist_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub track: Track,
    /// Set for local hits; `None` for tracks resolved from elsewhere.
    pub origin: Option<TrackOrigin>,
}

/// Case-insensitive substring match against `"<title> <artist>"`.
///
/// An empty query matches everything; rejecting it is the caller's job.
pub fn search_local(store: &PlaylistStore, query: &str) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    let mut hits = Vec::new();
    for playlist in store.all() {
        for track in playlist.tracks() {
            if track.search_text().to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    track: track.clone(),
                    origin: Some(TrackOrigin {
                        playlist_id: playlist.id().clone(),
                        playlist_name: playlist.name().to_string(),
                    }),
                });
            }
        }
    }
    hits
}

/// A non-local search backend.
///
/// Unimplemented providers must return an empty set, never an error.
pub trait SearchProvider {
    fn name(&self) -> &str;
    fn search(&self, query: &str) -> Vec<Track>;
}

/// Placeholder for network search: always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableProvider;

impl SearchProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "remote"
    }

    fn search(&self, query: &str) -> Vec<Track> {
        debug!(query, "remote search is not available");
        Vec::new()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchSource {
    Local,
    Remote,
    Url,
}

impl std::str::FromStr for SearchSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" | "youtube" => Ok(Self::Remote),
            "url" => Ok(Self::Url),
            other => Err(Error::InvalidArgument(format!(
                "unknown search source: {other}"
            ))),
        }
    }
}

/// Uniform entry point over every source type.
///
/// The query is trimmed and must not be empty.
pub fn perform_search(
    source: SearchSource,
    query: &str,
    store: &PlaylistStore,
    remote: &dyn SearchProvider,
) -> Result<Vec<SearchHit>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::InvalidArgument("search query is empty".into()));
    }

    let hits = match source {
        SearchSource::Local => search_local(store, query),
        SearchSource::Remote => remote
            .search(query)
            .into_iter()
            .map(|track| SearchHit {
                track,
                origin: None,
            })
            .collect(),
        SearchSource::Url => track_from_url(query)?
            .map(|track| SearchHit {
                track,
                origin: None,
            })
            .into_iter()
            .collect(),
    };
    debug!(?source, query, hits = hits.len(), "search finished");
    Ok(hits)
}

#[cfg(test)]
mod tests;
