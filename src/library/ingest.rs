//! Turning files and URLs into `Track` values.
//!
//! No decoding happens here: the title is a best guess from the file name,
//! the artist is a placeholder and the duration stays unknown until the
//! audio engine reports metadata.

use std::path::Path;

use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::{Error, Result};

use super::display::UNKNOWN_ARTIST;
use super::model::{Track, TrackId};

/// Extensions accepted for direct audio URLs.
const URL_AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "flac", "ogg", "m4a"];

fn normalized_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

pub(crate) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts = normalized_extensions(settings);

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Build a track from a file name and a locator the engine can open.
///
/// The title is the file name minus its last extension.
pub fn ingest_file(file_name: &str, locator: impl Into<String>) -> Result<Track> {
    let title = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(file_name);
    Track::new(TrackId::generate(), title, UNKNOWN_ARTIST, locator)
}

/// Ingest a single local audio file.
pub fn track_from_path(path: &Path, settings: &LibrarySettings) -> Result<Track> {
    if !path.is_file() {
        return Err(Error::NotFound {
            entity: "file",
            id: path.display().to_string(),
        });
    }
    if !is_audio_file(path, settings) {
        return Err(Error::InvalidArgument(format!(
            "{} is not an audio file",
            path.display()
        )));
    }
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN");
    ingest_file(file_name, path.display().to_string())
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
}

/// Resolve a URL into a track.
///
/// Direct links to audio files become a track titled after the last path
/// segment. YouTube links are recognised but not supported and yield
/// `Ok(None)`. Anything else is rejected.
pub fn track_from_url(raw: &str) -> Result<Option<Track>> {
    let raw = raw.trim();
    let parsed =
        Url::parse(raw).map_err(|e| Error::InvalidArgument(format!("not a URL ({e}): {raw}")))?;

    if parsed.host_str().is_some_and(is_youtube_host) {
        info!(url = raw, "YouTube links are not supported yet");
        return Ok(None);
    }

    let last = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("");
    let supported = last
        .rsplit_once('.')
        .filter(|(stem, ext)| {
            !stem.is_empty() && URL_AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
        .map(|(stem, _)| stem);

    match supported {
        Some(stem) => {
            debug!(url = raw, "ingesting direct audio URL");
            Track::new(TrackId::generate(), stem, UNKNOWN_ARTIST, raw).map(Some)
        }
        None => Err(Error::InvalidArgument(format!(
            "unsupported URL format: {raw}"
        ))),
    }
}

/// Walk `dir` and ingest every audio file found, sorted by title.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || (!settings.include_hidden && is_hidden(path)) {
            continue;
        }
        match track_from_path(path, settings) {
            Ok(track) => tracks.push(track),
            Err(e) => debug!(path = %path.display(), error = %e, "skipping file"),
        }
    }

    tracks.sort_by_key(|t| t.title().to_lowercase());
    tracks
}
