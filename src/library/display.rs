use std::path::Path;

use crate::config::TrackDisplayField;

use super::model::Track;

/// Placeholder shown when a track has no title.
pub const UNTITLED: &str = "Untitled";
/// Placeholder artist for tracks ingested from files or bare URLs.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Blank fields are skipped; when nothing is produced the title (or the
/// untitled placeholder) is used.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Title => {
                if !track.title().trim().is_empty() {
                    parts.push(track.title().trim().to_string());
                }
            }
            TrackDisplayField::Artist => {
                if !track.artist().trim().is_empty() {
                    parts.push(track.artist().trim().to_string());
                }
            }
            TrackDisplayField::Filename => {
                let stem = Path::new(track.source_locator())
                    .file_stem()
                    .and_then(|s| s.to_str());
                if let Some(stem) = stem.filter(|s| !s.trim().is_empty()) {
                    parts.push(stem.to_string());
                }
            }
            TrackDisplayField::Locator => {
                if !track.source_locator().is_empty() {
                    parts.push(track.source_locator().to_string());
                }
            }
            TrackDisplayField::Duration => {
                parts.push(format_time(track.duration_seconds()));
            }
        }
    }

    if parts.is_empty() {
        title_or_placeholder(track).to_string()
    } else {
        parts.join(sep)
    }
}

pub fn title_or_placeholder(track: &Track) -> &str {
    if track.title().trim().is_empty() {
        UNTITLED
    } else {
        track.title()
    }
}

/// Format seconds as `m:ss`. Unknown or invalid values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
