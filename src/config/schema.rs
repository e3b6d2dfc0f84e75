use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
///
/// These are static preferences. User state that changes at runtime
/// (playlists, volume, repeat, shuffle, theme) lives in the persisted
/// settings blob instead.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub playback: PlaybackSettings,
    pub audio: AudioSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the persisted state. Falls back to the XDG data dir.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How `next` picks a track while shuffle is on.
    pub shuffle_policy: ShufflePolicySetting,
    /// Step used by the `forward` / `back` shell commands.
    pub seek_step_seconds: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle_policy: ShufflePolicySetting::Uniform,
            seek_step_seconds: 10,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShufflePolicySetting {
    #[serde(alias = "random")]
    Uniform,
    #[serde(alias = "avoid_repeat", alias = "no-repeat", alias = "no_repeat")]
    AvoidRepeat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How often the engine reports playback position (milliseconds).
    pub position_interval_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            position_interval_ms: 1000,
            quit_fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "m4a".into(),
            ],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// Which track fields to show when printing a track, and in what order.
    ///
    /// Example: ["artist", "title"]
    pub track_fields: Vec<TrackDisplayField>,
    /// Separator used to join `track_fields`.
    pub track_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            track_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            track_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Filename,
    Locator,
    Duration,
}

/// Filter used when neither `RUST_LOG` nor `logging.filter` parses.
pub const DEFAULT_LOG_FILTER: &str = "encore=info,warn";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for log files. Falls back to `<data_dir>/logs`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            directory: None,
        }
    }
}
