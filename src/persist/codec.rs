use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::library::Playlist;
use crate::queue::RepeatMode;

/// Storage key holding the whole settings blob.
pub const SETTINGS_KEY: &str = "encore.settings";

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_VOLUME_PERCENT: u8 = 70;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Auto,
    Light,
    Dark,
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThemePreference::Auto => "auto",
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        })
    }
}

impl FromStr for ThemePreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ThemePreference::Auto),
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => Err(Error::InvalidArgument(format!("unknown theme: {other}"))),
        }
    }
}

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSettings {
    pub schema_version: u32,
    pub playlists: Vec<Playlist>,
    pub volume_percent: u8,
    pub theme_preference: ThemePreference,
    pub repeat_mode: RepeatMode,
    pub shuffle_enabled: bool,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            playlists: Vec::new(),
            volume_percent: DEFAULT_VOLUME_PERCENT,
            theme_preference: ThemePreference::Auto,
            repeat_mode: RepeatMode::Off,
            shuffle_enabled: false,
        }
    }
}

/// How a stored blob was turned into settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Missing,
    Loaded,
    Migrated { from: u32 },
    Corrupt,
}

pub fn serialize(settings: &PersistedSettings) -> Result<String> {
    Ok(serde_json::to_string(settings)?)
}

/// Decode a blob, falling back to defaults when it is absent or unreadable.
pub fn deserialize(blob: Option<&str>) -> PersistedSettings {
    decode(blob).0
}

pub fn decode(blob: Option<&str>) -> (PersistedSettings, LoadOutcome) {
    let Some(blob) = blob else {
        return (PersistedSettings::default(), LoadOutcome::Missing);
    };
    match decode_strict(blob) {
        Ok((settings, from)) if from < CURRENT_SCHEMA_VERSION => {
            (settings, LoadOutcome::Migrated { from })
        }
        Ok((settings, _)) => (settings, LoadOutcome::Loaded),
        Err(e) => {
            warn!(error = %e, "discarding unreadable settings");
            (PersistedSettings::default(), LoadOutcome::Corrupt)
        }
    }
}

/// Returns the settings together with the schema version found in the blob.
fn decode_strict(blob: &str) -> Result<(PersistedSettings, u32)> {
    let value: Value =
        serde_json::from_str(blob).map_err(|e| Error::PersistenceCorrupt(e.to_string()))?;
    let Value::Object(mut root) = value else {
        return Err(Error::PersistenceCorrupt(
            "top-level value is not an object".into(),
        ));
    };

    let from = match root.get("schemaVersion") {
        None => 0,
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| Error::PersistenceCorrupt(format!("bad schemaVersion: {v}")))?,
    };
    if from > CURRENT_SCHEMA_VERSION {
        warn!(
            found = from,
            current = CURRENT_SCHEMA_VERSION,
            "settings written by a newer version, loading what is understood"
        );
    }

    if from == 0 {
        debug!("migrating unversioned settings");
        migrate_v0(&mut root);
    }

    let mut settings: PersistedSettings = serde_json::from_value(Value::Object(root))
        .map_err(|e| Error::PersistenceCorrupt(e.to_string()))?;
    settings.schema_version = CURRENT_SCHEMA_VERSION;
    settings.volume_percent = settings.volume_percent.min(100);
    Ok((settings, from))
}

/// Unversioned blobs use the old field names, a zero or missing volume
/// meant "default", and unknown durations were stored as `null`.
fn migrate_v0(root: &mut Map<String, Value>) {
    let volume = root
        .remove("volume")
        .and_then(|v| v.as_u64())
        .filter(|v| *v > 0)
        .map(|v| v.min(100))
        .unwrap_or(u64::from(DEFAULT_VOLUME_PERCENT));
    root.entry("volumePercent").or_insert(Value::from(volume));

    rename_key(root, "theme", "themePreference");
    rename_key(root, "isShuffled", "shuffleEnabled");

    if let Some(Value::Array(playlists)) = root.get_mut("playlists") {
        for playlist in playlists.iter_mut() {
            let Some(Value::Array(tracks)) = playlist.get_mut("tracks") else {
                continue;
            };
            for track in tracks.iter_mut().filter_map(Value::as_object_mut) {
                rename_key(track, "url", "sourceLocator");
                rename_key(track, "duration", "durationSeconds");
                if track.get("durationSeconds").is_some_and(|d| !d.is_number()) {
                    track.remove("durationSeconds");
                }
                rename_key(track, "cover", "coverLocator");
                track.remove("file");
            }
        }
    }
}

fn rename_key(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(v) = obj.remove(from) {
        obj.entry(to).or_insert(v);
    }
}
