use std::path::Path;

use tracing::warn;

use crate::config;

/// Load settings, falling back to defaults when the file is unreadable or
/// invalid. Logging is not up yet, so problems go to stderr.
pub fn load_settings(config_path: Option<&Path>) -> config::Settings {
    let loaded = match config_path {
        Some(path) => config::Settings::load_from(Some(path)),
        None => config::Settings::load(),
    };
    match loaded {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("encore: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("encore: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}

/// Apply command-line overrides on top of the loaded settings.
pub fn apply_overrides(settings: &mut config::Settings, data_dir: Option<&Path>) {
    if let Some(dir) = data_dir {
        if settings.storage.data_dir.is_some() {
            warn!(dir = %dir.display(), "--data-dir overrides storage.data_dir");
        }
        settings.storage.data_dir = Some(dir.to_path_buf());
    }
}
