//! Settings parser for .gridwidget/config.toml

use std::path::Path;

use super::types::Settings;
use gridwidget_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const GRIDWIDGET_DIR: &str = ".gridwidget";

/// Load settings from `<dir>/.gridwidget/config.toml`.
///
/// A missing or malformed file yields the defaults.
pub fn load_settings(dir: &Path) -> Settings {
    let config_path = dir.join(GRIDWIDGET_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Load settings from an explicitly requested file.
///
/// Unlike [`load_settings`], the file must exist and parse.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))
}
