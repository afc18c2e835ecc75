//! Settings persistence
//!
//! Saves and loads [`CoreSettings`] to/from a JSON file in the user's
//! configuration directory.
//!
//! # Error Handling
//!
//! - Load failures fall back to default settings (logged)
//! - Save failures are returned to the caller and logged

use crate::core::error::CoreResult;
use crate::core::CoreSettings;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// Resolve the settings file path
///
/// Returns `settings.json` in the user's configuration directory, falling back
/// to the working directory if the platform has none.
pub fn settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "hotseat", "HotseatChess") {
        proj_dirs.config_dir().join(SETTINGS_FILENAME)
    } else {
        PathBuf::from(SETTINGS_FILENAME)
    }
}

/// Load settings from the default location
pub fn load_settings() -> CoreSettings {
    load_settings_from(&settings_path())
}

/// Load settings from `path`, using defaults if the file is missing or invalid
pub fn load_settings_from(path: &Path) -> CoreSettings {
    if !path.exists() {
        info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
        return CoreSettings::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<CoreSettings>(&contents) {
            Ok(settings) => {
                info!("[SETTINGS] Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!(
                    "[SETTINGS] Failed to parse settings file at {:?}: {}. Using defaults.",
                    path, e
                );
                CoreSettings::default()
            }
        },
        Err(e) => {
            warn!(
                "[SETTINGS] Failed to read settings file at {:?}: {}. Using defaults.",
                path, e
            );
            CoreSettings::default()
        }
    }
}

/// Save settings to the default location
pub fn save_settings(settings: &CoreSettings) -> CoreResult<()> {
    save_settings_to(&settings_path(), settings)
}

/// Save settings to `path`, creating parent directories as needed
pub fn save_settings_to(path: &Path, settings: &CoreSettings) -> CoreResult<()> {
    let result = write_settings(path, settings);
    match &result {
        Ok(()) => info!("[SETTINGS] Saved settings to {:?}", path),
        Err(e) => error!("[SETTINGS] Failed to save settings to {:?}: {}", path, e),
    }
    result
}

fn write_settings(path: &Path, settings: &CoreSettings) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}
