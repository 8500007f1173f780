//! Settings persistence system
//!
//! Saves and loads [`Settings`] to/from a JSON file in the platform
//! configuration directory.
//!
//! # File Location
//!
//! `settings.json` under the directory resolved by [`ProjectDirs`], e.g.
//! `~/.config/damalink/settings.json` on Linux. Without a home directory
//! there is no settings file: loading uses defaults and saving fails with
//! [`CoreError::NoConfigDir`].
//!
//! # Error Handling
//!
//! - Load failures fall back to default settings with a warning
//! - Save failures are returned to the caller

use crate::core::error::{CoreError, CoreResult};
use crate::core::Settings;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// Resolve the settings file path
pub fn settings_path() -> CoreResult<PathBuf> {
    settings_path_in(ProjectDirs::from("com", "trilltino", "Damalink").as_ref())
}

fn settings_path_in(dirs: Option<&ProjectDirs>) -> CoreResult<PathBuf> {
    dirs.map(|proj_dirs| proj_dirs.config_dir().join(SETTINGS_FILENAME))
        .ok_or(CoreError::NoConfigDir)
}

/// Load settings from the default location
pub fn load_settings() -> Settings {
    match settings_path() {
        Ok(path) => load_settings_from(&path),
        Err(e) => {
            warn!("[SETTINGS] {}. Using defaults.", e);
            Settings::default()
        }
    }
}

/// Load settings from `path`, falling back to defaults
///
/// A missing, unreadable or unparsable file yields [`Settings::default`].
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
        return Settings::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
            Ok(settings) => {
                info!("[SETTINGS] Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!(
                    "[SETTINGS] Failed to parse settings file at {:?}: {}. Using defaults.",
                    path, e
                );
                Settings::default()
            }
        },
        Err(e) => {
            warn!(
                "[SETTINGS] Failed to read settings file at {:?}: {}. Using defaults.",
                path, e
            );
            Settings::default()
        }
    }
}

/// Save settings to the default location
pub fn save_settings(settings: &Settings) -> CoreResult<PathBuf> {
    let path = settings_path()?;
    save_settings_to(&path, settings)?;
    Ok(path)
}

/// Save settings to `path` as pretty JSON, creating parent directories
pub fn save_settings_to(path: &Path, settings: &Settings) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    info!("[SETTINGS] Saved settings to {:?}", path);
    Ok(())
}
