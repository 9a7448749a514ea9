//! RON persistence for runoff settings.
//!
//! The evaluation core never touches files; this module is the settings
//! source that feeds [`SettingsStore`]. A missing file is created with
//! defaults, and a corrupt file degrades to defaults instead of failing:
//! a visual-effect subsystem must never destabilize the host.

use crate::settings::{RunoffSettings, SettingsStore};
use bevy_log::{error, info};
use ron::ser::PrettyConfig;
use std::fs;
use std::path::Path;

/// Reads settings from `path`, falling back to defaults on any failure.
/// When the file does not exist yet it is created with defaults so players
/// have something to edit.
pub fn load_or_default(path: &Path) -> RunoffSettings {
    match fs::read_to_string(path) {
        Ok(content) => match ron::de::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Could not parse runoff settings at {}: {}", path.display(), e);
                RunoffSettings::default()
            }
        },
        Err(_) => {
            let settings = RunoffSettings::default();
            if let Err(e) = save_settings(&settings, path) {
                error!(
                    "Could not write default runoff settings to {}: {}",
                    path.display(),
                    e
                );
            }
            settings
        }
    }
}

/// Serializes settings to pretty RON at `path`, creating parent directories
/// as needed.
pub fn save_settings(
    settings: &RunoffSettings,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pretty_config = PrettyConfig::new().with_separate_tuple_members(true);
    let serialized = ron::ser::to_string_pretty(settings, pretty_config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serialized)?;
    Ok(())
}

/// Re-reads the settings file and publishes the snapshot through the store.
/// The version bump invalidates derived template caches on their next use.
/// Returns the new settings version.
pub fn reload(store: &SettingsStore, path: &Path) -> u64 {
    let settings = load_or_default(path);
    let version = store.replace(settings);
    info!("Runoff settings reloaded (version {})", version);
    version
}
