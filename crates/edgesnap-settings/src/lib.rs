//! edgesnap-settings: persisted interaction preferences.
//!
//! Holds the single user-facing toggle the annotation canvas reads at
//! startup: whether dragging with the middle mouse button pans the view.
//! The preference lives in a small JSON document:
//!
//! ```json
//! {
//!   "enable_middle_mouse_pan": true,
//!   "config_version": "1.0.0"
//! }
//! ```
//!
//! Loading never fails. A missing file is created with the defaults; an
//! unreadable or malformed one is ignored in favour of the defaults; keys
//! missing from an otherwise valid file take their default values. Keys
//! this crate does not know about are kept and written back on save.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name used by [`SettingsStore::in_dir`].
pub const SETTINGS_FILE_NAME: &str = "mouse_pan_config.json";

/// Version string written into new settings files.
pub const CONFIG_VERSION: &str = "1.0.0";

/// Errors that can occur while writing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be written.
    #[error("failed to write settings to {path}: {source}")]
    Io {
        /// File that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The settings could not be encoded as JSON.
    #[error("failed to encode settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The persisted preference document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanSettings {
    /// Whether middle-button drags pan the canvas.
    #[serde(default = "default_enabled")]
    pub enable_middle_mouse_pan: bool,

    /// Format version of the document.
    #[serde(default = "default_version")]
    pub config_version: String,

    /// Keys written by other versions, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const fn default_enabled() -> bool {
    true
}

fn default_version() -> String {
    CONFIG_VERSION.to_owned()
}

impl Default for PanSettings {
    fn default() -> Self {
        Self {
            enable_middle_mouse_pan: default_enabled(),
            config_version: default_version(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Reads and writes [`PanSettings`] at a fixed path.
///
/// Every call goes to disk; nothing is cached between calls, so external
/// edits to the file are picked up on the next read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by [`SETTINGS_FILE_NAME`] inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SETTINGS_FILE_NAME))
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings, falling back to defaults.
    ///
    /// If the file does not exist the defaults are written to it first;
    /// a failure to write them is logged and otherwise ignored. A file that
    /// exists but cannot be read or parsed is left untouched.
    #[must_use]
    pub fn load(&self) -> PanSettings {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let defaults = PanSettings::default();
                if let Err(e) = self.save(&defaults) {
                    tracing::warn!(error = %e, "could not write default settings");
                }
                return defaults;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read settings, using defaults");
                return PanSettings::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed settings, using defaults");
                PanSettings::default()
            }
        }
    }

    /// Overwrite the settings file with `settings` as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Serialize`] if encoding fails and
    /// [`SettingsError::Io`] if the file cannot be written.
    pub fn save(&self, settings: &PanSettings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Whether middle-button panning is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.load().enable_middle_mouse_pan
    }

    /// Turn middle-button panning on or off, keeping every other key.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn set_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        let mut settings = self.load();
        settings.enable_middle_mouse_pan = enabled;
        self.save(&settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, SettingsStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = SettingsStore::in_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn defaults() {
        let settings = PanSettings::default();
        assert!(settings.enable_middle_mouse_pan);
        assert_eq!(settings.config_version, "1.0.0");
        assert!(settings.extra.is_empty());
    }

    #[test]
    fn missing_file_yields_defaults_and_writes_them() {
        let (_dir, store) = temp_store();
        assert!(!store.path().exists());

        let settings = store.load();
        assert_eq!(settings, PanSettings::default());
        assert!(store.path().exists());

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk["enable_middle_mouse_pan"], serde_json::Value::Bool(true));
        assert_eq!(on_disk["config_version"], "1.0.0");
    }

    #[test]
    fn malformed_file_yields_defaults_without_overwriting() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load(), PanSettings::default());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn wrong_type_is_treated_as_malformed() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), r#"{"enable_middle_mouse_pan": "yes"}"#).unwrap();
        assert_eq!(store.load(), PanSettings::default());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), r#"{"enable_middle_mouse_pan": false}"#).unwrap();

        let settings = store.load();
        assert!(!settings.enable_middle_mouse_pan);
        assert_eq!(settings.config_version, CONFIG_VERSION);
    }

    #[test]
    fn set_enabled_round_trips() {
        let (_dir, store) = temp_store();
        store.set_enabled(false).unwrap();
        assert!(!store.is_enabled());
        store.set_enabled(true).unwrap();
        assert!(store.is_enabled());
    }

    #[test]
    fn unknown_keys_survive_set_enabled() {
        let (_dir, store) = temp_store();
        fs::write(
            store.path(),
            r#"{"enable_middle_mouse_pan": true, "config_version": "1.0.0", "theme": "dark"}"#,
        )
        .unwrap();

        store.set_enabled(false).unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk["theme"], "dark");
        assert_eq!(on_disk["enable_middle_mouse_pan"], serde_json::Value::Bool(false));
    }

    #[test]
    fn save_writes_indented_json() {
        let (_dir, store) = temp_store();
        store.save(&PanSettings::default()).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"enable_middle_mouse_pan\": true"), "got {text}");
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let (dir, _store) = temp_store();
        let store = SettingsStore::in_dir(dir.path().join("does/not/exist"));
        let err = store.save(&PanSettings::default()).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
        // Loading still succeeds even though the defaults cannot be written.
        assert_eq!(store.load(), PanSettings::default());
    }
}
