// src/settings.rs

//! User defaults for the command-line tool, read from `<config dir>/hydrolib/settings.toml`.
//!
//! ```toml
//! [load]
//! resolve_casing = true
//! path_style = "windows"
//!
//! [serializer]
//! property_indent = 2
//! float_precision = 3
//! ```

use crate::constants::{CONFIG_DIR_NAME, SETTINGS_FILENAME};
use crate::core::context::LoadSettings;
use crate::ini::serializer::SerializerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Error parsing TOML in '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub load: LoadSettings,
    pub serializer: SerializerConfig,
}

impl Settings {
    /// Path of the user settings file. The directory is not created.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILENAME))
            .ok_or(SettingsError::ConfigDirNotFound)
    }

    /// Reads the user settings file, falling back to built-in defaults when it is absent.
    pub fn load() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(SettingsError::ConfigDirNotFound) => {
                log::debug!("No config directory on this system, using default settings");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.is_file() {
            log::debug!("No settings file at '{}', using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::TomlParse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::PathStyle;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "[load]\npath_style = \"windows\"\n\n[serializer]\nfloat_precision = 3\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.load.path_style, PathStyle::WindowsLike);
        assert!(settings.load.recurse);
        assert_eq!(settings.serializer.float_precision, Some(3));
        assert_eq!(
            settings.serializer.property_indent,
            SerializerConfig::default().property_indent
        );
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[load\n").unwrap();

        let error = Settings::load_from(&path).unwrap_err();
        assert!(matches!(error, SettingsError::TomlParse { .. }));
        assert!(error.to_string().contains("settings.toml"));
    }
}
