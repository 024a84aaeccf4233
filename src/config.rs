// src/config.rs

//! User settings (`settings.toml`).

use crate::constants::{CONFIG_DIR_NAME, SETTINGS_FILENAME, SETTINGS_PATH_VAR};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use thiserror::Error;

/// Errors raised while locating or reading the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not read settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// User settings relevant to shell sessions.
///
/// Only the keys this crate consumes are modelled; anything else in the file
/// is ignored so the file can be shared with the tool that manages environments.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// The shell identifier to launch when none is given explicitly.
    #[serde(default)]
    pub shell: Option<String>,
}

impl Settings {
    /// Loads settings from the default location.
    ///
    /// `ENVSHELL_CONFIG` takes precedence over `<config dir>/envshell/settings.toml`.
    /// A missing file is not an error: it yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&settings_path()?)
    }

    /// Loads settings from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No settings file at '{}', using defaults.", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Returns the path of the settings file, without creating anything on disk.
pub fn settings_path() -> Result<PathBuf, ConfigError> {
    if let Some(custom) = env::var_os(SETTINGS_PATH_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(custom));
    }
    let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.shell.is_none());
    }

    #[test]
    fn test_load_configured_shell() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "shell = \"fish\"\nunrelated = 3\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.shell.as_deref(), Some("fish"));
    }

    #[test]
    fn test_load_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "shell = [").unwrap();

        let result = Settings::load_from(&path);
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }
}
