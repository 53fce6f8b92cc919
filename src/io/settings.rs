use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::config::BoardConfig;

/// Settings file looked up next to the board document
pub const SETTINGS_FILE: &str = "mdboard.toml";

/// Error type for settings loading
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `mdboard.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Base board config; document frontmatter is overlaid on top
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputSettings {
    /// Titles wider than this are truncated in text output
    #[serde(default = "default_title_width")]
    pub title_width: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            title_width: default_title_width(),
        }
    }
}

fn default_title_width() -> usize {
    60
}

impl Settings {
    pub fn from_toml(text: &str, path: &Path) -> Result<Settings, SettingsError> {
        toml::from_str(text).map_err(|e| SettingsError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Read a settings file that must exist
    pub fn load(path: &Path) -> Result<Settings, SettingsError> {
        let text = fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings = Settings::from_toml(&text, path)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Settings for `document`: the explicit file if given, else
    /// `mdboard.toml` beside the document, else built-in defaults.
    pub fn discover(document: &Path, explicit: Option<&Path>) -> Result<Settings, SettingsError> {
        if let Some(path) = explicit {
            return Settings::load(path);
        }
        let dir = match document.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            Settings::load(&candidate)
        } else {
            Ok(Settings::default())
        }
    }
}
