//! Persisted viewer settings.
//!
//! A small TOML file under the user config directory holds the preferred
//! narration voice, the narration tuning bundle, and the first-visit flag.
//! All values are simple scalars; there is no versioning or migration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Narration tuning persisted across sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NarrationSettings {
    /// Normalized pitch; clamped to 0.5..=2.0 on load.
    pub pitch: f32,
    /// Normalized rate; clamped to 0.5..=2.0 on load.
    pub rate: f32,
    pub sound_effects: bool,
    pub enhanced_expression: bool,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            rate: 0.9,
            sound_effects: true,
            enhanced_expression: true,
        }
    }
}

impl NarrationSettings {
    fn clamped(mut self) -> Self {
        self.pitch = self.pitch.clamp(0.5, 2.0);
        self.rate = self.rate.clamp(0.5, 2.0);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub preferred_voice: Option<String>,
    pub narration: NarrationSettings,
    pub first_visit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preferred_voice: None,
            narration: NarrationSettings::default(),
            first_visit: true,
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    /// when no file exists yet.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let mut settings: Settings = toml::from_str(&content)?;
        settings.narration = settings.narration.clamped();
        Ok(settings)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_file_path() -> Result<PathBuf, SettingsError> {
        let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(config_dir.join("fablebook").join("settings.toml"))
    }
}
