//! Settings management for confedit

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::binding::DEFAULT_FORMAT;
use crate::error::{ConfEditError, Result};

/// Main settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lookup: LookupSettings,
    pub editor: EditorSettings,
}

impl Settings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfEditError::Config(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| ConfEditError::Config(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            ConfEditError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| ConfEditError::Config(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Default settings path under the user's config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("confedit").join("settings.json"))
    }

    /// Load settings from an optional file, then apply environment overrides
    /// and validate the result.
    ///
    /// A missing file at the default location is not an error; a missing file
    /// that was asked for explicitly is.
    pub fn load(path: Option<&Path>, env_overrides: &HashMap<String, String>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => {
                    tracing::debug!("Loading settings from {}", default.display());
                    Self::from_file(&default)?
                }
                _ => Self::new(),
            },
        };

        settings.apply_environment_overrides(env_overrides)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Collect `CONFEDIT_*` variables from the process environment
    pub fn environment() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("CONFEDIT_"))
            .collect()
    }

    /// Apply environment variable overrides
    pub fn apply_environment_overrides(
        &mut self,
        env_overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (key, value) in env_overrides {
            match key.as_str() {
                "CONFEDIT_LOOKUP_URL" => self.lookup.base_url = value.clone(),
                "CONFEDIT_LOOKUP_TIMEOUT" => {
                    self.lookup.timeout_secs = value.parse().map_err(|_| {
                        ConfEditError::Config(format!(
                            "Invalid timeout in environment variable: {}",
                            value
                        ))
                    })?;
                }
                "CONFEDIT_LOOKUP_TOKEN" => self.lookup.token = Some(value.clone()),
                "CONFEDIT_DEFAULT_FORMAT" => self.editor.default_format = value.clone(),
                "CONFEDIT_FOCUS_ON_RESEED" => {
                    self.editor.focus_on_reseed = value.parse().map_err(|_| {
                        ConfEditError::Config(format!(
                            "Invalid boolean in environment variable: {}",
                            value
                        ))
                    })?;
                }
                _ => {
                    // Ignore unknown environment variables
                }
            }
        }
        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        let url = self.lookup.base_url.trim();
        if url.is_empty() {
            return Err(ConfEditError::Config(
                "Lookup base URL must not be empty".to_string(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfEditError::Config(format!(
                "Lookup base URL must be http(s): {}",
                url
            )));
        }

        if self.lookup.timeout_secs == 0 {
            return Err(ConfEditError::Config(
                "Lookup timeout must be at least one second".to_string(),
            ));
        }

        if self.editor.default_format.trim().is_empty() {
            return Err(ConfEditError::Config(
                "Default editor format must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Resource lookup service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:50002".to_string(),
            timeout_secs: 10,
            token: None,
        }
    }
}

/// Editor session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Format used when a configuration carries none
    pub default_format: String,
    /// Return focus to the surface after its content is replaced
    pub focus_on_reseed: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_format: DEFAULT_FORMAT.to_string(),
            focus_on_reseed: true,
        }
    }
}
