//! Identity of the configuration document bound to the editor

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfEditError;

/// Format used when a configuration does not declare one
pub const DEFAULT_FORMAT: &str = "toml";

/// Identifies which configuration document is being edited.
///
/// Any field change means a different document, so the editor session bound
/// to the previous identity has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationIdentity {
    pub environment: String,
    pub zone: String,
    pub app_name: String,
    pub file_name: String,
    pub format: Option<String>,
}

impl ConfigurationIdentity {
    /// Create a new identity without an explicit format
    pub fn new(
        environment: impl Into<String>,
        zone: impl Into<String>,
        app_name: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            zone: zone.into(),
            app_name: app_name.into(),
            file_name: file_name.into(),
            format: None,
        }
    }

    /// Set the document format
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Format of the document, falling back to `fallback` when unset or empty
    pub fn format_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.format
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(fallback)
    }
}

impl std::fmt::Display for ConfigurationIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.environment, self.zone, self.app_name, self.file_name
        )
    }
}

/// The currently selected configuration together with its stored text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundConfiguration {
    pub identity: ConfigurationIdentity,
    pub content: String,
}

impl BoundConfiguration {
    pub fn new(identity: ConfigurationIdentity, content: impl Into<String>) -> Self {
        Self {
            identity,
            content: content.into(),
        }
    }
}

/// Editing modes of the configuration page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Plain code editing
    #[default]
    Code,
    /// Side-by-side comparison against a published version
    Diff,
}

impl std::fmt::Display for EditorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorMode::Code => write!(f, "code"),
            EditorMode::Diff => write!(f, "diff"),
        }
    }
}

impl FromStr for EditorMode {
    type Err = ConfEditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(EditorMode::Code),
            "diff" => Ok(EditorMode::Diff),
            other => Err(ConfEditError::state(format!("Unknown editor mode: {}", other))),
        }
    }
}
