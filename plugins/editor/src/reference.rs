//! Resource references and `{{name@version}}` placeholders

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::{EditorError, EditorResult};

/// A `name[@version]` reference to a resource.
///
/// A reference without a version is ambiguous; the lookup service picks the
/// version, not this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceReference {
    raw: String,
    name: String,
    version: Option<String>,
}

impl ResourceReference {
    /// Parse a reference, rejecting empty or malformed input
    pub fn parse(raw: &str) -> EditorResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(EditorError::InvalidReference(raw.to_string()));
        }

        let (name, version) = match trimmed.split_once('@') {
            Some((name, version)) => {
                if version.is_empty() || version.contains('@') {
                    return Err(EditorError::InvalidReference(raw.to_string()));
                }
                (name, Some(version.to_string()))
            }
            None => (trimmed, None),
        };

        if name.is_empty() {
            return Err(EditorError::InvalidReference(raw.to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            name: name.to_string(),
            version,
        })
    }

    /// Resource name with any version suffix stripped
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// True when no version was given
    pub fn is_ambiguous(&self) -> bool {
        self.version.is_none()
    }

    /// The reference as it was written, without surrounding whitespace
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What the insert-resource dialog hands back on confirm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSelection {
    pub resource: String,
}

impl ResourceSelection {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }
}

/// A resource dependency declared by a configuration through a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub name: String,
    pub version: u32,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Names are ASCII word characters and dashes only
        Regex::new(r"\{\{[A-Za-z0-9_\-]*@[0-9]+\}\}")
            .expect("placeholder pattern is a valid regex")
    })
}

/// Find every `{{name@version}}` placeholder in configuration text
pub fn scan_placeholders(content: &str) -> Vec<String> {
    placeholder_pattern()
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse the resources a configuration depends on, with their versions.
///
/// Placeholders whose version does not fit a `u32` are skipped.
pub fn parse_resource_items(content: &str) -> Vec<ResourceItem> {
    let mut items = Vec::new();

    for placeholder in scan_placeholders(content) {
        let inner = placeholder
            .trim_start_matches("{{")
            .trim_end_matches("}}");

        let Some((name, version)) = inner.split_once('@') else {
            continue;
        };

        match version.parse::<u32>() {
            Ok(version) => items.push(ResourceItem {
                name: name.to_string(),
                version,
            }),
            Err(e) => {
                tracing::error!("Failed to parse version of {}: {}", placeholder, e);
            }
        }
    }

    items
}
