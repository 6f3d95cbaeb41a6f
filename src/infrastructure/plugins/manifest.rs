//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::application::errors::PluginError;

/// Raw plugin manifest as written on disk.
///
/// Every field is optional here so a malformed file is reported by what it
/// lacks instead of by a parse error; the loader decides what is required.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Plugin name (required)
    pub name: Option<String>,

    /// Menu category, "misc" when absent
    pub category: Option<String>,

    pub description: Option<String>,

    /// Command names and aliases (required, non-empty)
    #[serde(default)]
    pub commands: Vec<String>,

    /// "owner" or "all", "all" when absent
    pub access: Option<String>,

    /// Key into the handler catalog (required)
    pub handler: Option<String>,
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Load(format!("Failed to read manifest: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, PluginError> {
        serde_yaml::from_str(content)
            .map_err(|e| PluginError::Load(format!("Failed to parse manifest: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, PluginError> {
        serde_yaml::to_string(self)
            .map_err(|e| PluginError::Internal(format!("Failed to serialize manifest: {}", e)))
    }
}
