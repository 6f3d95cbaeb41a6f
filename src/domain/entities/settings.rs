use serde::{Deserialize, Serialize};
use std::fmt;

/// Global operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Commands are processed for the owner only
    #[serde(rename = "self")]
    SelfOnly,
    /// Any sender, subject to per-command access levels
    #[default]
    Public,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::SelfOnly => f.write_str("self"),
            Mode::Public => f.write_str("public"),
        }
    }
}

/// Persisted global operating flags.
///
/// Missing keys fall back to their defaults and unknown keys are ignored,
/// so older or newer files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    pub mode: Mode,
    pub private_chat_only: bool,
    pub owner_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: Mode::Public,
            private_chat_only: false,
            owner_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"ownerOnly": true}"#).unwrap();
        assert!(settings.owner_only);
        assert!(settings.enabled);
        assert_eq!(settings.mode, Mode::Public);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let settings: Settings =
            serde_json::from_str(r#"{"enabled": false, "theme": "dark", "mode": "self"}"#).unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.mode, Mode::SelfOnly);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["privateChatOnly"], false);
        assert_eq!(json["mode"], "public");
    }
}
