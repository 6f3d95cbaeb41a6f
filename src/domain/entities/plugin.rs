use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who may invoke the commands of a plugin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Only the configured owner
    Owner,
    /// Anyone that passes the global policy
    #[default]
    All,
}

impl AccessLevel {
    pub fn as_str(&self) -> &str {
        match self {
            AccessLevel::Owner => "owner",
            AccessLevel::All => "all",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(AccessLevel::Owner),
            "all" => Ok(AccessLevel::All),
            other => Err(format!("unknown access level '{}'", other)),
        }
    }
}
