//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub storage: StorageConfig,
    pub audit: AuditConfig,
    pub ai: AiConfig,
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    /// Sender id allowed to run owner commands; required to start
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub hot_reload: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AiConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BroadcastConfig {
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub max_flood_wait_seconds: u64,
    pub confirm_timeout_seconds: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "userbot".to_string(),
            prefix: ".".to_string(),
            owner_id: None,
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            hot_reload: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./config"),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("./logs"),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://whatsthebigdata.com/api/ask-ai/".to_string(),
            model: "perplexity-ai".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause_ms: 2000,
            max_flood_wait_seconds: 30,
            confirm_timeout_seconds: 120,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl BroadcastConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn flood_ceiling(&self) -> Duration {
        Duration::from_secs(self.max_flood_wait_seconds)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_seconds)
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// File (if present) overlaid with the environment. A file that exists
    /// but cannot be read or parsed is an error, never a silent fallback.
    pub fn load_layered(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::load_env());
        }
        let mut config = Self::load(path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(prefix) = std::env::var("COMMAND_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(owner) = std::env::var("OWNER_ID") {
            self.bot.owner_id = Some(owner);
        }

        if let Ok(dir) = std::env::var("PLUGIN_DIR") {
            self.plugins.directory = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("DATA_DIR") {
            self.storage.directory = PathBuf::from(dir);
        }
    }

    /// Check startup preconditions. A missing owner is fatal rather than
    /// silently meaning "everyone" or "no one".
    pub fn validate(&self) -> Result<(), ConfigError> {
        let owner = self.bot.owner_id.as_deref().map(str::trim).unwrap_or_default();
        if owner.is_empty() {
            return Err(ConfigError::MissingField("bot.owner-id".to_string()));
        }
        if owner.parse::<i64>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "bot.owner-id must be a numeric sender id, got '{}'",
                owner
            )));
        }
        if self.bot.prefix.is_empty() || self.bot.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(
                "bot.prefix must be non-empty and contain no whitespace".to_string(),
            ));
        }
        if self.broadcast.batch_size == 0 {
            return Err(ConfigError::InvalidValue("broadcast.batch-size must be at least 1".to_string()));
        }
        Ok(())
    }
}
