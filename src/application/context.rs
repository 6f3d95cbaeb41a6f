//! Shared bot context handed to plugin init hooks and handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::{AccessList, DispatchContext, LogRecord, MessageId, Outcome, Settings};
use crate::domain::traits::{Client, CommandLog, ParseMode};
use crate::infrastructure::config::Config;
use crate::infrastructure::plugins::{PluginLoader, PluginRegistry};
use crate::infrastructure::storage::JsonStore;

/// Everything a handler may touch besides its own invocation.
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct BotContext {
    pub client: Arc<dyn Client>,
    pub prefix: String,
    pub owner_id: String,
    pub registry: Arc<PluginRegistry>,
    pub loader: Arc<PluginLoader>,
    pub settings: JsonStore<Settings>,
    pub whitelist: JsonStore<AccessList>,
    pub blacklist: JsonStore<AccessList>,
    pub data_dir: PathBuf,
    pub command_log: Arc<dyn CommandLog>,
}

impl BotContext {
    pub fn new(
        config: &Config,
        client: Arc<dyn Client>,
        loader: Arc<PluginLoader>,
        command_log: Arc<dyn CommandLog>,
    ) -> Self {
        let data_dir = config.storage.directory.clone();
        Self {
            client,
            prefix: config.bot.prefix.clone(),
            owner_id: config.bot.owner_id.clone().unwrap_or_default(),
            registry: loader.registry(),
            loader,
            settings: JsonStore::new(data_dir.join("bot-settings.json")),
            whitelist: JsonStore::new(data_dir.join("whitelist.json")),
            blacklist: JsonStore::new(data_dir.join("blacklist.json")),
            data_dir,
            command_log,
        }
    }

    /// Read the settings fresh from disk; never cached
    pub async fn load_settings(&self) -> Settings {
        self.settings.load_or_init().await
    }

    /// Reply in the chat the command came from
    pub async fn reply(&self, cmd: &DispatchContext, text: &str) -> Result<MessageId, BotError> {
        Ok(self.client.send_text(cmd.peer(), text, ParseMode::Plain).await?)
    }

    pub async fn reply_markdown(&self, cmd: &DispatchContext, text: &str) -> Result<MessageId, BotError> {
        Ok(self.client.send_text(cmd.peer(), text, ParseMode::Markdown).await?)
    }

    /// Emit a dispatch log record to tracing and the command log
    pub fn record(&self, record: LogRecord) {
        match &record.outcome {
            Outcome::Error { detail } => tracing::warn!(
                command = %record.command,
                chat_id = record.chat_id,
                sender_id = record.sender_id,
                response_ms = ?record.response_ms,
                error = %detail,
                "command failed"
            ),
            outcome => tracing::info!(
                command = %record.command,
                chat_id = record.chat_id,
                sender_id = record.sender_id,
                args = ?record.args,
                outcome = outcome.as_str(),
                response_ms = ?record.response_ms,
                "command dispatched"
            ),
        }
        self.command_log.append(&record);
    }
}
