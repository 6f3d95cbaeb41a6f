//! Built-in command handlers
//! 
//! Manifests in the plugin directory refer to these by catalog key.

pub mod access_list;
pub mod ai;
pub mod broadcast;
pub mod catalog;
pub mod menu;
pub mod ping;
pub mod reload;
pub mod settings;
pub mod trait_def;

pub use catalog::{builtin_catalog, default_manifests, HandlerCatalog, HandlerFactory};
pub use trait_def::CommandHandler;

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Instant;

    use crate::application::context::BotContext;
    use crate::application::messaging::CommandParser;
    use crate::domain::entities::{DispatchContext, InboundEvent};
    use crate::infrastructure::adapters::MemoryClient;
    use crate::infrastructure::config::Config;
    use crate::infrastructure::plugins::PluginLoader;
    use crate::infrastructure::storage::MemoryCommandLog;
    use super::builtin_catalog;

    pub const OWNER: i64 = 1;

    /// Context rooted in `dir`, owned by [`OWNER`]
    pub fn context(dir: &Path, client: Arc<MemoryClient>) -> BotContext {
        let mut config = Config::default();
        config.bot.owner_id = Some(OWNER.to_string());
        config.storage.directory = dir.to_path_buf();
        config.plugins.directory = dir.join("plugins");
        config.broadcast.batch_pause_ms = 0;
        let loader = Arc::new(PluginLoader::new(&config.plugins.directory, builtin_catalog(&config)));
        BotContext::new(&config, client, loader, Arc::new(MemoryCommandLog::new()))
    }

    pub fn invocation(event: InboundEvent) -> DispatchContext {
        let text = event.text.clone().unwrap_or_default();
        let parsed = CommandParser::new(".").parse(&text).expect("test line must be a command");
        DispatchContext {
            event,
            text: parsed.text,
            command: parsed.command,
            args: parsed.args,
            category: "test".to_string(),
            received_at: Instant::now(),
        }
    }
}
