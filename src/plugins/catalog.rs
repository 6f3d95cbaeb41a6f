//! Handler catalog - the static table manifests resolve their handler from

use std::collections::HashMap;
use std::sync::Arc;

use crate::infrastructure::config::Config;
use super::access_list::{AccessListHandler, ListKind};
use super::ai::AiChatHandler;
use super::broadcast::{BroadcastHandler, BroadcastOptions};
use super::menu::MenuHandler;
use super::ping::PingHandler;
use super::reload::ReloadHandler;
use super::settings::SettingsHandler;
use super::trait_def::CommandHandler;

/// Builds a fresh handler instance; called once per load cycle
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn CommandHandler> + Send + Sync>;

/// Handler key to factory
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, H>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: CommandHandler + 'static,
    {
        let key = key.into();
        let factory: HandlerFactory = Arc::new(move || Arc::new(factory()) as Arc<dyn CommandHandler>);
        if self.factories.insert(key.clone(), factory).is_some() {
            tracing::warn!("Handler '{}' registered twice, keeping the latest", key);
        }
    }

    pub fn with<F, H>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: CommandHandler + 'static,
    {
        self.register(key, factory);
        self
    }

    pub fn create(&self, key: &str) -> Option<Arc<dyn CommandHandler>> {
        self.factories.get(key).map(|factory| factory())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Every handler shipped with the bot
pub fn builtin_catalog(config: &Config) -> HandlerCatalog {
    let ai = config.ai.clone();
    let broadcast = BroadcastOptions::from(&config.broadcast);

    HandlerCatalog::new()
        .with("ping", || PingHandler)
        .with("menu", || MenuHandler)
        .with("settings", || SettingsHandler)
        .with("whitelist", || AccessListHandler::new(ListKind::Whitelist))
        .with("blacklist", || AccessListHandler::new(ListKind::Blacklist))
        .with("broadcast", move || BroadcastHandler::new(broadcast.clone()))
        .with("ai", move || AiChatHandler::new(&ai))
        .with("reload", || ReloadHandler)
}

/// Manifests written by `init-config`, as (relative path, YAML)
pub fn default_manifests() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "info/ping.yaml",
            "name: ping\ncategory: info\ndescription: Measure round-trip latency\ncommands: [ping]\naccess: all\nhandler: ping\n",
        ),
        (
            "info/menu.yaml",
            "name: menu\ncategory: info\ndescription: List every command by category\ncommands: [menu, help, start]\naccess: all\nhandler: menu\n",
        ),
        (
            "owner/settings.yaml",
            "name: bot-settings\ncategory: owner\ndescription: Show and change global operating flags\ncommands: [settings, set, config, mode]\naccess: owner\nhandler: settings\n",
        ),
        (
            "admin/whitelist.yaml",
            "name: whitelist-manager\ncategory: admin\ncommands: [wllist, wladd, wlrm, wlenable, wldisable]\naccess: owner\nhandler: whitelist\n",
        ),
        (
            "owner/blacklist.yaml",
            "name: blacklist-manager\ncategory: owner\ncommands: [bllist, bladd, blrm, blenable, bldisable]\naccess: owner\nhandler: blacklist\n",
        ),
        (
            "owner/broadcast.yaml",
            "name: broadcast\ncategory: owner\ndescription: Send a message to many dialogs\ncommands: [broadcast, bc]\naccess: owner\nhandler: broadcast\n",
        ),
        (
            "owner/reload.yaml",
            "name: reload\ncategory: owner\ncommands: [reload]\naccess: owner\nhandler: reload\n",
        ),
        (
            "ai/chat.yaml",
            "name: ai-chat\ncategory: ai\ndescription: Ask the AI a question\ncommands: [ai, ask, chat]\naccess: all\nhandler: ai\n",
        ),
    ]
}
