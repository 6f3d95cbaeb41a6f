//! Handler trait definition

use async_trait::async_trait;
use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::DispatchContext;

/// Contract every plugin handler satisfies.
///
/// Handlers never check access themselves; the loader wraps them in a guard.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Called once each time the plugin is loaded or reloaded
    async fn init(&self, _ctx: &BotContext) -> Result<(), BotError> {
        Ok(())
    }

    /// Handle one invocation of any of the plugin's commands
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError>;
}
