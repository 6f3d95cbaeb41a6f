//! Access guard - the single enforcement point for per-command access levels
//!
//! The loader wraps every raw handler in a `GuardedHandler` before it reaches
//! the registry, so plugin code never re-implements owner checks.

use std::sync::Arc;

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::{AccessLevel, DispatchContext, LogRecord, Outcome};
use crate::plugins::CommandHandler;
use super::policy;

/// Reply sent when a non-owner calls an owner-only command
pub const ACCESS_DENIED_REPLY: &str = "❌ Access denied: this command is for the owner only.";

/// What happened when a guarded handler was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// The raw handler ran to completion
    Completed,
    /// The caller failed the access check; already replied and logged
    Denied,
}

/// A raw handler together with the access level of its plugin
pub struct GuardedHandler {
    plugin: String,
    access: AccessLevel,
    inner: Arc<dyn CommandHandler>,
}

impl GuardedHandler {
    pub fn new(plugin: impl Into<String>, access: AccessLevel, inner: Arc<dyn CommandHandler>) -> Self {
        Self {
            plugin: plugin.into(),
            access,
            inner,
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    /// Check access, then run the raw handler
    pub async fn invoke(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<Invocation, BotError> {
        if !policy::may_invoke(self.access, &cmd.event, &ctx.owner_id) {
            if let Err(e) = ctx.reply(cmd, ACCESS_DENIED_REPLY).await {
                tracing::warn!("[{}] Failed to send access denied reply: {}", self.plugin, e);
            }
            ctx.record(
                LogRecord::new(&cmd.event, &cmd.command, &cmd.args, Outcome::AccessDenied)
                    .with_response_time(cmd.elapsed()),
            );
            return Ok(Invocation::Denied);
        }

        self.inner.handle(cmd, ctx).await?;
        Ok(Invocation::Completed)
    }
}

impl std::fmt::Debug for GuardedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedHandler")
            .field("plugin", &self.plugin)
            .field("access", &self.access)
            .finish()
    }
}
