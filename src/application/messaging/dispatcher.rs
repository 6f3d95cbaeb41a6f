//! Command dispatcher - Routes inbound events to registered handlers

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::application::context::BotContext;
use crate::domain::entities::{DispatchContext, InboundEvent, LogRecord, Outcome};
use super::guard::Invocation;
use super::parser::CommandParser;
use super::policy;

const DEFAULT_CATEGORY: &str = "misc";

/// Per-event pipeline: prefix match, tokenize, policy, lookup, invoke, log
pub struct CommandDispatcher {
    parser: CommandParser,
    ctx: BotContext,
}

impl CommandDispatcher {
    pub fn new(ctx: BotContext) -> Self {
        Self {
            parser: CommandParser::new(ctx.prefix.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Process one inbound event.
    ///
    /// Returns None when the event is not a command at all; otherwise the
    /// outcome that was logged for it. Handler failures never escape.
    pub async fn dispatch(&self, event: InboundEvent) -> Option<Outcome> {
        let received_at = Instant::now();
        let parsed = self.parser.parse(event.text.as_deref()?)?;

        let settings = self.ctx.load_settings().await;
        if !policy::should_process(&event, &self.ctx.owner_id, &settings) {
            self.ctx.record(
                LogRecord::new(&event, &parsed.command, &parsed.args, Outcome::BlockedByPolicy)
                    .with_response_time(received_at.elapsed()),
            );
            return Some(Outcome::BlockedByPolicy);
        }

        let Some(entry) = self.ctx.registry.lookup(&parsed.command) else {
            self.ctx.record(
                LogRecord::new(&event, &parsed.command, &parsed.args, Outcome::UnknownCommand)
                    .with_response_time(received_at.elapsed()),
            );
            return Some(Outcome::UnknownCommand);
        };

        let cmd = DispatchContext {
            event,
            text: parsed.text,
            command: parsed.command,
            args: parsed.args,
            category: entry
                .categories
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            received_at,
        };

        // Run on its own task so a panicking handler is contained like an error.
        // The handler keeps its own Arc, so a concurrent reload cannot pull it away.
        let handler = entry.handler.clone();
        let ctx = self.ctx.clone();
        let task_cmd = cmd.clone();
        let joined = tokio::spawn(async move { handler.invoke(&task_cmd, &ctx).await }).await;

        let outcome = match joined {
            Ok(Ok(Invocation::Completed)) => Outcome::Ok,
            // The guard has already replied and logged
            Ok(Ok(Invocation::Denied)) => return Some(Outcome::AccessDenied),
            Ok(Err(e)) => Outcome::error(e.to_string()),
            Err(e) if e.is_panic() => Outcome::error("handler panicked"),
            Err(e) => Outcome::error(e.to_string()),
        };

        self.ctx.record(
            LogRecord::new(&cmd.event, &cmd.command, &cmd.args, outcome.clone())
                .with_response_time(cmd.elapsed()),
        );
        Some(outcome)
    }

    /// Consume events serially, letting each handler run concurrently.
    ///
    /// Returns once the event source closes.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<InboundEvent>) {
        tracing::info!("Dispatcher listening with prefix \"{}\"", self.parser.prefix());
        while let Some(event) = events.recv().await {
            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                dispatcher.dispatch(event).await;
            });
        }
        tracing::info!("Event source closed, dispatcher stopped");
    }
}
