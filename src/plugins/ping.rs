use async_trait::async_trait;
use std::time::Instant;

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::DispatchContext;
use crate::domain::traits::ParseMode;
use super::trait_def::CommandHandler;

/// Replies "Pinging..." and edits it into the measured latency
pub struct PingHandler;

#[async_trait]
impl CommandHandler for PingHandler {
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        let peer = cmd.peer();
        let start = Instant::now();

        let sent = ctx.client.send_text(peer, "Pinging...", ParseMode::Plain).await;
        let pong = format!("Pong! `{}ms`", start.elapsed().as_millis());

        let edited = match sent {
            Ok(id) => ctx.client.edit_text(peer, id, &pong, ParseMode::Markdown).await,
            Err(e) => Err(e),
        };

        if let Err(e) = edited {
            tracing::debug!("ping edit failed, sending fresh reply: {}", e);
            let pong = format!("Pong! `{}ms`", start.elapsed().as_millis());
            ctx.client.send_text(peer, &pong, ParseMode::Markdown).await?;
        }
        Ok(())
    }
}
