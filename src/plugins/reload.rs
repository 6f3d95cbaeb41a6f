use async_trait::async_trait;

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::DispatchContext;
use super::trait_def::CommandHandler;

/// Owner-triggered full plugin reload
pub struct ReloadHandler;

#[async_trait]
impl CommandHandler for ReloadHandler {
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        let report = ctx.loader.reload(ctx).await?;

        let mut text = format!(
            "♻️ Reloaded {} plugins, {} commands.",
            report.plugins.len(),
            report.commands
        );
        if !report.rejected.is_empty() {
            text.push_str(&format!("\n\n⚠️ Rejected {}:", report.rejected.len()));
            for rejection in &report.rejected {
                let file = rejection
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                text.push_str(&format!("\n• {}: {}", file, rejection.reason));
            }
        }

        ctx.reply(cmd, &text).await?;
        Ok(())
    }
}
