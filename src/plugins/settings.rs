use async_trait::async_trait;

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::{DispatchContext, Mode, Settings};
use super::trait_def::CommandHandler;

/// Shows and updates the persisted operating flags
pub struct SettingsHandler;

fn flag(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_mode(value: &str) -> Option<Mode> {
    match value.to_lowercase().as_str() {
        "self" => Some(Mode::SelfOnly),
        "public" => Some(Mode::Public),
        _ => None,
    }
}

pub fn render_settings(settings: &Settings, prefix: &str) -> String {
    format!(
        "🤖 **Bot Settings** {status_icon}\n\n\
         {private_icon} **Private Chat Only:** {private}\n\
         {owner_icon} **Owner Only Mode:** {owner}\n\
         🛡 **Mode:** {mode}\n\
         {status_icon} **Bot Status:** {status}\n\n\
         **Usage:**\n\
         `{p}set private on/off` - Only respond in private chats\n\
         `{p}set owner on/off` - Only respond to the owner\n\
         `{p}set enable on/off` - Enable or disable the bot\n\
         `{p}set mode self/public` - Owner-only or public mode\n\
         `{p}set reset` - Reset to defaults",
        status_icon = if settings.enabled { "✅" } else { "❌" },
        private_icon = if settings.private_chat_only { "🔒" } else { "🌐" },
        private = flag(settings.private_chat_only),
        owner_icon = if settings.owner_only { "👑" } else { "👥" },
        owner = flag(settings.owner_only),
        mode = settings.mode,
        status = if settings.enabled { "ACTIVE" } else { "DISABLED" },
        p = prefix,
    )
}

impl SettingsHandler {
    async fn show(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        let settings = ctx.load_settings().await;
        ctx.reply_markdown(cmd, &render_settings(&settings, &ctx.prefix)).await?;
        Ok(())
    }

    async fn set_mode(&self, cmd: &DispatchContext, ctx: &BotContext, value: &str) -> Result<(), BotError> {
        let Some(mode) = parse_mode(value) else {
            ctx.reply(cmd, "❌ Mode must be self or public").await?;
            return Ok(());
        };
        ctx.settings.update(|s| s.mode = mode).await?;
        tracing::info!("Bot mode set to {}", mode);
        ctx.reply(cmd, &format!("✅ Mode set to {}", mode)).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for SettingsHandler {
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        if cmd.command == "mode" {
            return match cmd.args.first() {
                Some(value) => self.set_mode(cmd, ctx, value).await,
                None => self.show(cmd, ctx).await,
            };
        }

        if cmd.command != "set" || cmd.args.is_empty() {
            return self.show(cmd, ctx).await;
        }

        let setting = cmd.args[0].to_lowercase();
        if setting == "reset" {
            let defaults = Settings::default();
            ctx.settings.save(&defaults).await?;
            let text = format!("✅ Settings reset to defaults.\n\n{}", render_settings(&defaults, &ctx.prefix));
            ctx.reply_markdown(cmd, &text).await?;
            return Ok(());
        }

        let Some(value) = cmd.args.get(1) else {
            let usage = format!("❌ Usage: {}set {} <value>", ctx.prefix, setting);
            ctx.reply(cmd, &usage).await?;
            return Ok(());
        };

        if setting == "mode" {
            return self.set_mode(cmd, ctx, value).await;
        }

        let Some(on) = parse_switch(value) else {
            ctx.reply(cmd, "❌ Value must be on or off").await?;
            return Ok(());
        };

        let (label, updated) = match setting.as_str() {
            "private" => ("Private Chat Only", ctx.settings.update(|s| s.private_chat_only = on).await?),
            "owner" => ("Owner Only Mode", ctx.settings.update(|s| s.owner_only = on).await?),
            "enable" | "enabled" => ("Bot Status", ctx.settings.update(|s| s.enabled = on).await?),
            other => {
                ctx.reply(cmd, &format!("❌ Unknown setting: {}", other)).await?;
                return Ok(());
            }
        };

        tracing::info!(setting = %setting, on, "Settings updated");
        let mut text = format!("✅ {} set to {}", label, flag(on));
        if !updated.enabled {
            text.push_str("\n\n⚠️ The bot ignores every command while disabled. Edit bot-settings.json to turn it back on.");
        }
        ctx.reply(cmd, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::domain::entities::{Chat, InboundEvent, Sender};
    use crate::infrastructure::adapters::MemoryClient;
    use crate::plugins::testing::{context, invocation, OWNER};

    fn owner_line(line: &str) -> DispatchContext {
        invocation(InboundEvent::new(Chat::private(OWNER), Sender::new(OWNER), line))
    }

    #[tokio::test]
    async fn test_set_private_persists() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());

        SettingsHandler.handle(&owner_line(".set private on"), &ctx).await.unwrap();

        let settings = ctx.load_settings().await;
        assert!(settings.private_chat_only);
        assert!(settings.enabled);
        assert_eq!(client.sent_texts(), vec!["✅ Private Chat Only set to ON"]);
    }

    #[tokio::test]
    async fn test_mode_command() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());

        SettingsHandler.handle(&owner_line(".mode self"), &ctx).await.unwrap();
        assert_eq!(ctx.load_settings().await.mode, Mode::SelfOnly);

        SettingsHandler.handle(&owner_line(".set mode public"), &ctx).await.unwrap();
        assert_eq!(ctx.load_settings().await.mode, Mode::Public);
    }

    #[tokio::test]
    async fn test_unknown_setting_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());

        SettingsHandler.handle(&owner_line(".set colour on"), &ctx).await.unwrap();
        assert_eq!(client.sent_texts(), vec!["❌ Unknown setting: colour"]);
        assert_eq!(ctx.load_settings().await, Settings::default());
    }

    #[tokio::test]
    async fn test_show_renders_current_values() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());

        SettingsHandler.handle(&owner_line(".settings"), &ctx).await.unwrap();
        let text = &client.sent_texts()[0];
        assert!(text.contains("**Private Chat Only:** OFF"));
        assert!(text.contains("**Mode:** public"));
    }
}
