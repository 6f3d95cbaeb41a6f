use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::DispatchContext;
use super::trait_def::CommandHandler;

/// Lists every registered command grouped by category
pub struct MenuHandler;

/// Render the menu body
pub fn render_menu(owner: &str, prefix: &str, groups: &BTreeMap<String, Vec<String>>) -> String {
    let total: usize = groups.values().map(Vec::len).sum();

    let mut text = String::from("🤖 **USERBOT MENU**\n\n");
    text.push_str(&format!("👤 Owner: {}\n", owner));
    text.push_str(&format!("⌨️ Prefix: `{}`\n", prefix));
    text.push_str(&format!("📦 Commands: {}\n", total));

    for (category, commands) in groups {
        text.push_str(&format!("\n**{}**\n", category.to_uppercase()));
        let line = commands
            .iter()
            .map(|c| format!("`{}{}`", prefix, c))
            .collect::<Vec<_>>()
            .join(" ");
        text.push_str(&line);
        text.push('\n');
    }

    text
}

#[async_trait]
impl CommandHandler for MenuHandler {
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        let owner = match ctx.client.get_me().await {
            Ok(me) => me.display_name(),
            Err(e) => {
                tracing::debug!("get_me failed: {}", e);
                "Owner".to_string()
            }
        };

        let groups = ctx.registry.snapshot().by_category();
        let text = render_menu(&owner, &ctx.prefix, &groups);
        ctx.reply_markdown(cmd, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_groups_and_total() {
        let mut groups = BTreeMap::new();
        groups.insert("info".to_string(), vec!["menu".to_string(), "ping".to_string()]);
        groups.insert("owner".to_string(), vec!["bc".to_string()]);

        let text = render_menu("alice", ".", &groups);
        assert!(text.contains("Owner: alice"));
        assert!(text.contains("Commands: 3"));
        assert!(text.contains("**INFO**\n`.menu` `.ping`"));
        assert!(text.find("INFO").unwrap() < text.find("OWNER").unwrap());
    }
}
