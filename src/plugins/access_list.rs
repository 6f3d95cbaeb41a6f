use async_trait::async_trait;

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::{AccessList, DispatchContext};
use crate::infrastructure::storage::JsonStore;
use super::trait_def::CommandHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Whitelist,
    Blacklist,
}

impl ListKind {
    /// Command prefix, e.g. `wl` in `wladd`
    pub fn prefix(&self) -> &'static str {
        match self {
            ListKind::Whitelist => "wl",
            ListKind::Blacklist => "bl",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ListKind::Whitelist => "Whitelist",
            ListKind::Blacklist => "Blacklist",
        }
    }

    fn store<'a>(&self, ctx: &'a BotContext) -> &'a JsonStore<AccessList> {
        match self {
            ListKind::Whitelist => &ctx.whitelist,
            ListKind::Blacklist => &ctx.blacklist,
        }
    }
}

fn entries(n: usize) -> &'static str {
    if n == 1 { "entry" } else { "entries" }
}

/// `<prefix>list|add|rm|enable|disable` over one persisted list
pub struct AccessListHandler {
    kind: ListKind,
}

impl AccessListHandler {
    pub fn new(kind: ListKind) -> Self {
        Self { kind }
    }

    fn render(&self, list: &AccessList) -> String {
        let mut text = format!(
            "{} is {} ({} {})",
            self.kind.title(),
            if list.enabled { "ENABLED" } else { "DISABLED" },
            list.len(),
            entries(list.len())
        );
        for entry in &list.allow {
            text.push_str(&format!("\n• {}", entry));
        }
        text
    }
}

#[async_trait]
impl CommandHandler for AccessListHandler {
    async fn handle(&self, cmd: &DispatchContext, ctx: &BotContext) -> Result<(), BotError> {
        let store = self.kind.store(ctx);
        let action = cmd.command.strip_prefix(self.kind.prefix()).unwrap_or("");
        let title = self.kind.title();

        let reply = match action {
            "list" => self.render(&store.load().await),
            "enable" | "disable" => {
                let enable = action == "enable";
                let current = store.load().await;
                if current.enabled == enable {
                    format!("{} already {}.", title, if enable { "ENABLED" } else { "DISABLED" })
                } else {
                    store.update(|l| l.enabled = enable).await?;
                    format!("{} {}.", title, if enable { "ENABLED" } else { "DISABLED" })
                }
            }
            "add" | "rm" if cmd.args.is_empty() => {
                format!("Usage: {}{}{} <value> [more..]", ctx.prefix, self.kind.prefix(), action)
            }
            "add" => {
                let mut added = 0;
                let list = store
                    .update(|l| added = l.add(cmd.args.iter().map(String::as_str)))
                    .await?;
                format!("Added {} {}. Total: {}", added, entries(added), list.len())
            }
            "rm" => {
                let mut removed = 0;
                let list = store
                    .update(|l| removed = l.remove(cmd.args.iter().map(String::as_str)))
                    .await?;
                format!("Removed {} {}. Total: {}", removed, entries(removed), list.len())
            }
            _ => {
                let p = format!("{}{}", ctx.prefix, self.kind.prefix());
                format!("Usage: {p}list | {p}add <value> | {p}rm <value> | {p}enable | {p}disable")
            }
        };

        ctx.reply(cmd, &reply).await?;
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
    async fn test_add_remove_and_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());
        let handler = AccessListHandler::new(ListKind::Whitelist);

        handler.handle(&owner_line(".wladd 42 Alice 42"), &ctx).await.unwrap();
        handler.handle(&owner_line(".wlrm alice"), &ctx).await.unwrap();
        handler.handle(&owner_line(".wlenable"), &ctx).await.unwrap();
        handler.handle(&owner_line(".wlenable"), &ctx).await.unwrap();

        assert_eq!(
            client.sent_texts(),
            vec![
                "Added 2 entries. Total: 2",
                "Removed 1 entry. Total: 1",
                "Whitelist ENABLED.",
                "Whitelist already ENABLED.",
            ]
        );

        let list = ctx.whitelist.load().await;
        assert!(list.enabled);
        assert!(list.contains(42));
        assert!(ctx.blacklist.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_without_values_shows_usage() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MemoryClient::new(OWNER));
        let ctx = context(dir.path(), client.clone());

        AccessListHandler::new(ListKind::Blacklist)
            .handle(&owner_line(".bladd"), &ctx)
            .await
            .unwrap();
        assert_eq!(client.sent_texts(), vec!["Usage: .bladd <value> [more..]"]);
    }
}
