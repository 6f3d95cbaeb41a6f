//! Console adapter for development/testing
//!
//! Every stdin line becomes an event from the owner in a private chat.
//! Prefix a line with `^<id> ` to send it as a reply to message `<id>`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::ClientError;
use crate::domain::entities::{Chat, ChatKind, InboundEvent, MessageId, PeerId, Sender};
use crate::domain::traits::{Client, Dialog, EventMatcher, ParseMode, RemoteFile, Subscription};
use super::SubscriberSet;

/// Console client adapter for local development
pub struct ConsoleAdapter {
    me: Sender,
    next_id: AtomicI64,
    dialogs: Vec<Dialog>,
    subscribers: SubscriberSet,
}

impl ConsoleAdapter {
    pub fn new(owner_id: i64) -> Self {
        Self {
            me: Sender::new(owner_id).with_name("console"),
            next_id: AtomicI64::new(1),
            dialogs: vec![
                Dialog::new(owner_id, "Saved Messages", ChatKind::Private),
                Dialog::new(-100, "Console Group", ChatKind::Group),
                Dialog::new(-200, "Console Channel", ChatKind::Channel),
            ],
            subscribers: SubscriberSet::new(),
        }
    }

    fn next_id(&self) -> MessageId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Turn one input line into an inbound event
    pub fn event_from_line(&self, line: &str) -> InboundEvent {
        let chat = Chat::private(self.me.id);
        let (reply_to, text) = match line.strip_prefix('^') {
            Some(rest) => {
                let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
                (id.parse::<MessageId>().ok(), text)
            }
            None => (None, line),
        };

        let mut event = InboundEvent::new(chat, self.me.clone(), text).with_message_id(self.next_id());
        event.reply_to = reply_to;
        event
    }

    /// Start reading stdin. Events go to subscribers first, then to the
    /// returned channel. The channel closes on EOF.
    pub fn spawn_reader(self: &Arc<Self>) -> mpsc::Receiver<InboundEvent> {
        let (tx, rx) = mpsc::channel(64);
        let adapter = Arc::clone(self);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let event = adapter.event_from_line(line);
                        println!("[YOU #{}] {}", event.message_id, line);
                        adapter.subscribers.publish(&event);
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });

        rx
    }
}

#[async_trait]
impl Client for ConsoleAdapter {
    async fn get_me(&self) -> Result<Sender, ClientError> {
        Ok(self.me.clone())
    }

    async fn send_text(&self, peer: PeerId, text: &str, _mode: ParseMode) -> Result<MessageId, ClientError> {
        let id = self.next_id();
        println!("[BOT #{} -> {}] {}", id, peer, text);
        Ok(id)
    }

    async fn edit_text(&self, peer: PeerId, message: MessageId, text: &str, _mode: ParseMode) -> Result<(), ClientError> {
        println!("[BOT #{} -> {} edited] {}", message, peer, text);
        Ok(())
    }

    async fn delete(&self, peer: PeerId, messages: &[MessageId]) -> Result<(), ClientError> {
        println!("[BOT -> {}] deleted {:?}", peer, messages);
        Ok(())
    }

    async fn download_media(&self, _peer: PeerId, message: MessageId) -> Result<Vec<u8>, ClientError> {
        Err(ClientError::NotFound(format!("message #{} has no media on the console", message)))
    }

    async fn upload_file(&self, name: &str, bytes: Vec<u8>) -> Result<RemoteFile, ClientError> {
        Ok(RemoteFile {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            size: bytes.len(),
        })
    }

    async fn send_file(&self, peer: PeerId, file: &RemoteFile, caption: &str, _mode: ParseMode) -> Result<MessageId, ClientError> {
        let id = self.next_id();
        println!("[BOT #{} -> {}] [file {} ({} bytes)] {}", id, peer, file.name, file.size, caption);
        Ok(id)
    }

    async fn list_dialogs(&self) -> Result<Vec<Dialog>, ClientError> {
        Ok(self.dialogs.clone())
    }

    fn subscribe(&self, matcher: EventMatcher) -> Subscription {
        self.subscribers.subscribe(matcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_syntax() {
        let adapter = ConsoleAdapter::new(99);
        let event = adapter.event_from_line("^12 yes");
        assert_eq!(event.reply_to, Some(12));
        assert_eq!(event.text.as_deref(), Some("yes"));
        assert_eq!(event.sender.id, 99);
        assert!(event.is_private());
    }

    #[test]
    fn test_plain_line() {
        let adapter = ConsoleAdapter::new(99);
        let first = adapter.event_from_line(".ping");
        let second = adapter.event_from_line(".menu");
        assert_eq!(first.reply_to, None);
        assert!(second.message_id > first.message_id);
    }
}
