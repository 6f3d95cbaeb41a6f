use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a chat, group or channel on the remote protocol
pub type PeerId = i64;

/// Identifier of a single message inside a peer
pub type MessageId = i64;

/// Classification of the chat an event arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

impl ChatKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Channel => "channel",
        }
    }
}

/// The chat an inbound event belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: PeerId,
    pub title: Option<String>,
    pub kind: ChatKind,
}

impl Chat {
    pub fn private(id: PeerId) -> Self {
        Self { id, title: None, kind: ChatKind::Private }
    }

    pub fn group(id: PeerId, title: impl Into<String>) -> Self {
        Self { id, title: Some(title.into()), kind: ChatKind::Group }
    }

    pub fn channel(id: PeerId, title: impl Into<String>) -> Self {
        Self { id, title: Some(title.into()), kind: ChatKind::Channel }
    }
}

/// Author of an inbound event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sender {
    pub id: i64,
    pub name: Option<String>,
}

impl Sender {
    pub fn new(id: i64) -> Self {
        Self { id, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// An inbound message event as delivered by the protocol client
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub message_id: MessageId,
    pub text: Option<String>,
    pub chat: Chat,
    pub sender: Sender,
    /// Message this one replies to, used by plugins to locate attached media
    pub reply_to: Option<MessageId>,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(chat: Chat, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            message_id: 0,
            text: Some(text.into()),
            chat,
            sender,
            reply_to: None,
            timestamp: Utc::now(),
        }
    }

    /// An event without text (media, service messages)
    pub fn without_text(chat: Chat, sender: Sender) -> Self {
        Self {
            message_id: 0,
            text: None,
            chat,
            sender,
            reply_to: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message_id(mut self, id: MessageId) -> Self {
        self.message_id = id;
        self
    }

    pub fn with_reply_to(mut self, id: MessageId) -> Self {
        self.reply_to = Some(id);
        self
    }

    pub fn is_private(&self) -> bool {
        self.chat.kind == ChatKind::Private
    }
}
