use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::domain::entities::{ChatKind, InboundEvent, MessageId, PeerId, Sender};
use crate::application::errors::ClientError;

/// Client trait - the opaque messaging-protocol capability handlers call into.
///
/// The wire protocol and session handling live behind this seam.
#[async_trait]
pub trait Client: Send + Sync {
    /// Account the client is logged in as
    async fn get_me(&self) -> Result<Sender, ClientError>;

    /// Send a text message, returning its id
    async fn send_text(&self, peer: PeerId, text: &str, mode: ParseMode) -> Result<MessageId, ClientError>;

    /// Replace the text of a previously sent message
    async fn edit_text(&self, peer: PeerId, message: MessageId, text: &str, mode: ParseMode) -> Result<(), ClientError>;

    async fn delete(&self, peer: PeerId, messages: &[MessageId]) -> Result<(), ClientError>;

    /// Download the media attached to a message
    async fn download_media(&self, peer: PeerId, message: MessageId) -> Result<Vec<u8>, ClientError>;

    /// Upload raw bytes, returning a handle that can be sent to any peer
    async fn upload_file(&self, name: &str, bytes: Vec<u8>) -> Result<RemoteFile, ClientError>;

    /// Send a previously uploaded file with an optional caption
    async fn send_file(&self, peer: PeerId, file: &RemoteFile, caption: &str, mode: ParseMode) -> Result<MessageId, ClientError>;

    async fn list_dialogs(&self) -> Result<Vec<Dialog>, ClientError>;

    /// Register an ad-hoc listener for follow-up events.
    ///
    /// Dropping the returned subscription unregisters it.
    fn subscribe(&self, matcher: EventMatcher) -> Subscription;
}

/// Text formatting applied by the remote side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Plain,
    Markdown,
}

/// A peer the account has a conversation with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub id: PeerId,
    pub title: String,
    pub kind: ChatKind,
}

impl Dialog {
    pub fn new(id: PeerId, title: impl Into<String>, kind: ChatKind) -> Self {
        Self { id, title: title.into(), kind }
    }

    pub fn is_group(&self) -> bool {
        self.kind == ChatKind::Group
    }

    pub fn is_channel(&self) -> bool {
        self.kind == ChatKind::Channel
    }

    pub fn is_user(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

/// Handle to an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub size: usize,
}

/// Selects which inbound events a subscription receives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMatcher {
    pub chat: Option<PeerId>,
    pub sender: Option<i64>,
    pub reply_to: Option<MessageId>,
}

impl EventMatcher {
    pub fn in_chat(chat: PeerId) -> Self {
        Self { chat: Some(chat), ..Self::default() }
    }

    pub fn from_sender(mut self, sender: i64) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn replying_to(mut self, message: MessageId) -> Self {
        self.reply_to = Some(message);
        self
    }

    pub fn matches(&self, event: &InboundEvent) -> bool {
        self.chat.map_or(true, |c| c == event.chat.id)
            && self.sender.map_or(true, |s| s == event.sender.id)
            && self.reply_to.map_or(true, |r| event.reply_to == Some(r))
    }
}

/// Receiving end of a follow-up listener
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<InboundEvent>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<InboundEvent>) -> Self {
        Self { rx }
    }

    /// Next matching event, or None once the client has shut down
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        self.rx.recv().await
    }
}
