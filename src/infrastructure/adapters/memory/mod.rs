//! In-memory client that records every outbound call

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use crate::application::errors::ClientError;
use crate::domain::entities::{InboundEvent, MessageId, PeerId, Sender};
use crate::domain::traits::{Client, Dialog, EventMatcher, ParseMode, RemoteFile, Subscription};
use super::SubscriberSet;

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text { peer: PeerId, id: MessageId, text: String, mode: ParseMode },
    Edit { peer: PeerId, message: MessageId, text: String },
    Delete { peer: PeerId, messages: Vec<MessageId> },
    File { peer: PeerId, id: MessageId, file: RemoteFile, caption: String },
}

/// Scriptable client for tests and dry runs
pub struct MemoryClient {
    me: Sender,
    next_id: AtomicI64,
    outbound: Mutex<Vec<Outbound>>,
    dialogs: Mutex<Vec<Dialog>>,
    media: Mutex<HashMap<(PeerId, MessageId), Vec<u8>>>,
    send_failures: Mutex<HashMap<PeerId, VecDeque<ClientError>>>,
    fail_edits: AtomicBool,
    subscribers: SubscriberSet,
}

impl MemoryClient {
    pub fn new(me_id: i64) -> Self {
        Self {
            me: Sender::new(me_id).with_name("me"),
            next_id: AtomicI64::new(1000),
            outbound: Mutex::new(Vec::new()),
            dialogs: Mutex::new(Vec::new()),
            media: Mutex::new(HashMap::new()),
            send_failures: Mutex::new(HashMap::new()),
            fail_edits: AtomicBool::new(false),
            subscribers: SubscriberSet::new(),
        }
    }

    pub fn with_dialogs(self, dialogs: Vec<Dialog>) -> Self {
        if let Ok(mut d) = self.dialogs.lock() {
            *d = dialogs;
        }
        self
    }

    /// Attach downloadable media to a message
    pub fn add_media(&self, peer: PeerId, message: MessageId, bytes: Vec<u8>) {
        if let Ok(mut media) = self.media.lock() {
            media.insert((peer, message), bytes);
        }
    }

    /// Make the next send to `peer` fail with `error`; queued in order
    pub fn fail_next_send(&self, peer: PeerId, error: ClientError) {
        if let Ok(mut failures) = self.send_failures.lock() {
            failures.entry(peer).or_default().push_back(error);
        }
    }

    pub fn set_fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    /// Offer an inbound event to follow-up listeners
    pub fn publish(&self, event: &InboundEvent) -> usize {
        self.subscribers.publish(event)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        self.outbound.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Text of every sent message, in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Text of every message sent to `peer`, in order
    pub fn texts_to(&self, peer: PeerId) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Text { peer: p, text, .. } if p == peer => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Id of the last message sent to `peer`
    pub fn last_id_to(&self, peer: PeerId) -> Option<MessageId> {
        self.outbound().into_iter().rev().find_map(|o| match o {
            Outbound::Text { peer: p, id, .. } | Outbound::File { peer: p, id, .. } if p == peer => Some(id),
            _ => None,
        })
    }

    fn next_id(&self) -> MessageId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn take_failure(&self, peer: PeerId) -> Option<ClientError> {
        self.send_failures.lock().ok()?.get_mut(&peer)?.pop_front()
    }

    fn push(&self, entry: Outbound) {
        if let Ok(mut outbound) = self.outbound.lock() {
            outbound.push(entry);
        }
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn get_me(&self) -> Result<Sender, ClientError> {
        Ok(self.me.clone())
    }

    async fn send_text(&self, peer: PeerId, text: &str, mode: ParseMode) -> Result<MessageId, ClientError> {
        if let Some(e) = self.take_failure(peer) {
            return Err(e);
        }
        let id = self.next_id();
        self.push(Outbound::Text { peer, id, text: text.to_string(), mode });
        Ok(id)
    }

    async fn edit_text(&self, peer: PeerId, message: MessageId, text: &str, _mode: ParseMode) -> Result<(), ClientError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(ClientError::Rpc("MESSAGE_EDIT_FORBIDDEN".to_string()));
        }
        self.push(Outbound::Edit { peer, message, text: text.to_string() });
        Ok(())
    }

    async fn delete(&self, peer: PeerId, messages: &[MessageId]) -> Result<(), ClientError> {
        self.push(Outbound::Delete { peer, messages: messages.to_vec() });
        Ok(())
    }

    async fn download_media(&self, peer: PeerId, message: MessageId) -> Result<Vec<u8>, ClientError> {
        self.media
            .lock()
            .ok()
            .and_then(|m| m.get(&(peer, message)).cloned())
            .ok_or_else(|| ClientError::NotFound(format!("no media on message #{}", message)))
    }

    async fn upload_file(&self, name: &str, bytes: Vec<u8>) -> Result<RemoteFile, ClientError> {
        Ok(RemoteFile {
            id: format!("file-{}", self.next_id()),
            name: name.to_string(),
            size: bytes.len(),
        })
    }

    async fn send_file(&self, peer: PeerId, file: &RemoteFile, caption: &str, _mode: ParseMode) -> Result<MessageId, ClientError> {
        if let Some(e) = self.take_failure(peer) {
            return Err(e);
        }
        let id = self.next_id();
        self.push(Outbound::File { peer, id, file: file.clone(), caption: caption.to_string() });
        Ok(id)
    }

    async fn list_dialogs(&self) -> Result<Vec<Dialog>, ClientError> {
        Ok(self.dialogs.lock().map(|d| d.clone()).unwrap_or_default())
    }

    fn subscribe(&self, matcher: EventMatcher) -> Subscription {
        self.subscribers.subscribe(matcher)
    }
}
