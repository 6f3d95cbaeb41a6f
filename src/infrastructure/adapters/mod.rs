//! Client adapters
//!
//! The real protocol transport is an external collaborator; these adapters
//! implement the `Client` seam for local development and tests.

pub mod console;
pub mod memory;

pub use console::ConsoleAdapter;
pub use memory::{MemoryClient, Outbound};

use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::domain::entities::InboundEvent;
use crate::domain::traits::{EventMatcher, Subscription};

/// Follow-up listeners registered through `Client::subscribe`
#[derive(Default)]
pub struct SubscriberSet {
    inner: Mutex<Vec<(EventMatcher, mpsc::UnboundedSender<InboundEvent>)>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, matcher: EventMatcher) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut inner) = self.inner.lock() {
            inner.push((matcher, tx));
        }
        Subscription::new(rx)
    }

    /// Deliver an event to every live matching listener, pruning dropped ones.
    /// Returns how many listeners received it.
    pub fn publish(&self, event: &InboundEvent) -> usize {
        let Ok(mut inner) = self.inner.lock() else {
            return 0;
        };
        inner.retain(|(_, tx)| !tx.is_closed());
        inner
            .iter()
            .filter(|(matcher, _)| matcher.matches(event))
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.iter().filter(|(_, tx)| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Chat, Sender};

    #[tokio::test]
    async fn test_publish_reaches_matching_listeners_only() {
        let set = SubscriberSet::new();
        let mut in_chat = set.subscribe(EventMatcher::in_chat(1));
        let _elsewhere = set.subscribe(EventMatcher::in_chat(2));

        let event = InboundEvent::new(Chat::private(1), Sender::new(1), "yes");
        assert_eq!(set.publish(&event), 1);
        assert_eq!(in_chat.recv().await.unwrap().text.as_deref(), Some("yes"));
    }

    #[test]
    fn test_dropped_subscriptions_are_pruned() {
        let set = SubscriberSet::new();
        let sub = set.subscribe(EventMatcher::in_chat(1));
        assert_eq!(set.len(), 1);
        drop(sub);
        assert_eq!(set.publish(&InboundEvent::new(Chat::private(1), Sender::new(1), "x")), 0);
        assert!(set.is_empty());
    }
}
