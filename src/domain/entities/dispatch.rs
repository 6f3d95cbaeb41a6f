use std::time::{Duration, Instant};
use super::InboundEvent;

/// Everything a handler needs to know about one invocation.
///
/// Built once per inbound event by the dispatcher and dropped after the
/// handler returns.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub event: InboundEvent,
    /// Argument text after the command token, untrimmed inner whitespace kept
    pub text: String,
    /// Lower-cased command token
    pub command: String,
    /// Argument tokens, whitespace-split with empties removed
    pub args: Vec<String>,
    pub category: String,
    pub received_at: Instant,
}

impl DispatchContext {
    pub fn elapsed(&self) -> Duration {
        self.received_at.elapsed()
    }

    /// Peer replies should be sent to
    pub fn peer(&self) -> i64 {
        self.event.chat.id
    }

    /// Argument text with the first `n` tokens removed
    pub fn text_after(&self, n: usize) -> String {
        let mut rest = self.text.trim_start();
        for _ in 0..n {
            match rest.find(char::is_whitespace) {
                Some(idx) => rest = rest[idx..].trim_start(),
                None => return String::new(),
            }
        }
        rest.trim_end().to_string()
    }
}
