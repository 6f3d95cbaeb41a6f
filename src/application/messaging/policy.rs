//! Access policy - pure predicates gating every command
//!
//! An empty owner identifier never matches anyone. Startup refuses to run
//! without one, so this only matters for misconfigured tests and tools.

use crate::domain::entities::{AccessLevel, InboundEvent, Mode, Settings};

/// True iff the sender's canonical id equals the configured owner id
pub fn is_owner(event: &InboundEvent, owner_id: &str) -> bool {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return false;
    }
    event.sender.id.to_string() == owner_id
}

/// Whether the bot should look at this event at all
pub fn should_process(event: &InboundEvent, owner_id: &str, settings: &Settings) -> bool {
    if !settings.enabled {
        return false;
    }
    if settings.mode == Mode::SelfOnly && !is_owner(event, owner_id) {
        return false;
    }
    if settings.private_chat_only && !event.is_private() {
        return false;
    }
    if settings.owner_only && !is_owner(event, owner_id) {
        return false;
    }
    true
}

/// Per-command gate derived from the plugin's declared access level
pub fn may_invoke(access: AccessLevel, event: &InboundEvent, owner_id: &str) -> bool {
    match access {
        AccessLevel::All => true,
        AccessLevel::Owner => is_owner(event, owner_id),
    }
}
