//! Command dispatcher for a messaging-platform userbot.
//!
//! Inbound text carrying the command prefix is parsed, checked against the
//! global settings and per-command access levels, and routed to a handler
//! registered by one of the plugin manifests in the plugin directory.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
