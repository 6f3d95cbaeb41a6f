//! Domain traits - Abstractions for infrastructure implementations

pub mod client;
pub mod command_log;

pub use client::{Client, Dialog, EventMatcher, ParseMode, RemoteFile, Subscription};
pub use command_log::CommandLog;
