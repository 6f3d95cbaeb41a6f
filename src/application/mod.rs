//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Context: Shared state handed to every handler
//! - Errors: Domain-specific errors
//! - Messaging: Parsing, access policy, guarding and dispatching
//! - Services: Flood-wait retry and expiring per-user sessions

pub mod context;
pub mod errors;
pub mod messaging;
pub mod services;

pub use context::BotContext;
