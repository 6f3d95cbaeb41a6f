//! Domain layer - Core types with no knowledge of transports or storage
//! 
//! This layer contains:
//! - Entities: Inbound events, settings, access lists, log records
//! - Traits: Abstractions for infrastructure (Client, CommandLog)

pub mod entities;
pub mod traits;
