//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: JSON documents and command log sinks
//! - Adapters: Client implementations (console, in-memory)
//! - Plugins: Manifest discovery, registry, hot reload

pub mod adapters;
pub mod config;
pub mod plugins;
pub mod storage;
