//! Plugin system
//! 
//! Plugins are YAML manifests discovered under the plugin directory. Each
//! manifest names a handler from the built-in catalog plus the commands,
//! category and access level it is registered under.

pub mod loader;
pub mod manifest;
pub mod registry;
pub mod watcher;

pub use loader::{LoadReport, PluginDefinition, PluginLoader, Rejection};
pub use manifest::PluginManifest;
pub use registry::{PluginRegistry, RegistryEntry, RegistryTable};
pub use watcher::PluginWatcher;
