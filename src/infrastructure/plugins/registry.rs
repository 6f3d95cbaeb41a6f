//! Plugin registry - command name to guarded handler
//!
//! The live table sits behind a single `Arc` that is replaced wholesale on
//! every change. Readers clone the `Arc` and keep a consistent snapshot for
//! as long as they need it, so a lookup sees either the table from before a
//! reload or the one after, never a half-built one.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::application::messaging::GuardedHandler;
use crate::domain::entities::AccessLevel;

/// What a command name resolves to
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub plugin: String,
    pub handler: Arc<GuardedHandler>,
    pub categories: Vec<String>,
    pub access: AccessLevel,
}

/// One immutable generation of the registry
#[derive(Debug, Clone, Default)]
pub struct RegistryTable {
    entries: HashMap<String, RegistryEntry>,
}

impl RegistryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under every command name. An existing name is
    /// overridden (last writer wins); the overridden names are returned.
    pub fn insert(
        &mut self,
        plugin: &str,
        commands: &[String],
        handler: Arc<GuardedHandler>,
        category: &str,
        access: AccessLevel,
    ) -> Vec<String> {
        let mut overridden = Vec::new();
        for command in commands {
            let key = command.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            let entry = RegistryEntry {
                plugin: plugin.to_string(),
                handler: Arc::clone(&handler),
                categories: vec![category.to_string()],
                access,
            };
            if let Some(previous) = self.entries.insert(key.clone(), entry) {
                tracing::warn!(
                    "Command '{}' of plugin '{}' overridden by plugin '{}'",
                    key,
                    previous.plugin,
                    plugin
                );
                overridden.push(key);
            }
        }
        overridden
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All command names, sorted
    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Commands grouped under their first category, both sorted
    pub fn by_category(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (command, entry) in &self.entries {
            let category = entry.categories.first().cloned().unwrap_or_else(|| "misc".to_string());
            groups.entry(category).or_default().push(command.clone());
        }
        for commands in groups.values_mut() {
            commands.sort();
        }
        groups
    }

    /// Sorted (command, plugin, access) triples; equal for equal tables
    pub fn signature(&self) -> Vec<(String, String, AccessLevel)> {
        let mut sig: Vec<_> = self
            .entries
            .iter()
            .map(|(name, e)| (name.clone(), e.plugin.clone(), e.access))
            .collect();
        sig.sort();
        sig
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry for the live command table
pub struct PluginRegistry {
    current: RwLock<Arc<RegistryTable>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RegistryTable::new())),
        }
    }

    /// The current table generation.
    ///
    /// The lock only guards a pointer swap, so a poisoned lock still holds
    /// a complete table and is safe to read through.
    pub fn snapshot(&self) -> Arc<RegistryTable> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Resolve a command name, case-insensitively
    pub fn lookup(&self, name: &str) -> Option<RegistryEntry> {
        self.snapshot().get(name).cloned()
    }

    /// Copy-on-write registration into the live table
    pub fn register(
        &self,
        plugin: &str,
        commands: &[String],
        handler: Arc<GuardedHandler>,
        category: &str,
        access: AccessLevel,
    ) -> Vec<String> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistryTable::clone(&guard);
        let overridden = next.insert(plugin, commands, handler, category, access);
        *guard = Arc::new(next);
        overridden
    }

    /// Swap in a complete new table, returning the previous one
    pub fn replace(&self, table: RegistryTable) -> Arc<RegistryTable> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(table))
    }

    /// Empty every table in one swap
    pub fn clear(&self) {
        self.replace(RegistryTable::new());
    }

    pub fn commands(&self) -> Vec<String> {
        self.snapshot().commands()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
