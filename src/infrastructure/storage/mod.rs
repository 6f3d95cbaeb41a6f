//! File-based storage implementation

pub mod command_log;

pub use command_log::{FileCommandLog, MemoryCommandLog, NoopCommandLog};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::application::errors::StorageError;

/// A single JSON document on disk.
///
/// Reads fail soft: a missing, unreadable or corrupt file yields
/// `T::default()` so gating never blocks message handling. Nothing is
/// cached; every load hits the file.
pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for JsonStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").field("path", &self.path).finish()
    }
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, propagating errors. `Ok(None)` when absent.
    pub async fn read(&self) -> Result<Option<T>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the document, falling back to defaults on any failure
    pub async fn load(&self) -> T {
        match self.read().await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!("Failed to load {}: {}, using defaults", self.path.display(), e);
                T::default()
            }
        }
    }

    /// Like `load`, but writes the defaults out when the file does not exist yet
    pub async fn load_or_init(&self) -> T {
        match self.read().await {
            Ok(Some(value)) => value,
            Ok(None) => {
                let value = T::default();
                if let Err(e) = self.save(&value).await {
                    tracing::warn!("Failed to create {}: {}", self.path.display(), e);
                }
                value
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}, using defaults", self.path.display(), e);
                T::default()
            }
        }
    }

    /// Write the full document, creating the parent directory if needed
    pub async fn save(&self, value: &T) -> Result<(), StorageError> {
        write_json(&self.path, value).await
    }

    /// Load, mutate and write back the full document
    pub async fn update<F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.load().await;
        f(&mut value);
        self.save(&value).await?;
        Ok(value)
    }
}

/// Pretty-print `value` to `path`, creating parent directories.
///
/// The document goes to a sibling temp file first and is renamed over
/// `path`, so readers see either the old or the new content in full.
pub async fn write_json<V: Serialize + ?Sized>(path: &Path, value: &V) -> Result<(), StorageError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir).await?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = temp_path(path);
    if let Err(e) = tokio::fs::write(&tmp, json).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// `<dir>/<name>.<unique>.tmp`, unique per write so concurrent saves don't share it
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!("{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AccessList, Mode, Settings};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_absent_settings_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Settings> = JsonStore::new(dir.path().join("nested/bot-settings.json"));
        assert_eq!(store.load_or_init().await, Settings::default());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot-settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store: JsonStore<Settings> = JsonStore::new(&path);
        assert_eq!(store.load().await, Settings::default());
        assert!(store.read().await.is_err());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Settings> = JsonStore::new(dir.path().join("bot-settings.json"));
        store
            .save(&Settings { mode: Mode::SelfOnly, owner_only: true, ..Settings::default() })
            .await
            .unwrap();

        store.update(|s| s.enabled = false).await.unwrap();

        let loaded = store.load().await;
        assert!(!loaded.enabled);
        assert!(loaded.owner_only);
        assert_eq!(loaded.mode, Mode::SelfOnly);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_readers_never_see_half_written_settings() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Settings> = JsonStore::new(dir.path().join("bot-settings.json"));
        let locked = Settings { mode: Mode::SelfOnly, owner_only: true, ..Settings::default() };
        store.save(&locked).await.unwrap();

        let writer = {
            let store = store.clone();
            let locked = locked.clone();
            tokio::spawn(async move {
                for _ in 0..300 {
                    store.save(&locked).await.unwrap();
                }
            })
        };
        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut fell_open = 0;
                for _ in 0..300 {
                    if store.load_or_init().await.mode == Mode::Public {
                        fell_open += 1;
                    }
                    tokio::task::yield_now().await;
                }
                fell_open
            })
        };

        writer.await.unwrap();
        assert_eq!(reader.await.unwrap(), 0);
        assert_eq!(store.load().await, locked);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_load_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<AccessList> = JsonStore::new(dir.path().join("whitelist.json"));
        assert_eq!(store.load().await, AccessList::default());
        assert!(!store.path().exists());
    }
}
