//! Plugin directory watcher - hot reload on filesystem changes
//!
//! Uses the `notify` crate to watch the plugin root recursively. Bursts of
//! events (an editor saving a file typically produces several) collapse
//! into a single full reload.

use std::time::Duration;

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::context::BotContext;
use crate::application::errors::PluginError;

/// Quiet period after the last change before reloading
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// A running watcher; reloading stops when it is dropped or stopped
pub struct PluginWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl PluginWatcher {
    /// Start watching the loader's plugin directory.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(ctx: BotContext, debounce: Duration) -> Result<Self, PluginError> {
        let plugin_dir = ctx.loader.plugin_dir().to_path_buf();
        let (change_tx, mut change_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) if is_relevant(&event.kind) => {
                    let _ = change_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Plugin watcher error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| PluginError::Load(format!("failed to create watcher: {}", e)))?;

        watcher
            .watch(&plugin_dir, RecursiveMode::Recursive)
            .map_err(|e| PluginError::Load(format!("failed to watch {}: {}", plugin_dir.display(), e)))?;

        tracing::info!(path = %plugin_dir.display(), "Plugin watcher started");

        let task = tokio::spawn(async move {
            while change_rx.recv().await.is_some() {
                // Wait for the burst to settle
                loop {
                    match tokio::time::timeout(debounce, change_rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }

                match ctx.loader.reload(&ctx).await {
                    Ok(report) => tracing::info!(
                        plugins = report.plugins.len(),
                        commands = report.commands,
                        rejected = report.rejected.len(),
                        "Hot reload complete"
                    ),
                    Err(e) => tracing::error!("Hot reload failed, keeping previous plugins: {}", e),
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            task,
        })
    }

    /// Stop watching and cancel any pending reload
    pub fn stop(self) {
        self.task.abort();
        tracing::info!("Plugin watcher stopped");
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::MemoryClient;
    use crate::plugins::testing::{context, OWNER};
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
    use std::sync::Arc;

    async fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if done() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        done()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_manifest_changes_reload_registry() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), Arc::new(MemoryClient::new(OWNER)));
        let plugin_dir = ctx.loader.plugin_dir().to_path_buf();
        std::fs::create_dir_all(&plugin_dir).unwrap();
        ctx.loader.load_all(&ctx).await.unwrap();
        assert!(ctx.registry.lookup("ping").is_none());

        let watcher = PluginWatcher::start(ctx.clone(), Duration::from_millis(50)).unwrap();

        let manifest = plugin_dir.join("ping.yaml");
        std::fs::write(&manifest, "name: ping\ncategory: info\ncommands: [ping]\nhandler: ping\n").unwrap();
        assert!(wait_until(|| ctx.registry.lookup("ping").is_some()).await);

        std::fs::remove_file(&manifest).unwrap();
        assert!(wait_until(|| ctx.registry.lookup("ping").is_none()).await);

        watcher.stop();
    }

    #[test]
    fn test_only_content_changes_trigger_reload() {
        assert!(is_relevant(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_relevant(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_relevant(&EventKind::Access(AccessKind::Any)));
    }
}
