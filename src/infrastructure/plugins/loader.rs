//! Plugin loader - Discovers manifests and builds registry tables

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::context::BotContext;
use crate::application::errors::PluginError;
use crate::application::messaging::GuardedHandler;
use crate::domain::entities::AccessLevel;
use crate::plugins::{CommandHandler, HandlerCatalog};
use super::manifest::PluginManifest;
use super::registry::{PluginRegistry, RegistryTable};

const DEFAULT_CATEGORY: &str = "misc";
const ENTRY_POINTS: &[&str] = &["index.yaml", "index.yml"];

/// A validated plugin, ready to be wrapped and registered
pub struct PluginDefinition {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    /// Lower-cased, de-duplicated, never empty
    pub commands: Vec<String>,
    pub access: AccessLevel,
    pub handler: Arc<dyn CommandHandler>,
    pub source: PathBuf,
}

impl PluginDefinition {
    /// Wrap the raw handler with the access guard
    pub fn guarded(&self) -> Arc<GuardedHandler> {
        Arc::new(GuardedHandler::new(&self.name, self.access, Arc::clone(&self.handler)))
    }
}

/// A manifest that could not be loaded
#[derive(Debug, Clone)]
pub struct Rejection {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of one load cycle
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub plugins: Vec<String>,
    pub commands: usize,
    pub rejected: Vec<Rejection>,
    /// Plugins registered even though their init hook failed
    pub init_failures: Vec<String>,
}

/// Plugin loader
pub struct PluginLoader {
    plugin_dir: PathBuf,
    catalog: HandlerCatalog,
    registry: Arc<PluginRegistry>,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>, catalog: HandlerCatalog) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            catalog,
            registry: Arc::new(PluginRegistry::new()),
        }
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    pub fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> Arc<PluginRegistry> {
        Arc::clone(&self.registry)
    }

    /// Whether a file should be considered a plugin manifest
    pub fn is_candidate(path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if file_name.starts_with('.') || ENTRY_POINTS.contains(&file_name) {
            return false;
        }
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        is_yaml && !stem.ends_with(".test") && !stem.ends_with("_test")
    }

    /// Recursively list candidate manifests, sorted so that override order
    /// between plugins is stable across reloads
    pub fn discover(&self) -> Result<Vec<PathBuf>, PluginError> {
        let mut found = Vec::new();

        if !self.plugin_dir.exists() {
            tracing::warn!("Plugin directory does not exist: {}", self.plugin_dir.display());
            return Ok(found);
        }

        walk(&self.plugin_dir, &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Read and validate a single manifest
    pub fn load_definition(&self, path: &Path) -> Result<PluginDefinition, PluginError> {
        let manifest = PluginManifest::from_file(path)?;
        self.definition_from_manifest(manifest, path)
    }

    /// Validate a manifest; any missing requirement rejects the whole plugin
    pub fn definition_from_manifest(&self, manifest: PluginManifest, source: &Path) -> Result<PluginDefinition, PluginError> {
        let name = manifest
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PluginError::Invalid("missing name".to_string()))?;

        let mut commands: Vec<String> = Vec::new();
        for command in &manifest.commands {
            let command = command.trim().to_lowercase();
            if command.is_empty() || command.chars().any(char::is_whitespace) {
                return Err(PluginError::Invalid(format!(
                    "plugin '{}' declares an invalid command name '{}'",
                    name, command
                )));
            }
            if !commands.contains(&command) {
                commands.push(command);
            }
        }
        if commands.is_empty() {
            return Err(PluginError::Invalid(format!("plugin '{}' declares no commands", name)));
        }

        let access = match manifest.access.as_deref() {
            None => AccessLevel::All,
            Some(raw) => raw
                .parse::<AccessLevel>()
                .map_err(|e| PluginError::Invalid(format!("plugin '{}': {}", name, e)))?,
        };

        let key = manifest
            .handler
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| PluginError::Invalid(format!("plugin '{}' has no handler", name)))?;
        let handler = self
            .catalog
            .create(key.trim())
            .ok_or_else(|| PluginError::Invalid(format!("plugin '{}': unknown handler '{}'", name, key)))?;

        Ok(PluginDefinition {
            name,
            category: manifest
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            description: manifest.description,
            commands,
            access,
            handler,
            source: source.to_path_buf(),
        })
    }

    /// Loader over the same directory and catalog, for filesystem work off the runtime
    fn scanner(&self) -> Self {
        Self {
            plugin_dir: self.plugin_dir.clone(),
            catalog: self.catalog.clone(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Discover and validate every manifest without running init hooks
    pub fn collect(&self) -> Result<(Vec<PluginDefinition>, Vec<Rejection>), PluginError> {
        let mut definitions = Vec::new();
        let mut rejected = Vec::new();

        for path in self.discover()? {
            match self.load_definition(&path) {
                Ok(def) => definitions.push(def),
                Err(e) => {
                    tracing::warn!("Skipping plugin {}: {}", path.display(), e);
                    rejected.push(Rejection { path, reason: e.to_string() });
                }
            }
        }

        Ok((definitions, rejected))
    }

    /// Build a complete new table off to the side: discover, validate,
    /// run init hooks, wrap and insert.
    ///
    /// A failing init hook is logged and the plugin is registered anyway.
    pub async fn build_table(&self, ctx: &BotContext) -> Result<(RegistryTable, LoadReport), PluginError> {
        let scanner = self.scanner();
        let (definitions, rejected) = tokio::task::spawn_blocking(move || scanner.collect())
            .await
            .map_err(|e| PluginError::Load(format!("plugin discovery task failed: {}", e)))??;
        let mut table = RegistryTable::new();
        let mut report = LoadReport { rejected, ..LoadReport::default() };

        for def in definitions {
            if let Err(e) = def.handler.init(ctx).await {
                tracing::warn!("[{}] init() failed, registering anyway: {}", def.name, e);
                report.init_failures.push(def.name.clone());
            }

            table.insert(&def.name, &def.commands, def.guarded(), &def.category, def.access);
            tracing::info!(
                "Loaded plugin: {} [{}] ({}) -> {}",
                def.name,
                def.category,
                def.access,
                def.commands.join(", ")
            );
            report.plugins.push(def.name);
        }

        report.commands = table.len();
        Ok((table, report))
    }

    /// Load every plugin and make the result live in a single swap
    pub async fn load_all(&self, ctx: &BotContext) -> Result<LoadReport, PluginError> {
        let (table, report) = self.build_table(ctx).await?;
        self.registry.replace(table);
        tracing::info!(
            "Plugins loaded: {} plugins, {} commands, {} rejected",
            report.plugins.len(),
            report.commands,
            report.rejected.len()
        );
        Ok(report)
    }

    /// Full reload: the old table is dropped and replaced by a freshly
    /// discovered one in one step.
    ///
    /// Nothing serialises this against in-flight commands. Handlers that
    /// are already running keep the instance they were dispatched to; only
    /// later lookups see the new table.
    pub async fn reload(&self, ctx: &BotContext) -> Result<LoadReport, PluginError> {
        tracing::info!("Reloading plugins from {}", self.plugin_dir.display());
        self.load_all(ctx).await
    }
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), PluginError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| PluginError::Load(format!("Failed to read plugin directory {}: {}", dir.display(), e)))?;

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Failed to read directory entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        if path.is_dir() {
            if let Err(e) = walk(&path, found) {
                tracing::warn!("{}", e);
            }
        } else if PluginLoader::is_candidate(&path) {
            found.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::builtin_catalog;
    use crate::infrastructure::config::Config;

    fn loader() -> PluginLoader {
        PluginLoader::new("/nonexistent", builtin_catalog(&Config::default()))
    }

    fn manifest(yaml: &str) -> PluginManifest {
        PluginManifest::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_candidate_rules() {
        assert!(PluginLoader::is_candidate(Path::new("p/info/ping.yaml")));
        assert!(PluginLoader::is_candidate(Path::new("p/menu.yml")));
        assert!(!PluginLoader::is_candidate(Path::new("p/ping.test.yaml")));
        assert!(!PluginLoader::is_candidate(Path::new("p/ping_test.yml")));
        assert!(!PluginLoader::is_candidate(Path::new("p/index.yaml")));
        assert!(!PluginLoader::is_candidate(Path::new("p/.hidden.yaml")));
        assert!(!PluginLoader::is_candidate(Path::new("p/readme.md")));
    }

    #[test]
    fn test_valid_definition_normalised() {
        let def = loader()
            .definition_from_manifest(
                manifest("name: ping\ncommands: [Ping, PING, p]\nhandler: ping\n"),
                Path::new("ping.yaml"),
            )
            .unwrap();
        assert_eq!(def.commands, vec!["ping", "p"]);
        assert_eq!(def.access, AccessLevel::All);
        assert_eq!(def.category, "misc");
    }

    #[test]
    fn test_rejects_missing_name() {
        let err = loader()
            .definition_from_manifest(manifest("commands: [x]\nhandler: ping\n"), Path::new("x.yaml"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("missing name"));
    }

    #[test]
    fn test_rejects_empty_commands() {
        assert!(loader()
            .definition_from_manifest(manifest("name: x\ncommands: []\nhandler: ping\n"), Path::new("x.yaml"))
            .is_err());
    }

    #[test]
    fn test_rejects_missing_or_unknown_handler() {
        let l = loader();
        assert!(l
            .definition_from_manifest(manifest("name: x\ncommands: [x]\n"), Path::new("x.yaml"))
            .is_err());
        assert!(l
            .definition_from_manifest(manifest("name: x\ncommands: [x]\nhandler: nope\n"), Path::new("x.yaml"))
            .is_err());
    }

    #[test]
    fn test_rejects_unknown_access_level() {
        assert!(loader()
            .definition_from_manifest(
                manifest("name: x\ncommands: [x]\naccess: admin\nhandler: ping\n"),
                Path::new("x.yaml")
            )
            .is_err());
    }

    #[test]
    fn test_missing_directory_discovers_nothing() {
        assert!(loader().discover().unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_build_table_scans_nested_directories() {
        use crate::infrastructure::adapters::MemoryClient;
        use crate::plugins::testing::{context, OWNER};

        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), Arc::new(MemoryClient::new(OWNER)));
        let plugin_dir = ctx.loader.plugin_dir().to_path_buf();
        std::fs::create_dir_all(plugin_dir.join("info/deep")).unwrap();
        std::fs::write(
            plugin_dir.join("info/deep/ping.yaml"),
            "name: ping\ncategory: info\ncommands: [ping]\nhandler: ping\n",
        )
        .unwrap();
        std::fs::write(plugin_dir.join("broken.yaml"), "name: broken\ncommands: []\nhandler: ping\n").unwrap();

        let (table, report) = ctx.loader.build_table(&ctx).await.unwrap();

        assert!(table.contains("ping"));
        assert_eq!(report.plugins, vec!["ping"]);
        assert_eq!(report.rejected.len(), 1);
        assert!(ctx.registry.is_empty());
    }
}
