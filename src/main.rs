use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

use userbot_dispatch::application::messaging::CommandDispatcher;
use userbot_dispatch::application::BotContext;
use userbot_dispatch::domain::traits::CommandLog;
use userbot_dispatch::infrastructure::adapters::ConsoleAdapter;
use userbot_dispatch::infrastructure::config::Config;
use userbot_dispatch::infrastructure::plugins::{watcher, PluginLoader, PluginWatcher};
use userbot_dispatch::infrastructure::storage::{FileCommandLog, NoopCommandLog};
use userbot_dispatch::plugins::{builtin_catalog, default_manifests};

#[derive(Parser)]
#[command(name = "userbot-dispatch")]
#[command(about = "Prefix command dispatcher with hot-reloadable plugins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,

    /// Owner sender id (overrides config and OWNER_ID)
    #[arg(short, long, global = true)]
    owner: Option<String>,

    /// Command prefix (overrides config and COMMAND_PREFIX)
    #[arg(short, long, global = true)]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive console session
    Run,
    /// Show version
    Version,
    /// Write a default config and the built-in plugin manifests
    InitConfig,
    /// List the plugins the loader would register
    Plugins,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = load_config(&cli.config, cli.owner, cli.prefix);
            run_bot(config);
        }
        Commands::Version => {
            println!("userbot-dispatch v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(&cli.config);
        }
        Commands::Plugins => {
            let config = load_config(&cli.config, cli.owner, cli.prefix);
            list_plugins(&config);
        }
    }
}

/// File (if present), then environment, then CLI flags
fn load_config(config_path: &str, owner: Option<String>, prefix: Option<String>) -> Config {
    let mut config = match Config::load_layered(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    if let Some(owner) = owner {
        config.bot.owner_id = Some(owner);
    }
    if let Some(prefix) = prefix {
        config.bot.prefix = prefix;
    }
    config
}

fn run_bot(config: Config) {
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // validate() guarantees a numeric owner id
    let owner_id = config
        .bot
        .owner_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i64>().ok())
        .unwrap_or_default();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async move {
        tracing::info!("Starting {} with prefix \"{}\"", config.bot.name, config.bot.prefix);

        let adapter = Arc::new(ConsoleAdapter::new(owner_id));
        let command_log: Arc<dyn CommandLog> = if config.audit.enabled {
            Arc::new(FileCommandLog::new(&config.audit.path))
        } else {
            Arc::new(NoopCommandLog)
        };

        let loader = Arc::new(PluginLoader::new(&config.plugins.directory, builtin_catalog(&config)));
        let ctx = BotContext::new(&config, adapter.clone(), loader.clone(), command_log);

        if let Err(e) = loader.load_all(&ctx).await {
            tracing::error!("Failed to load plugins: {}", e);
        }

        let watcher = if config.plugins.hot_reload && config.plugins.directory.is_dir() {
            match PluginWatcher::start(ctx.clone(), watcher::DEFAULT_DEBOUNCE) {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!("Hot reload disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        println!("Console mode. Type {}menu to list commands, Ctrl+C to quit.", config.bot.prefix);
        println!("Reply to a message with: ^<id> <text>");

        let dispatcher = Arc::new(CommandDispatcher::new(ctx));
        let events = adapter.spawn_reader();

        tokio::select! {
            _ = dispatcher.run(events) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
            }
        }

        if let Some(w) = watcher {
            w.stop();
        }
    });
}

fn init_config(config_path: &str) {
    let config = Config::default();

    if Path::new(config_path).exists() {
        println!("{} already exists, leaving it unchanged", config_path);
    } else {
        match config.to_yaml() {
            Ok(yaml) => match std::fs::write(config_path, yaml) {
                Ok(()) => println!("Wrote {}", config_path),
                Err(e) => {
                    eprintln!("Failed to write {}: {}", config_path, e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let plugin_dir = &config.plugins.directory;
    for (relative, yaml) in default_manifests() {
        let path = plugin_dir.join(relative);
        if path.exists() {
            continue;
        }
        if let Some(dir) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Failed to create {}: {}", dir.display(), e);
                continue;
            }
        }
        match std::fs::write(&path, yaml) {
            Ok(()) => println!("Wrote {}", path.display()),
            Err(e) => eprintln!("Failed to write {}: {}", path.display(), e),
        }
    }

    println!("\nSet bot.owner-id in {} (or OWNER_ID) before running.", config_path);
}

fn list_plugins(config: &Config) {
    let loader = PluginLoader::new(&config.plugins.directory, builtin_catalog(config));

    let (definitions, rejected) = match loader.collect() {
        Ok(found) => found,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    println!("Plugins in {}:", config.plugins.directory.display());
    for def in &definitions {
        let commands: Vec<String> = def.commands.iter().map(|c| format!("{}{}", config.bot.prefix, c)).collect();
        println!("  {} [{}] ({}) {}", def.name, def.category, def.access, commands.join(" "));
    }
    if definitions.is_empty() {
        println!("  (none)");
    }

    if !rejected.is_empty() {
        println!("\nRejected:");
        for r in &rejected {
            println!("  {}: {}", r.path.display(), r.reason);
        }
    }
}
