use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use matchday::commands;
use matchday::config;
use matchday::data_provider::{ExternalFeed, LocalStore};
use matchday::dev::{MemoryStore, MockFeed};
use matchday::fixtures::create_mock_stored_matches;
use matchday::snapshot::{FileFeed, FileStore};
use matchday::Engine;

// Default Configuration Constants
/// Default log level when not specified
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log file path (no logging to file)
const DEFAULT_LOG_FILE: &str = "/dev/null";

#[derive(Parser)]
#[command(name = "matchday")]
#[command(about = "Live football scores and standings", long_about = "Live football scores and standings\n\nWithout --feed, built-in sample data is used.")]
struct Cli {
    /// Set log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Log file path (default: /dev/null for no logging)
    #[arg(short = 'F', long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: String,

    /// JSON feed snapshot to read matches and standings from
    #[arg(long, global = true)]
    feed: Option<PathBuf>,

    /// JSON file holding locally stored matches
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the unified list of feed and stored matches
    Matches,
    /// Display the league table and group tables
    Standings {
        /// Show only this group
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Search matches by date or team, falling back across sources
    Search {
        /// Date in YYYY-MM-DD format (defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Team name, or part of one
        #[arg(short, long, conflicts_with = "date")]
        team: Option<String>,

        /// Comma separated source order, e.g. "feed,live,store"
        #[arg(short, long)]
        order: Option<String>,
    },
    /// Follow live matches for a number of refresh intervals
    Live {
        #[arg(short, long, default_value_t = 5)]
        ticks: u32,
    },
    /// Display current configuration
    Config,
}

fn init_logging(log_level: &str, log_file: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_file, e);
            return;
        }
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Handle the config command - display current configuration
fn handle_config_command() {
    let cfg = config::read();

    let (path_str, exists) = match config::get_config_path() {
        Some(path) => {
            let exists = path.exists();
            (path.display().to_string(), exists)
        }
        None => ("Unable to determine config path".to_string(), false),
    };

    println!("Configuration File: {} (Exists: {})", path_str, if exists { "yes" } else { "no" });
    println!();
    println!("Current Configuration:");
    println!("=====================");
    println!("log_level: {}", cfg.log_level);
    println!("log_file: {}", cfg.log_file);
    println!("refresh_interval: {} seconds", cfg.refresh_interval);
    println!("time_format: {}", cfg.time_format);
    println!();
    println!("[display]");
    println!("use_unicode: {}", cfg.display.use_unicode);
    println!();
    println!("[competition]");
    println!("id: {}", cfg.competition.id);
    println!("label: {}", cfg.competition.label);
    println!("overall_zones: {:?}", cfg.competition.overall_zones);
    println!("group_zones: {:?}", cfg.competition.group_zones);
    for group in &cfg.competition.groups {
        println!("group {}: {} declared teams", group.name, group.team_ids.len());
    }
    println!();
    println!("[sources]");
    let order: Vec<&str> = cfg.sources.search_order.iter().map(|k| k.name()).collect();
    println!("search_order: {}", order.join(","));
}

/// Resolve log configuration from CLI args and config file
/// CLI arguments take precedence over config file
fn resolve_log_config<'a>(cli: &'a Cli, config: &'a config::Config) -> (&'a str, &'a str) {
    let log_level = if cli.log_level != DEFAULT_LOG_LEVEL {
        cli.log_level.as_str()
    } else {
        config.log_level.as_str()
    };

    let log_file = if cli.log_file != DEFAULT_LOG_FILE {
        cli.log_file.as_str()
    } else {
        config.log_file.as_str()
    };

    (log_level, log_file)
}

/// Snapshot files when given, built-in sample data otherwise
fn create_engine(cli: &Cli, config: &config::Config) -> anyhow::Result<Engine> {
    let feed: Arc<dyn ExternalFeed> = match &cli.feed {
        Some(path) => Arc::new(FileFeed::open(path)?),
        None => Arc::new(MockFeed::new()),
    };
    let store: Arc<dyn LocalStore> = match &cli.store {
        Some(path) => Arc::new(FileStore::new(path)),
        None => Arc::new(MemoryStore::with_rows(create_mock_stored_matches())),
    };
    Ok(Engine::new(feed, store, &config.competition)?)
}

/// Execute a CLI command by routing it to the appropriate command handler
async fn execute_command(engine: &Engine, command: Commands, config: &config::Config) -> anyhow::Result<()> {
    match command {
        Commands::Config => unreachable!("Config command should be handled before execute_command"),
        Commands::Matches => commands::matches::run(engine, config).await,
        Commands::Standings { group } => commands::standings::run(engine, group, config).await,
        Commands::Search { date, team, order } => {
            commands::search::run(engine, date, team, order, config).await
        }
        Commands::Live { ticks } => commands::live::run(engine, ticks, config).await,
    }
}

#[tokio::main]
async fn main() {
    let config = config::read();
    let cli = Cli::parse();

    // Resolve and initialize logging
    let (log_level, log_file) = resolve_log_config(&cli, &config);
    if log_file != DEFAULT_LOG_FILE {
        init_logging(log_level, log_file);
    }

    // Handle Config command separately (doesn't need an engine)
    if let Commands::Config = cli.command {
        handle_config_command();
        return;
    }

    let result = match create_engine(&cli, &config) {
        Ok(engine) => execute_command(&engine, cli.command, &config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        tracing::error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
