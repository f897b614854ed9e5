use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitrine_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about = "An autoplaying media carousel for the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use this config file instead of ~/.config/vitrine/config.toml
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the carousel
    Run(RunArgs),
    /// Load every slide once and report which ones are usable
    Probe {
        /// Media to probe (URLs or paths); defaults to the configured slides
        items: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Report a slide as pending after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Media to show (URLs or paths); replaces the configured slides
    pub items: Vec<String>,
    /// Autoplay interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Keep playing while the mouse is over the carousel
    #[arg(long)]
    pub no_hover_pause: bool,
    /// Autoplay even when reduced motion is requested
    #[arg(long)]
    pub ignore_reduced_motion: bool,
    /// Start with reduced motion on
    #[arg(long)]
    pub reduced_motion: bool,
}

/// Logs go to a file while the TUI owns the terminal, otherwise to stderr
fn init_logging(config: &AppConfig, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if to_file {
        let log_path = config.log_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (config, config_path) = match cli.config {
        Some(path) => (AppConfig::load_from(&path)?, path),
        None => (AppConfig::load()?, AppConfig::config_path()),
    };

    let tui_mode = matches!(cli.command, Some(Commands::Run(_)) | None);
    init_logging(&config, tui_mode)?;

    // Handle commands
    match cli.command {
        Some(Commands::Run(args)) => commands::run::run(config, args).await,
        None => commands::run::run(config, RunArgs::default()).await,
        Some(Commands::Probe {
            items,
            json,
            timeout_secs,
        }) => commands::probe::run(&config, &items, json, timeout_secs).await,
        Some(Commands::Config { save }) => commands::config::run(&config, &config_path, save),
    }
}
