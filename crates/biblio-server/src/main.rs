//! Biblio CLI
//!
//! Runs the HTTP API and a few maintenance commands against the same
//! database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use biblio_core::Config;

mod commands;
mod output;

use output::{Output, OutputFormat};

const DEFAULT_LOG_FILTER: &str = "biblio_core=info,biblio_server=info,tower_http=info";

#[derive(Parser)]
#[command(name = "biblio")]
#[command(about = "Biblio - library catalog, readers and loans")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to listen on (overrides bind_addr)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Mark loans past their due date as overdue
    SweepOverdue,
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    init_logging();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { bind } => commands::serve::run(config, bind).await,
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => commands::admin::create(config, name, email, password, &output),
        Commands::SweepOverdue => commands::sweep::run(config, &output),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(&config, cli.config.as_ref(), &output)
            }
        },
    }
}

/// Log to stderr, filtered by RUST_LOG when set
fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
