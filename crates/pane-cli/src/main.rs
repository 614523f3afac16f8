//! pane: terminal front end for the pane thin client.
//!
//! Runs the device-side session engine against a remote application
//! server, with the console as the screen and the keyboard as the button.
//! Subcommands inspect and edit the local recent apps list and keyspace.

mod commands;
mod config;
mod devices;
mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

/// pane: thin client for remotely rendered apps
#[derive(Parser)]
#[command(
    name = "pane",
    version,
    about = "Thin client for remotely rendered apps",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Identity that scopes recent apps and storage
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Storage root directory
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Config file path
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Endpoint (host[:port]) to open directly, skipping the app list
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List recent apps
    Apps,

    /// Probe an endpoint and add it to recent apps
    Add {
        /// Endpoint in host[:port] format
        endpoint: String,
    },

    /// Print a stored value ("-1" when unset)
    Get {
        app: String,
        key: String,
    },

    /// Store a value
    Set {
        app: String,
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("pane=debug,pane_cli=debug,pane_client=debug,pane_core=debug")
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("pane=warn,pane_cli=warn,pane_client=warn")
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let cfg = match config::Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("pane: {e:#}");
            std::process::exit(1);
        }
    };
    let engine = cfg.engine(cli.user.as_deref(), cli.storage.as_deref());

    let result = match cli.command {
        Some(Command::Apps) => commands::apps::run(&engine),
        Some(Command::Add { endpoint }) => commands::add::run(&engine, &endpoint).await,
        Some(Command::Get { app, key }) => commands::storage::run_get(&engine, &app, &key),
        Some(Command::Set { app, key, value }) => {
            commands::storage::run_set(&engine, &app, &key, &value)
        }
        None => commands::run::run(engine, cli.endpoint.as_deref()).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("pane: {e:#}");
        std::process::exit(1);
    }
}
