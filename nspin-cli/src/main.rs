//! nspin - persistent network namespace manager
//!
//! Converges one network namespace (interface, address, default route) and
//! keeps it across reboots with a systemd one-shot unit.

use anyhow::{Context, Result};
use clap::Parser;
use nspin_core::{Error, Settings};
use nspin_netns::SystemRunner;
use std::process;
use std::sync::Arc;
use tracing::Level;

mod cli;
mod commands;
mod lock;

use cli::{Action, Cli};
use commands::App;
use lock::NamespaceLock;

#[tokio::main]
async fn main() {
    // Parse command-line arguments; --help and --version exit normally
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", cli::usage());
            process::exit(1);
        }
    };

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Usage errors never need privilege
    let action = match cli.action() {
        Ok(action) => action,
        Err(message) => {
            eprintln!("{message}\n");
            eprintln!("{}", cli::usage());
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli, action).await {
        eprintln!("❌ Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: &Cli, action: Action) -> Result<()> {
    let settings = Settings::resolve(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;

    require_root()?;

    let _lock = if action.mutates() {
        Some(NamespaceLock::acquire(
            &settings.paths.lock_dir,
            &settings.target.namespace,
        )?)
    } else {
        None
    };

    let app = App::new(settings, Arc::new(SystemRunner::new()));
    commands::dispatch(action, &app).await
}

fn require_root() -> nspin_core::Result<()> {
    if nix::unistd::geteuid().is_root() {
        return Ok(());
    }
    Err(Error::PermissionDenied {
        operation: "This tool must be run as root. Try with sudo.".to_string(),
    })
}
