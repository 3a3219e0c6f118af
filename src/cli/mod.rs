//! cli
//!
//! Command-line interface layer for wikistore.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Load configuration and build the [`WikiService`]
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::wiki`]. All store changes flow through the wiki pipeline.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::wiki::WikiService;

/// Execution context shared by command handlers.
#[derive(Debug)]
pub struct Context {
    pub service: WikiService,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let service = WikiService::from_config(&config).context("invalid configuration")?;
    let ctx = Context { service };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr. `RUST_LOG` wins; otherwise `--debug` selects debug level
/// for this crate and warnings elsewhere.
fn init_tracing(debug: bool) {
    let fallback = if debug { "wikistore=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // An already installed subscriber (embedding, tests) is kept.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
