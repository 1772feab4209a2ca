//! ot-bot - command-line session manager for the room service.
//!
//! Logs the configured user in against the identity provider (once; the
//! tokens are cached in the OS keychain), lists the user's rooms, or clears
//! the cached session.

mod cli;
mod commands;
mod env;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use otbot_core::api::http_client;
use otbot_core::{Error, KeyringVault, SessionManager, StubChannel};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use env::EnvFile;

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: bool) {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let env = EnvFile::discover(args.env_file.as_deref())?;
    let config = env.config()?;
    debug!(?config, env_file = ?env.path, "Configuration loaded");

    let client = http_client(&config)?;
    let sessions = SessionManager::new(config, KeyringVault, client);
    let mut channel = StubChannel::new();
    let mut stdout = io::stdout();

    commands::execute(&sessions, &mut channel, args.action(), &mut stdout).await
}
