//! Huddle terminal client entry point.
//!
//! # Usage
//!
//! ```bash
//! huddle --server http://localhost:8000 login --email ada@example.com
//! huddle groups
//! huddle chat 3
//! ```

use std::{
    fs::OpenOptions,
    io::{self, Write},
    sync::{Arc, Mutex},
};

use clap::Parser;
use huddle_client::CredentialStore;
use huddle_tui::cli::{self, Args};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_file = OpenOptions::new().create(true).append(true).open(&args.log_file)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .with(filter)
        .init();

    tracing::info!(server = %args.server, "huddle starting");

    let store: Arc<dyn CredentialStore> = Arc::new(args.credential_store()?);
    // Unlocked handles: the terminal client writes to stdout itself
    let mut stdin = io::BufReader::new(io::stdin());
    let mut stdout = io::stdout();

    let result = cli::run(&args, store, &mut stdin, &mut stdout).await;
    stdout.flush()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "command failed");
    }
    Ok(result?)
}
