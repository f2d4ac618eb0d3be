//! Postboard CLI entry point.

use std::io;

use clap::Parser;
use postboard::{Cli, CliError, Console, Shell};
use postboard_app::{FileTokenStore, HttpTransport, Runtime};
use postboard_client::Client;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    Ok(run(args).await?)
}

async fn run(args: Cli) -> Result<(), CliError> {
    let config = args.config();
    let store = match &config.token_path {
        Some(path) => FileTokenStore::new(path),
        None => FileTokenStore::default_location()?,
    };
    let transport = HttpTransport::new(&config)?;
    tracing::debug!(base_url = %transport.base_url(), token = %store.path().display(), "starting");

    let runtime = Runtime::new(Client::new(config.client), transport, store);
    let console = Console::new(io::stdin().lock(), io::stdout().lock());
    let mut shell = Shell::new(runtime, console).assume_yes(args.yes);

    shell.run(args.command).await
}
