//! `folio` terminal editor.
//!
//! Usage:
//!   # Against a running folio-server
//!   cargo run -p folio-cli -- --server http://127.0.0.1:3001
//!
//!   # Standalone, in memory, starting from the sample document
//!   cargo run -p folio-cli -- --memory

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use folio_client::constants::DEFAULT_SERVER_URL;
use folio_client::{HttpBlockStore, Platform};
use folio_cli::Shell;
use folio_store::MemoryBlockStore;

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Edit a folio document from the terminal")]
struct Args {
    /// Server base URL
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Use an in-memory store seeded with the sample document (no server)
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = folio_telemetry::init("folio-cli");
    let args = Args::parse();
    let platform = Platform::current();

    let mut shell = if args.memory {
        tracing::info!("Starting with in-memory store");
        Shell::new(Arc::new(MemoryBlockStore::with_sample_data()), platform)
    } else {
        tracing::info!(server = %args.server, "Connecting");
        let store =
            HttpBlockStore::with_timeout(&args.server, Duration::from_secs(args.timeout_secs))
                .context("building HTTP client")?;
        Shell::over_http(store, platform)
    };

    let mut stdout = std::io::stdout();
    shell.load(&mut stdout).await?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    shell.run(stdin, &mut stdout).await?;
    Ok(())
}
