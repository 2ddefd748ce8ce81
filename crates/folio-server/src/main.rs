//! folio-server binary.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use folio_server::constants::DEFAULT_CONFIG_FILE;
use folio_server::{ConfigOverrides, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "folio-server", version, about = "Serve folio blocks over HTTP")]
struct Args {
    /// RON config file (default: ./folio.ron if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _telemetry = folio_telemetry::init("folio-server");

    let mut config =
        match ServerConfig::load_or_default(args.config.as_deref(), Path::new(DEFAULT_CONFIG_FILE)) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{e}");
                return ExitCode::FAILURE;
            }
        };
    config.apply(&args.overrides);
    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        bind = %config.bind_address,
        database = %config.database_path.display(),
        uploads = %config.uploads_dir.display(),
        "starting folio server"
    );

    if let Err(e) = folio_server::run(config).await {
        tracing::error!("Server error: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
