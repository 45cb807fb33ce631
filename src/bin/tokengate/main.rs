//! tokengate server entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use tokengate::ServerBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments and build configuration
    let cli = Cli::parse();
    let json_logs = cli.json_logs;
    let config_path = cli.config_path();
    let config = cli.into_config()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.log_level)));

    if json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("tokengate v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    // Bind and serve until Ctrl-C
    let server = ServerBuilder::new(config).build().await?;
    server.run().await?;

    info!("Goodbye!");
    Ok(())
}
