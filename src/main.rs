//! ce-transform - Main Entry Point
//!
//! Reads structured CloudEvents (one JSON object per line) from stdin,
//! transforms them and writes the results to stdout. Logs go to stderr.
//!
//! Usage: `ce-transform [config.toml]`

use anyhow::Context;
use ce_transform::{
    adapter::{Adapter, WriterSink},
    config::AdapterConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for events
    let (log_writer, _log_guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ce_transform=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(log_writer))
        .init();

    tracing::info!("Starting ce-transform");

    let cli_path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, source) = AdapterConfig::resolve(cli_path.as_deref())
        .context("Failed to load configuration")?;
    tracing::info!("Configuration loaded from {}", source);

    let sink = Arc::new(WriterSink::new(std::io::stdout()));
    let adapter =
        Adapter::from_config(&config, sink).context("Failed to build transformation pipelines")?;

    let stats = adapter
        .run(std::io::stdin().lock())
        .context("Failed to read input events")?;

    tracing::info!("Shutting down ({})", stats);
    Ok(())
}
