use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use oci_sizing::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.into_run_config()?;

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;
    let log_path = config.log_path();
    let log_file = File::create(&log_path)
        .with_context(|| format!("creating run log {}", log_path.display()))?;
    init_tracing(log_file);
    tracing::info!(log = %log_path.display(), "Run log initialised");
    config.trace_loaded();

    let result = run(config).await;
    match &result {
        Ok(()) => tracing::info!("Sizing run completed successfully"),
        Err(e) => tracing::error!(error = %e, "Sizing run failed"),
    }
    result
}

/// Console and run-log sinks; the log file mirrors the console without
/// ANSI escapes.
fn init_tracing(log_file: File) {
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));
    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
}
