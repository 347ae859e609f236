//! Drowsiness Monitor - Main Entry Point

use app::{init_logging, run, AppConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path as the only argument
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(path.as_deref())?;
    init_logging(&config.log_level, config.log_json)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Detection service {}, frames from {}",
        config.api_base_url,
        config.frames_dir.display()
    );

    run(config).await?;

    Ok(())
}
