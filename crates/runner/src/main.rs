//! Inpaint Pipeline - Main Entry Point

use runner::{init_logging, run, RunnerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== Inpaint Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let config = RunnerConfig::load()?;
    run(config).await?;

    Ok(())
}
