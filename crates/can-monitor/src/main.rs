//! CAN Monitor - Main Entry Point
//!
//! Usage: `can-monitor [settings-file]`

use can_monitor::{init_logging, load_settings, run};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1);
    let settings = load_settings(path.as_deref())?;
    init_logging(&settings)?;

    info!("=== CAN Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Backend {:?} at {}", settings.backend, settings.bitrate);

    run(settings).await
}
