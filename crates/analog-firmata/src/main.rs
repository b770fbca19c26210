//! Analog Firmata Runner - Main Entry Point

use analog_firmata::{init_logging, run, RunnerConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = RunnerConfig::load(path.as_deref())?;
    init_logging(&config.log_level)?;

    info!("=== Analog Firmata v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "{} analog pins, global sampling interval {}ms",
        config.analog.pin_count, config.sampling_interval_ms
    );

    let summary = run(config).await?;
    for (pin, count) in summary.reports.iter().enumerate() {
        info!("A{}: {} reports", pin, count);
    }

    Ok(())
}
