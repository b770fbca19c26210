//! Analog Firmata Runner
//!
//! Runs the analog input feature against a simulated board on a single
//! cooperative control loop: host messages and periodic reports share one
//! thread, and every read blocks the loop until it completes.

mod board;
mod dispatcher;
mod error;
mod settings;

pub use board::SimulatedBoard;
pub use dispatcher::Dispatcher;
pub use error::RunnerError;
pub use settings::{PinInterval, ReadNow, RunnerConfig};

use analog_protocol::HostMessage;
use analog_scheduler::AnalogInputFeature;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Values sent per analog pin
    pub reports: Vec<u32>,
    /// Bytes written to the transport
    pub bytes_sent: usize,
    /// Control loop passes
    pub polls: u64,
    /// Passes that were global-cadence ticks
    pub cadence_ticks: u64,
}

/// Initialize logging
pub fn init_logging(level: &str) -> Result<(), RunnerError> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Boot the board, replay the startup script and run the control loop
pub async fn run(config: RunnerConfig) -> Result<RunSummary, RunnerError> {
    config.validate()?;

    let mut dispatcher = Dispatcher::new(SimulatedBoard::new(&config));
    AnalogInputFeature::attach(config.analog, &mut dispatcher);
    dispatcher.system_reset();

    let script: Vec<u8> = config
        .startup_script()
        .iter()
        .flat_map(HostMessage::to_bytes)
        .collect();
    let handled = dispatcher.handle_bytes(&script);
    info!("Startup script applied ({} messages)", handled);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.loop_period_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = Instant::now() + Duration::from_millis(config.run_duration_ms);

    let mut polls = 0;
    let mut cadence_ticks = 0;
    while Instant::now() < deadline {
        ticker.tick().await;
        if dispatcher.poll() {
            cadence_ticks += 1;
        }
        polls += 1;
    }

    let board = dispatcher.board();
    let summary = RunSummary {
        reports: board.reports().to_vec(),
        bytes_sent: board.output().len(),
        polls,
        cadence_ticks,
    };
    info!(
        "Run finished: {} polls, {} cadence ticks, {} bytes sent",
        summary.polls, summary.cadence_ticks, summary.bytes_sent
    );
    Ok(summary)
}
