//! Analog Input Scheduler for Adaptive Pin Sampling
//!
//! Per-pin report intervals with drift-free scheduling, averaged sampling,
//! and the feature that plugs both into a Firmata-style host.

mod feature;
mod host;
mod sampler;
mod scheduler;

#[cfg(test)]
mod testing;

pub use feature::{
    AnalogInputConfig, AnalogInputFeature, FeatureRegistry, FirmataFeature, ReportAnalogHandler,
};
pub use host::{AnalogHardware, AnalogTransport, Host, HostState};
pub use sampler::{Sampler, SmoothingConfig};
pub use scheduler::{PinSchedule, PinScheduler};
