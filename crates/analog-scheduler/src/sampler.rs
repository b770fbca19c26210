//! Averaged Analog Sampling
//!
//! All reads are synchronous: the control loop is blocked for the whole
//! read-and-delay sequence.

use crate::host::{AnalogHardware, Host};
use analog_protocol::{AnalogPin, ReadNowRequest};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smoothing used for scheduled reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Reads averaged per report
    pub samples: u8,
    /// Pause after each read (microseconds)
    pub delay_us: u32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            samples: 10,
            delay_us: 100,
        }
    }
}

/// Reads pins with an inter-read delay and averages the results
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    smoothing: SmoothingConfig,
}

impl Sampler {
    /// Create a sampler with the given smoothing
    pub fn new(smoothing: SmoothingConfig) -> Self {
        Self { smoothing }
    }

    /// Smoothing applied by `smoothed_read`
    pub fn smoothing(&self) -> SmoothingConfig {
        self.smoothing
    }

    /// Averaged read used by the scheduler
    pub fn smoothed_read<H>(&self, hw: &mut H, pin: AnalogPin) -> u16
    where
        H: AnalogHardware + DelayNs + ?Sized,
    {
        average_read(hw, pin, self.smoothing.samples, self.smoothing.delay_us)
    }

    /// One-shot read requested by the host, optionally powering a sensor
    pub fn on_demand_read<H>(&self, host: &mut H, request: &ReadNowRequest) -> u16
    where
        H: Host + ?Sized,
    {
        if let Some(power_pin) = request.power_pin {
            host.set_digital_level(power_pin, PinState::High);
        }

        let value = average_read(
            host,
            request.pin,
            request.average_loops,
            u32::from(request.delay_micros),
        );

        if let Some(power_pin) = request.power_pin {
            host.set_digital_level(power_pin, PinState::Low);
        }

        debug!(
            "Read-now {}: {} (avg of {}, power pin {:?})",
            request.pin, value, request.average_loops, request.power_pin
        );
        value
    }
}

/// `count` reads, each followed by `delay_us`, truncated to the integer mean
fn average_read<H>(hw: &mut H, pin: AnalogPin, count: u8, delay_us: u32) -> u16
where
    H: AnalogHardware + DelayNs + ?Sized,
{
    let count = count.max(1);
    let mut sum: u32 = 0;
    for _ in 0..count {
        sum += u32::from(hw.read_raw(pin));
        hw.delay_us(delay_us);
    }
    (sum / u32::from(count)) as u16
}
