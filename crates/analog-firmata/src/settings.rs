//! Runner Settings

use crate::error::RunnerError;
use analog_protocol::{sysex, HostMessage, PinMode, SamplingInterval};
use analog_scheduler::AnalogInputConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment prefix for overrides, e.g. `ANALOG_FIRMATA__SAMPLING_INTERVAL_MS=50`
const ENV_PREFIX: &str = "ANALOG_FIRMATA";

/// Largest value a single 7-bit data byte carries
const MAX_DATA_BYTE: u8 = 0x7F;
/// Largest value two 7-bit data bytes carry
const MAX_DATA_WORD: u16 = 0x3FFF;

fn check_data_byte(field: &str, value: u8) -> Result<(), RunnerError> {
    if value > MAX_DATA_BYTE {
        return Err(RunnerError::InvalidConfig(format!(
            "{} = {} does not fit a 7-bit data byte",
            field, value
        )));
    }
    Ok(())
}

/// Report interval applied to a pin at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinInterval {
    /// Analog pin number
    pub pin: u8,
    /// Packed interval as sent on the wire (bit 13 selects seconds)
    pub raw: u16,
}

/// Averaged one-shot read issued at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadNow {
    /// Analog pin number
    pub pin: u8,
    /// Reads to average
    pub average_loops: u8,
    /// Pause after each read (microseconds)
    pub delay_micros: u8,
    /// Digital pin powering the sensor, 0 for none
    pub power_pin: u8,
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum log level (`trace`, `debug`, `info`, `warn`, `error`)
    pub log_level: String,
    /// Analog input feature settings
    pub analog: AnalogInputConfig,
    /// Physical pin number of analog pin 0
    pub first_analog_pin: u8,
    /// Global sampling cadence (milliseconds)
    pub sampling_interval_ms: u32,
    /// Control loop period (milliseconds)
    pub loop_period_ms: u64,
    /// How long to run before exiting (milliseconds)
    pub run_duration_ms: u64,
    /// Analog pins left in analog mode after boot
    pub analog_pins: Vec<u8>,
    /// Per-pin report intervals
    pub report_intervals: Vec<PinInterval>,
    /// One-shot reads
    pub read_now: Vec<ReadNow>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            analog: AnalogInputConfig::default(),
            first_analog_pin: 14,
            sampling_interval_ms: 19,
            loop_period_ms: 1,
            run_duration_ms: 5000,
            analog_pins: vec![0, 1],
            report_intervals: vec![
                PinInterval {
                    pin: 0,
                    raw: SamplingInterval::millis(100).to_raw(),
                },
                PinInterval {
                    pin: 1,
                    raw: SamplingInterval::seconds(1).to_raw(),
                },
            ],
            read_now: vec![ReadNow {
                pin: 2,
                average_loops: 4,
                delay_micros: 10,
                power_pin: 0,
            }],
        }
    }
}

impl RunnerConfig {
    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, RunnerError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: RunnerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the board cannot run with
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.analog.pin_count == 0 {
            return Err(RunnerError::InvalidConfig(
                "board needs at least one analog pin".to_string(),
            ));
        }
        if u16::from(self.first_analog_pin) + u16::from(self.analog.pin_count) > 128 {
            return Err(RunnerError::InvalidConfig(format!(
                "analog pins {}..{} exceed the 7-bit pin space",
                self.first_analog_pin,
                u16::from(self.first_analog_pin) + u16::from(self.analog.pin_count)
            )));
        }
        if self.loop_period_ms == 0 {
            return Err(RunnerError::InvalidConfig(
                "loop period must be at least 1ms".to_string(),
            ));
        }
        if self.sampling_interval_ms > u32::from(MAX_DATA_WORD) {
            return Err(RunnerError::InvalidConfig(format!(
                "sampling interval {}ms does not fit two data bytes",
                self.sampling_interval_ms
            )));
        }

        for &pin in &self.analog_pins {
            check_data_byte("analog_pins", pin)?;
        }
        for interval in &self.report_intervals {
            check_data_byte("report_intervals.pin", interval.pin)?;
            if interval.raw > MAX_DATA_WORD {
                return Err(RunnerError::InvalidConfig(format!(
                    "report interval {:#06X} for pin {} does not fit two data bytes",
                    interval.raw, interval.pin
                )));
            }
        }
        for read in &self.read_now {
            check_data_byte("read_now.pin", read.pin)?;
            check_data_byte("read_now.average_loops", read.average_loops)?;
            check_data_byte("read_now.delay_micros", read.delay_micros)?;
            check_data_byte("read_now.power_pin", read.power_pin)?;
        }
        Ok(())
    }

    /// Host messages replayed after boot
    ///
    /// Pins not listed in `analog_pins` are switched to output, then
    /// intervals are configured and one-shot reads requested, all through
    /// the same wire path a connected client would use.
    pub fn startup_script(&self) -> Vec<HostMessage> {
        let mut script = Vec::new();

        for n in 0..self.analog.pin_count {
            if !self.analog_pins.contains(&n) {
                script.push(HostMessage::SetPinMode {
                    pin: self.first_analog_pin + n,
                    mode: PinMode::Output.as_byte(),
                });
            }
        }

        script.push(HostMessage::Sysex {
            command: sysex::SAMPLING_INTERVAL,
            payload: vec![
                (self.sampling_interval_ms & 0x7F) as u8,
                ((self.sampling_interval_ms >> 7) & 0x7F) as u8,
            ],
        });

        for interval in &self.report_intervals {
            script.push(HostMessage::Sysex {
                command: sysex::ANALOG_REPORT_INTERVAL,
                payload: vec![
                    interval.pin,
                    (interval.raw & 0x7F) as u8,
                    ((interval.raw >> 7) & 0x7F) as u8,
                ],
            });
        }

        for read in &self.read_now {
            script.push(HostMessage::Sysex {
                command: sysex::EXTENDED_ANALOG_READ,
                payload: vec![
                    analog_protocol::subcommand::READ_NOW,
                    read.pin,
                    read.average_loops,
                    read.delay_micros,
                    read.power_pin,
                ],
            });
        }

        script
    }
}
