//! Analog Command Parsing
//!
//! Decodes the payload of the two sysex command families owned by the
//! analog input feature. Pin bytes are validated here so nothing past the
//! protocol boundary handles a raw index.

use crate::error::ProtocolError;
use crate::interval::SamplingInterval;
use crate::pin::AnalogPin;
use crate::{subcommand, sysex};
use serde::{Deserialize, Serialize};

/// Power pin byte meaning "no power pin"
pub const NO_POWER_PIN: u8 = 0;

/// Default number of averaged reads for `READ_NOW`
const DEFAULT_AVERAGE_LOOPS: u8 = 1;
/// Upper bound on averaged reads for `READ_NOW`
const MAX_AVERAGE_LOOPS: u8 = 63;
/// Default pause after each `READ_NOW` read (microseconds)
const DEFAULT_READ_DELAY_US: u8 = 10;

/// One-shot averaged read request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadNowRequest {
    /// Pin to read
    pub pin: AnalogPin,
    /// Number of reads to average, always within [1, 63]
    pub average_loops: u8,
    /// Pause after each read (microseconds)
    pub delay_micros: u8,
    /// Digital pin driven high for the duration of the reads
    pub power_pin: Option<u8>,
}

impl ReadNowRequest {
    /// Request with every optional field at its default
    pub fn new(pin: AnalogPin) -> Self {
        Self {
            pin,
            average_loops: DEFAULT_AVERAGE_LOOPS,
            delay_micros: DEFAULT_READ_DELAY_US,
            power_pin: None,
        }
    }

    /// Set the averaging count, clamped to [1, 63]
    pub fn with_average_loops(mut self, loops: u8) -> Self {
        self.average_loops = loops.clamp(1, MAX_AVERAGE_LOOPS);
        self
    }

    /// Set the pause after each read
    pub fn with_delay_micros(mut self, delay_micros: u8) -> Self {
        self.delay_micros = delay_micros;
        self
    }

    /// Set the power pin; `NO_POWER_PIN` clears it
    pub fn with_power_pin(mut self, power_pin: u8) -> Self {
        self.power_pin = (power_pin != NO_POWER_PIN).then_some(power_pin);
        self
    }
}

/// Commands handled by the analog input feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalogCommand {
    /// Change how often a pin is reported
    SetReportInterval {
        pin: AnalogPin,
        interval: SamplingInterval,
    },
    /// Read a pin once and report the value immediately
    ReadNow(ReadNowRequest),
}

impl AnalogCommand {
    /// Whether a sysex command identifier belongs to the analog input feature
    pub fn is_analog_command(command: u8) -> bool {
        matches!(
            command,
            sysex::ANALOG_REPORT_INTERVAL | sysex::EXTENDED_ANALOG_READ
        )
    }

    /// Parse a sysex payload
    ///
    /// Returns `Ok(None)` when the command identifier is not an analog
    /// command, so the caller can forward it elsewhere.
    pub fn parse(
        command: u8,
        payload: &[u8],
        pin_count: u8,
    ) -> Result<Option<Self>, ProtocolError> {
        match command {
            sysex::ANALOG_REPORT_INTERVAL => {
                Self::parse_report_interval(payload, pin_count).map(Some)
            }
            sysex::EXTENDED_ANALOG_READ => Self::parse_read(payload, pin_count).map(Some),
            _ => Ok(None),
        }
    }

    /// `[pin, intervalLow7, intervalHigh7?]`
    fn parse_report_interval(payload: &[u8], pin_count: u8) -> Result<Self, ProtocolError> {
        let (pin, lsb) = match payload {
            [pin, lsb, ..] => (*pin, *lsb),
            _ => {
                return Err(ProtocolError::Truncated {
                    command: sysex::ANALOG_REPORT_INTERVAL,
                    expected: 2,
                    actual: payload.len(),
                })
            }
        };
        let msb = payload.get(2).copied().unwrap_or(0);

        Ok(AnalogCommand::SetReportInterval {
            pin: AnalogPin::new(pin, pin_count)?,
            interval: SamplingInterval::from_7bit(lsb, msb),
        })
    }

    /// `[subcommand, pin, averageLoops?, delayMicros?, powerPin?]`
    fn parse_read(payload: &[u8], pin_count: u8) -> Result<Self, ProtocolError> {
        let (sub, pin) = match payload {
            [sub, pin, ..] => (*sub, *pin),
            _ => {
                return Err(ProtocolError::Truncated {
                    command: sysex::EXTENDED_ANALOG_READ,
                    expected: 2,
                    actual: payload.len(),
                })
            }
        };

        if sub != subcommand::READ_NOW {
            return Err(ProtocolError::UnknownSubcommand {
                command: sysex::EXTENDED_ANALOG_READ,
                subcommand: sub,
            });
        }

        let mut request = ReadNowRequest::new(AnalogPin::new(pin, pin_count)?);
        if let Some(&loops) = payload.get(2) {
            request = request.with_average_loops(loops);
        }
        if let Some(&delay) = payload.get(3) {
            request = request.with_delay_micros(delay);
        }
        if let Some(&power_pin) = payload.get(4) {
            request = request.with_power_pin(power_pin);
        }

        Ok(AnalogCommand::ReadNow(request))
    }
}
