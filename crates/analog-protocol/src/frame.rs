//! Host Message Framing
//!
//! Splits an incoming byte stream into the messages the analog runner cares
//! about and frames outgoing analog values.

use crate::error::ProtocolError;
use crate::message::{ANALOG_MESSAGE, REPORT_ANALOG};
use crate::sysex::{END_SYSEX, EXTENDED_ANALOG, START_SYSEX};
use serde::{Deserialize, Serialize};

/// Set a pin's mode: `[F4, pin, mode]`
const SET_PIN_MODE: u8 = 0xF4;
/// Reset the board
const SYSTEM_RESET: u8 = 0xFF;

/// A decoded host-to-board message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostMessage {
    /// Extension command envelope
    Sysex { command: u8, payload: Vec<u8> },
    /// Legacy reporting toggle for an analog pin
    ReportAnalog { pin: u8, enabled: bool },
    /// Pin mode change for a physical pin
    SetPinMode { pin: u8, mode: u8 },
    /// Full system reset
    SystemReset,
}

impl HostMessage {
    /// Parse the first message in `bytes`
    ///
    /// Returns the message and the number of bytes it occupied.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), ProtocolError> {
        let status = *bytes.first().ok_or(ProtocolError::Empty)?;

        match status {
            START_SYSEX => {
                let end = bytes
                    .iter()
                    .position(|&b| b == END_SYSEX)
                    .ok_or(ProtocolError::UnterminatedSysex)?;
                let body = &bytes[1..end];
                let (&command, payload) =
                    body.split_first().ok_or(ProtocolError::Truncated {
                        command: START_SYSEX,
                        expected: 1,
                        actual: 0,
                    })?;
                if let Some(&bad) = payload.iter().find(|&&b| b & 0x80 != 0) {
                    return Err(ProtocolError::InvalidDataByte(bad));
                }
                Ok((
                    HostMessage::Sysex {
                        command,
                        payload: payload.to_vec(),
                    },
                    end + 1,
                ))
            }
            SET_PIN_MODE => {
                let [pin, mode] = Self::data_bytes::<2>(status, &bytes[1..])?;
                Ok((HostMessage::SetPinMode { pin, mode }, 3))
            }
            SYSTEM_RESET => Ok((HostMessage::SystemReset, 1)),
            s if s & 0xF0 == REPORT_ANALOG => {
                let [enabled] = Self::data_bytes::<1>(status, &bytes[1..])?;
                Ok((
                    HostMessage::ReportAnalog {
                        pin: s & 0x0F,
                        enabled: enabled != 0,
                    },
                    2,
                ))
            }
            other => Err(ProtocolError::UnsupportedMessage(other)),
        }
    }

    /// Serialize back into wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            HostMessage::Sysex { command, payload } => {
                let mut bytes = Vec::with_capacity(payload.len() + 3);
                bytes.push(START_SYSEX);
                bytes.push(*command);
                bytes.extend(payload.iter().map(|b| b & 0x7F));
                bytes.push(END_SYSEX);
                bytes
            }
            HostMessage::ReportAnalog { pin, enabled } => {
                vec![REPORT_ANALOG | (pin & 0x0F), u8::from(*enabled)]
            }
            HostMessage::SetPinMode { pin, mode } => vec![SET_PIN_MODE, pin & 0x7F, mode & 0x7F],
            HostMessage::SystemReset => vec![SYSTEM_RESET],
        }
    }

    fn data_bytes<const N: usize>(status: u8, rest: &[u8]) -> Result<[u8; N], ProtocolError> {
        let data: [u8; N] = rest
            .get(..N)
            .and_then(|s| s.try_into().ok())
            .ok_or(ProtocolError::Truncated {
                command: status,
                expected: N,
                actual: rest.len(),
            })?;
        if let Some(&bad) = data.iter().find(|&&b| b & 0x80 != 0) {
            return Err(ProtocolError::InvalidDataByte(bad));
        }
        Ok(data)
    }
}

/// Frame an analog value for the transport
///
/// Pins 0-15 fit the channel message; higher pins go through the extended
/// analog sysex.
pub fn encode_analog_message(pin: u8, value: u16) -> Vec<u8> {
    let lsb = (value & 0x7F) as u8;
    let msb = ((value >> 7) & 0x7F) as u8;
    if pin & 0x0F == pin {
        vec![ANALOG_MESSAGE | pin, lsb, msb]
    } else {
        vec![START_SYSEX, EXTENDED_ANALOG, pin & 0x7F, lsb, msb, END_SYSEX]
    }
}
