//! Validated Analog Pin Index

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into the analog-only pin space, checked against the board's
/// analog pin count when it crosses the protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnalogPin(u8);

impl AnalogPin {
    /// Validate a raw pin byte against the analog pin count
    pub fn new(raw: u8, pin_count: u8) -> Result<Self, ProtocolError> {
        if raw < pin_count {
            Ok(Self(raw))
        } else {
            Err(ProtocolError::PinOutOfRange {
                pin: raw,
                pin_count,
            })
        }
    }

    /// Analog pin number as sent on the wire
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Registry slot for this pin
    pub fn index(&self) -> usize {
        usize::from(self.0)
    }

    /// Every pin of a board with `pin_count` analog inputs
    pub fn all(pin_count: u8) -> impl Iterator<Item = AnalogPin> {
        (0..pin_count).map(AnalogPin)
    }
}

impl fmt::Display for AnalogPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}
