//! Capability Reply Entry

use crate::mode::PinMode;

/// ADC resolution advertised for analog-capable pins
pub const ANALOG_RESOLUTION_BITS: u8 = 10;

/// Mode/resolution pair an analog-capable pin contributes to a capability
/// response
pub fn capability_entry() -> [u8; 2] {
    [PinMode::Analog.as_byte(), ANALOG_RESOLUTION_BITS]
}
