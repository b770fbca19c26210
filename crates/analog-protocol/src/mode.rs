//! Firmata Pin Modes

use serde::{Deserialize, Serialize};

/// Pin modes a host can assign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PinMode {
    /// Digital input
    Input = 0x00,
    /// Digital output
    Output = 0x01,
    /// Analog input, sampled and reported by the analog input feature
    Analog = 0x02,
    /// PWM output
    Pwm = 0x03,
    /// Servo output
    Servo = 0x04,
    /// Shift register
    Shift = 0x05,
    /// I2C bus pin
    I2c = 0x06,
    /// OneWire bus pin
    OneWire = 0x07,
    /// Stepper driver pin
    Stepper = 0x08,
    /// Rotary encoder input
    Encoder = 0x09,
    /// Hardware or software serial
    Serial = 0x0A,
    /// Digital input with pull-up
    InputPullup = 0x0B,
    /// Pin excluded from host control
    Ignore = 0x7F,
}

impl PinMode {
    /// Mode byte as sent on the wire
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Parse a mode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        let mode = match byte {
            0x00 => PinMode::Input,
            0x01 => PinMode::Output,
            0x02 => PinMode::Analog,
            0x03 => PinMode::Pwm,
            0x04 => PinMode::Servo,
            0x05 => PinMode::Shift,
            0x06 => PinMode::I2c,
            0x07 => PinMode::OneWire,
            0x08 => PinMode::Stepper,
            0x09 => PinMode::Encoder,
            0x0A => PinMode::Serial,
            0x0B => PinMode::InputPullup,
            0x7F => PinMode::Ignore,
            _ => return None,
        };
        Some(mode)
    }
}

impl Default for PinMode {
    fn default() -> Self {
        PinMode::Output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_bytes() {
        assert_eq!(PinMode::Analog.as_byte(), 0x02);
        assert_eq!(PinMode::from_byte(0x02), Some(PinMode::Analog));
        assert_eq!(PinMode::from_byte(0x0B), Some(PinMode::InputPullup));
        assert_eq!(PinMode::from_byte(0x42), None);
    }
}
