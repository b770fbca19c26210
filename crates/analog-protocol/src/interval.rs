//! Packed Sampling Interval
//!
//! The wire carries a pin's report interval in 14 bits: bit 13 selects the
//! time unit and bits 0-12 hold the magnitude. Anything above bit 13 is
//! discarded.

use serde::{Deserialize, Serialize};

/// Bit 13: 0 = milliseconds, 1 = seconds
const UNIT_FLAG: u16 = 0x2000;
/// Bits 0-12: interval magnitude
const MAGNITUDE_MASK: u16 = 0x1FFF;

/// Unit of a sampling interval magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Magnitude counts milliseconds
    #[default]
    Milliseconds,
    /// Magnitude counts whole seconds
    Seconds,
}

/// A per-pin report interval
///
/// A zero magnitude means "follow the host's global sampling cadence".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SamplingInterval {
    unit: TimeUnit,
    magnitude: u16,
}

impl SamplingInterval {
    /// Follow the global sampling cadence
    pub const DEFAULT_CADENCE: Self = Self {
        unit: TimeUnit::Milliseconds,
        magnitude: 0,
    };

    /// Report on every tick
    pub const EVERY_TICK: Self = Self {
        unit: TimeUnit::Milliseconds,
        magnitude: 1,
    };

    /// Largest magnitude representable in 13 bits
    pub const MAX_MAGNITUDE: u16 = MAGNITUDE_MASK;

    /// Create an interval, masking the magnitude to 13 bits
    pub fn new(unit: TimeUnit, magnitude: u16) -> Self {
        Self {
            unit,
            magnitude: magnitude & MAGNITUDE_MASK,
        }
    }

    /// Interval in milliseconds
    pub fn millis(magnitude: u16) -> Self {
        Self::new(TimeUnit::Milliseconds, magnitude)
    }

    /// Interval in seconds
    pub fn seconds(magnitude: u16) -> Self {
        Self::new(TimeUnit::Seconds, magnitude)
    }

    /// Unpack a raw wire value
    pub fn from_raw(raw: u16) -> Self {
        let unit = if raw & UNIT_FLAG != 0 {
            TimeUnit::Seconds
        } else {
            TimeUnit::Milliseconds
        };
        Self::new(unit, raw)
    }

    /// Assemble the 14-bit wire value from its two 7-bit bytes
    pub fn from_7bit(lsb: u8, msb: u8) -> Self {
        Self::from_raw(u16::from(lsb & 0x7F) | (u16::from(msb & 0x7F) << 7))
    }

    /// Pack into the raw wire value
    pub fn to_raw(self) -> u16 {
        match self.unit {
            TimeUnit::Milliseconds => self.magnitude,
            TimeUnit::Seconds => self.magnitude | UNIT_FLAG,
        }
    }

    /// Time unit
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// 13-bit magnitude
    pub fn magnitude(&self) -> u16 {
        self.magnitude
    }

    /// Canonical duration in milliseconds
    pub fn as_millis(&self) -> u32 {
        let magnitude = u32::from(self.magnitude);
        match self.unit {
            TimeUnit::Milliseconds => magnitude,
            TimeUnit::Seconds => magnitude * 1000,
        }
    }

    /// Whether this interval defers to the global sampling cadence
    pub fn is_default_cadence(&self) -> bool {
        self.magnitude == 0
    }
}

/// Decode a raw packed interval into milliseconds
pub fn decode(raw: u16) -> u32 {
    SamplingInterval::from_raw(raw).as_millis()
}

/// Pack an interval into its raw wire value
pub fn encode(interval: SamplingInterval) -> u16 {
    interval.to_raw()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_milliseconds() {
        assert_eq!(decode(5), 5);
        assert_eq!(decode(0), 0);
        assert_eq!(decode(0x1FFF), 8191);
    }

    #[test]
    fn test_decode_seconds() {
        // 0x2005: unit flag set, magnitude 5
        assert_eq!(decode(0x2005), 5000);
        assert_eq!(decode(0x3FFF), 8_191_000);
    }

    #[test]
    fn test_high_bits_discarded() {
        assert_eq!(decode(0x4005), 5);
        assert_eq!(decode(0xE005), 5000);
    }

    #[test]
    fn test_from_7bit() {
        // lsb 0x05, msb 0x40 -> 0x2005
        let interval = SamplingInterval::from_7bit(0x05, 0x40);
        assert_eq!(interval.unit(), TimeUnit::Seconds);
        assert_eq!(interval.magnitude(), 5);
        assert_eq!(interval.as_millis(), 5000);

        // Stray eighth bits are not part of a 7-bit byte
        let interval = SamplingInterval::from_7bit(0x85, 0x00);
        assert_eq!(interval.as_millis(), 5);
    }

    #[test]
    fn test_new_masks_magnitude() {
        let interval = SamplingInterval::millis(0xFFFF);
        assert_eq!(interval.magnitude(), SamplingInterval::MAX_MAGNITUDE);
    }

    #[test]
    fn test_default_cadence() {
        assert!(SamplingInterval::DEFAULT_CADENCE.is_default_cadence());
        assert!(SamplingInterval::from_raw(0x2000).is_default_cadence());
        assert!(!SamplingInterval::EVERY_TICK.is_default_cadence());
        assert_eq!(SamplingInterval::EVERY_TICK.as_millis(), 1);
    }

    proptest! {
        #[test]
        fn test_bits_above_13_ignored(raw in any::<u16>()) {
            prop_assert_eq!(decode(raw), decode(raw & 0x3FFF));
        }

        #[test]
        fn test_encode_keeps_14_bits(raw in any::<u16>()) {
            prop_assert_eq!(encode(SamplingInterval::from_raw(raw)), raw & 0x3FFF);
        }
    }
}
