//! Firmata Analog Input Protocol
//!
//! Wire layer for variable-rate analog pin reporting: the packed sampling
//! interval, validated analog pin indices, pin modes, sysex framing and the
//! two analog command families understood by the analog input feature.

mod capability;
mod command;
mod error;
mod frame;
mod interval;
mod mode;
mod pin;

pub use capability::{capability_entry, ANALOG_RESOLUTION_BITS};
pub use command::{AnalogCommand, ReadNowRequest, NO_POWER_PIN};
pub use error::ProtocolError;
pub use frame::{encode_analog_message, HostMessage};
pub use interval::{decode, encode, SamplingInterval, TimeUnit};
pub use mode::PinMode;
pub use pin::AnalogPin;

/// Sysex command identifiers
pub mod sysex {
    /// Start of a sysex frame
    pub const START_SYSEX: u8 = 0xF0;
    /// End of a sysex frame
    pub const END_SYSEX: u8 = 0xF7;
    /// Analog value for pins beyond the 16 channel-message slots
    pub const EXTENDED_ANALOG: u8 = 0x6F;
    /// One-shot analog read family (`READ_NOW` subcommand)
    pub const EXTENDED_ANALOG_READ: u8 = 0x65;
    /// Per-pin report interval configuration
    pub const ANALOG_REPORT_INTERVAL: u8 = 0x66;
    /// Global sampling interval of the host
    pub const SAMPLING_INTERVAL: u8 = 0x7A;
    /// Ask for every pin's supported modes
    pub const CAPABILITY_QUERY: u8 = 0x6B;
    /// Reply to `CAPABILITY_QUERY`
    pub const CAPABILITY_RESPONSE: u8 = 0x6C;
    /// Separates pins in a capability response
    pub const CAPABILITY_PIN_END: u8 = 0x7F;
}

/// Channel message identifiers (high nibble, low nibble carries the pin)
pub mod message {
    /// Analog value for analog pins 0-15
    pub const ANALOG_MESSAGE: u8 = 0xE0;
    /// Legacy per-pin reporting toggle
    pub const REPORT_ANALOG: u8 = 0xC0;
}

/// `EXTENDED_ANALOG_READ` subcommands
pub mod subcommand {
    /// Read a pin once, optionally averaged and power-gated
    pub const READ_NOW: u8 = 0x00;
}
