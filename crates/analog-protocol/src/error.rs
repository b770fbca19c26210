//! Protocol Error Types

use thiserror::Error;

/// Errors raised while decoding host messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Command payload shorter than its required fields
    #[error("Command {command:02X} truncated: need {expected} bytes, got {actual}")]
    Truncated {
        command: u8,
        expected: usize,
        actual: usize,
    },

    /// Analog pin index beyond the board's analog pins
    #[error("Analog pin {pin} out of range (board has {pin_count})")]
    PinOutOfRange { pin: u8, pin_count: u8 },

    /// Subcommand not known to the command family
    #[error("Unknown subcommand {subcommand:02X} for command {command:02X}")]
    UnknownSubcommand { command: u8, subcommand: u8 },

    /// Sysex frame without its end byte
    #[error("Unterminated sysex frame")]
    UnterminatedSysex,

    /// Payload byte with the high bit set
    #[error("Invalid data byte {0:02X}: payload bytes are 7-bit")]
    InvalidDataByte(u8),

    /// Status byte this layer does not understand
    #[error("Unsupported message {0:02X}")]
    UnsupportedMessage(u8),

    /// Empty input
    #[error("Empty message")]
    Empty,
}
