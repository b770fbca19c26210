//! Host Collaborators
//!
//! The firmware framework owns pin modes, the transport and the hardware.
//! The analog input feature only sees them through these traits.

use analog_protocol::AnalogPin;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

/// Host bookkeeping the scheduler consults but never changes
pub trait HostState {
    /// Milliseconds since boot; expected to wrap
    fn millis(&self) -> u32;

    /// Analog index of a physical pin, if the pin is analog-capable
    fn to_analog_pin(&self, pin: u8) -> Option<AnalogPin>;

    /// Whether the pin is currently in analog-read mode
    fn is_analog_read_mode(&self, pin: AnalogPin) -> bool;

    /// Whether the host is in the middle of a system reset
    fn is_resetting(&self) -> bool;

    /// Global sampling cadence of the host (milliseconds)
    fn sampling_interval_ms(&self) -> u32;
}

/// Outbound path for reported values
pub trait AnalogTransport {
    /// Send one analog value to the connected client
    fn send_analog_value(&mut self, pin: AnalogPin, value: u16);
}

/// Raw pin access
pub trait AnalogHardware {
    /// Single conversion of an analog input
    fn read_raw(&mut self, pin: AnalogPin) -> u16;

    /// Drive a digital pin, used to power sensors around a reading
    fn set_digital_level(&mut self, pin: u8, level: PinState);

    /// Detach the digital output driver from a pin switched to analog input
    fn disable_output_driver(&mut self, _pin: AnalogPin) {}
}

/// Everything the analog input feature needs from its host
pub trait Host: HostState + AnalogTransport + AnalogHardware + DelayNs {}

impl<T> Host for T where T: HostState + AnalogTransport + AnalogHardware + DelayNs + ?Sized {}
