//! Simulated Board
//!
//! Stands in for the firmware framework: pin mode table, ADC, GPIO, a
//! busy-wait delay and a transport that frames analog messages into an
//! output buffer.

use crate::settings::RunnerConfig;
use analog_protocol::{encode_analog_message, AnalogPin, PinMode};
use analog_scheduler::{AnalogHardware, AnalogTransport, HostState};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tokio::time::Instant;
use tracing::{debug, trace};

/// Full scale of the simulated 10-bit ADC
const ADC_MAX: u16 = 1023;

/// Simulated board with analog inputs following a triangle wave
pub struct SimulatedBoard {
    /// Boot time, the origin of `millis()`
    boot: Instant,
    /// Physical pin number of analog pin 0
    first_analog_pin: u8,
    /// Number of analog pins
    analog_pin_count: u8,
    /// Mode of every physical pin
    modes: Vec<PinMode>,
    /// Whether a system reset is in progress
    resetting: bool,
    /// Global sampling cadence (milliseconds)
    sampling_interval_ms: u32,
    /// Last level driven on each digital pin
    levels: HashMap<u8, PinState>,
    /// Conversions performed, also perturbs the simulated noise
    conversions: u64,
    /// Framed bytes written to the transport
    output: Vec<u8>,
    /// Values sent per analog pin
    reports: Vec<u32>,
}

impl SimulatedBoard {
    /// Create a board laid out per the runner configuration
    pub fn new(config: &RunnerConfig) -> Self {
        let total_pins = usize::from(config.first_analog_pin) + usize::from(config.analog.pin_count);
        debug!(
            "Simulated board: {} pins, analog from {}",
            total_pins, config.first_analog_pin
        );
        Self {
            boot: Instant::now(),
            first_analog_pin: config.first_analog_pin,
            analog_pin_count: config.analog.pin_count,
            modes: vec![PinMode::default(); total_pins],
            resetting: false,
            sampling_interval_ms: config.sampling_interval_ms,
            levels: HashMap::new(),
            conversions: 0,
            output: Vec::new(),
            reports: vec![0; usize::from(config.analog.pin_count)],
        }
    }

    /// Number of physical pins
    pub fn total_pins(&self) -> u8 {
        self.modes.len() as u8
    }

    /// Mode of a physical pin
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(usize::from(pin)).copied()
    }

    /// Record a mode change; returns `false` for pins the board does not have
    pub fn set_mode(&mut self, pin: u8, mode: PinMode) -> bool {
        match self.modes.get_mut(usize::from(pin)) {
            Some(slot) => {
                *slot = mode;
                true
            }
            None => false,
        }
    }

    /// Physical pin number of an analog pin
    pub fn physical_pin(&self, pin: AnalogPin) -> u8 {
        self.first_analog_pin + pin.number()
    }

    /// Every analog pin of the board
    pub fn analog_pins(&self) -> impl Iterator<Item = AnalogPin> {
        AnalogPin::all(self.analog_pin_count)
    }

    /// Enter or leave the reset sequence
    pub fn set_resetting(&mut self, resetting: bool) {
        self.resetting = resetting;
    }

    /// Change the global sampling cadence
    pub fn set_sampling_interval(&mut self, interval_ms: u32) {
        self.sampling_interval_ms = interval_ms;
    }

    /// Last level driven on a digital pin
    pub fn level(&self, pin: u8) -> Option<PinState> {
        self.levels.get(&pin).copied()
    }

    /// Bytes written to the transport so far
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Append raw bytes to the transport (replies owned by the host)
    pub fn write(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    /// Values sent per analog pin
    pub fn reports(&self) -> &[u32] {
        &self.reports
    }

    fn simulated_reading(&self, pin: AnalogPin) -> u16 {
        // Triangle wave with a per-pin phase, one full sweep every ~8s
        let phase = (self.millis() / 4 + u32::from(pin.number()) * 170) % (2 * u32::from(ADC_MAX));
        let wave = if phase <= u32::from(ADC_MAX) {
            phase
        } else {
            2 * u32::from(ADC_MAX) - phase
        };

        let mut hasher = DefaultHasher::new();
        self.conversions.hash(&mut hasher);
        pin.hash(&mut hasher);
        let noise = (hasher.finish() % 7) as i32 - 3;

        (wave as i32 + noise).clamp(0, i32::from(ADC_MAX)) as u16
    }
}

impl HostState for SimulatedBoard {
    fn millis(&self) -> u32 {
        self.boot.elapsed().as_millis() as u32
    }

    fn to_analog_pin(&self, pin: u8) -> Option<AnalogPin> {
        pin.checked_sub(self.first_analog_pin)
            .and_then(|n| AnalogPin::new(n, self.analog_pin_count).ok())
    }

    fn is_analog_read_mode(&self, pin: AnalogPin) -> bool {
        self.mode(self.physical_pin(pin)) == Some(PinMode::Analog)
    }

    fn is_resetting(&self) -> bool {
        self.resetting
    }

    fn sampling_interval_ms(&self) -> u32 {
        self.sampling_interval_ms
    }
}

impl AnalogTransport for SimulatedBoard {
    fn send_analog_value(&mut self, pin: AnalogPin, value: u16) {
        self.output
            .extend_from_slice(&encode_analog_message(pin.number(), value));
        self.reports[pin.index()] += 1;
        debug!("{} -> {}", pin, value);
    }
}

impl AnalogHardware for SimulatedBoard {
    fn read_raw(&mut self, pin: AnalogPin) -> u16 {
        let value = self.simulated_reading(pin);
        self.conversions += 1;
        value
    }

    fn set_digital_level(&mut self, pin: u8, level: PinState) {
        trace!("Pin {} driven {:?}", pin, level);
        self.levels.insert(pin, level);
    }

    fn disable_output_driver(&mut self, pin: AnalogPin) {
        let physical = self.physical_pin(pin);
        trace!("Output driver off for pin {}", physical);
        self.levels.remove(&physical);
    }
}

impl DelayNs for SimulatedBoard {
    fn delay_ns(&mut self, ns: u32) {
        let until = std::time::Instant::now() + std::time::Duration::from_nanos(u64::from(ns));
        while std::time::Instant::now() < until {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> SimulatedBoard {
        SimulatedBoard::new(&RunnerConfig::default())
    }

    #[test]
    fn test_pin_mapping() {
        let board = board();
        assert_eq!(board.total_pins(), 20);
        assert_eq!(board.to_analog_pin(13), None);
        assert_eq!(board.to_analog_pin(14).map(|p| p.number()), Some(0));
        assert_eq!(board.to_analog_pin(19).map(|p| p.number()), Some(5));
        assert_eq!(board.to_analog_pin(20), None);
    }

    #[test]
    fn test_analog_mode_follows_mode_table() {
        let mut board = board();
        let pin = board.to_analog_pin(15).unwrap();
        assert!(!board.is_analog_read_mode(pin));
        assert!(board.set_mode(15, PinMode::Analog));
        assert!(board.is_analog_read_mode(pin));
        assert!(!board.set_mode(40, PinMode::Analog));
    }

    #[test]
    fn test_readings_within_adc_range() {
        let mut board = board();
        for pin in board.analog_pins().collect::<Vec<_>>() {
            for _ in 0..20 {
                assert!(board.read_raw(pin) <= ADC_MAX);
            }
        }
    }

    #[test]
    fn test_transport_frames_values() {
        let mut board = board();
        let pin = board.to_analog_pin(16).unwrap();
        board.send_analog_value(pin, 1023);
        assert_eq!(board.output(), &[0xE2, 0x7F, 0x07]);
        assert_eq!(board.reports()[2], 1);
    }

    #[test]
    fn test_power_pin_levels() {
        let mut board = board();
        board.set_digital_level(7, PinState::High);
        assert_eq!(board.level(7), Some(PinState::High));
        board.set_digital_level(7, PinState::Low);
        assert_eq!(board.level(7), Some(PinState::Low));
    }
}
