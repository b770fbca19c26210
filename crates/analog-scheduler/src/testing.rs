//! Recording host for unit tests

use crate::host::{AnalogHardware, AnalogTransport, HostState};
use analog_protocol::AnalogPin;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use std::collections::VecDeque;

/// Value returned by a read once a pin's queue is exhausted
const IDLE_READING: u16 = 512;

/// First physical pin mapped to analog pin 0
pub const FIRST_ANALOG_PIN: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Read(AnalogPin),
    Level(u8, PinState),
    DisableOutput(AnalogPin),
    Sent(AnalogPin, u16),
}

pub struct RecordingHost {
    pin_count: u8,
    pub now: u32,
    pub analog_mode: Vec<bool>,
    pub resetting: bool,
    pub sampling_interval_ms: u32,
    reads: Vec<VecDeque<u16>>,
    events: Vec<Event>,
    delayed_ns: u64,
}

impl RecordingHost {
    /// Host with every pin in analog mode
    pub fn new(pin_count: u8) -> Self {
        Self {
            pin_count,
            now: 0,
            analog_mode: vec![true; usize::from(pin_count)],
            resetting: false,
            sampling_interval_ms: 19,
            reads: vec![VecDeque::new(); usize::from(pin_count)],
            events: Vec::new(),
            delayed_ns: 0,
        }
    }

    pub fn pin(&self, n: u8) -> AnalogPin {
        AnalogPin::new(n, self.pin_count).unwrap()
    }

    pub fn queue_reads(&mut self, pin: u8, values: &[u16]) {
        self.reads[usize::from(pin)].extend(values.iter().copied());
    }

    pub fn sent(&self) -> Vec<(AnalogPin, u16)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Sent(pin, value) => Some((*pin, *value)),
                _ => None,
            })
            .collect()
    }

    pub fn hardware_events(&self) -> Vec<Event> {
        self.events
            .iter()
            .copied()
            .filter(|e| !matches!(e, Event::Sent(..)))
            .collect()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn read_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Read(_)))
            .count()
    }

    pub fn delayed_us(&self) -> u64 {
        self.delayed_ns / 1000
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.delayed_ns = 0;
    }
}

impl HostState for RecordingHost {
    fn millis(&self) -> u32 {
        self.now
    }

    fn to_analog_pin(&self, pin: u8) -> Option<AnalogPin> {
        pin.checked_sub(FIRST_ANALOG_PIN)
            .and_then(|n| AnalogPin::new(n, self.pin_count).ok())
    }

    fn is_analog_read_mode(&self, pin: AnalogPin) -> bool {
        self.analog_mode[pin.index()]
    }

    fn is_resetting(&self) -> bool {
        self.resetting
    }

    fn sampling_interval_ms(&self) -> u32 {
        self.sampling_interval_ms
    }
}

impl AnalogTransport for RecordingHost {
    fn send_analog_value(&mut self, pin: AnalogPin, value: u16) {
        self.events.push(Event::Sent(pin, value));
    }
}

impl AnalogHardware for RecordingHost {
    fn read_raw(&mut self, pin: AnalogPin) -> u16 {
        self.events.push(Event::Read(pin));
        self.reads[pin.index()].pop_front().unwrap_or(IDLE_READING)
    }

    fn set_digital_level(&mut self, pin: u8, level: PinState) {
        self.events.push(Event::Level(pin, level));
    }

    fn disable_output_driver(&mut self, pin: AnalogPin) {
        self.events.push(Event::DisableOutput(pin));
    }
}

impl DelayNs for RecordingHost {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += u64::from(ns);
    }
}
