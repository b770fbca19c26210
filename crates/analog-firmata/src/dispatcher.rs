//! Host Command Dispatcher
//!
//! Owns the board and every registered feature, routes decoded host
//! messages to them and drives their periodic reports.

use crate::board::SimulatedBoard;
use analog_protocol::{sysex, HostMessage, PinMode};
use analog_scheduler::{FeatureRegistry, FirmataFeature, HostState};
use tracing::{debug, info, warn};

/// Lower bound for the global sampling cadence (milliseconds)
const MIN_SAMPLING_INTERVAL_MS: u32 = 1;
/// High bit marking a status (command) byte
const STATUS_BIT: u8 = 0x80;

/// Routes host messages to registered features
pub struct Dispatcher {
    /// Board the features run against
    board: SimulatedBoard,
    /// Registered features, asked in registration order
    features: Vec<Box<dyn FirmataFeature>>,
    /// Time of the last global-cadence tick
    last_cadence_ms: u32,
    /// Sysex commands no feature claimed
    unhandled: usize,
}

impl Dispatcher {
    /// Create a dispatcher with no features
    pub fn new(board: SimulatedBoard) -> Self {
        let last_cadence_ms = board.millis();
        Self {
            board,
            features: Vec::new(),
            last_cadence_ms,
            unhandled: 0,
        }
    }

    /// The board
    pub fn board(&self) -> &SimulatedBoard {
        &self.board
    }

    /// Number of registered features
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Sysex commands that fell through to the fallback
    pub fn unhandled(&self) -> usize {
        self.unhandled
    }

    /// Decode and handle every message in `bytes`, returning how many were handled
    ///
    /// A message that does not parse is dropped along with its data bytes;
    /// decoding resumes at the next status byte.
    pub fn handle_bytes(&mut self, mut bytes: &[u8]) -> usize {
        let mut handled = 0;
        while !bytes.is_empty() {
            match HostMessage::parse(bytes) {
                Ok((message, used)) => {
                    self.handle_message(message);
                    bytes = &bytes[used..];
                    handled += 1;
                }
                Err(e) => {
                    warn!("Dropping host message: {}", e);
                    let skip = bytes[1..]
                        .iter()
                        .position(|&b| b & STATUS_BIT != 0)
                        .map_or(bytes.len(), |i| i + 1);
                    bytes = &bytes[skip..];
                }
            }
        }
        handled
    }

    /// Handle one decoded message
    pub fn handle_message(&mut self, message: HostMessage) {
        match message {
            HostMessage::Sysex { command, payload } => self.handle_sysex(command, &payload),
            HostMessage::ReportAnalog { pin, enabled } => self.report_analog(pin, enabled),
            HostMessage::SetPinMode { pin, mode } => match PinMode::from_byte(mode) {
                Some(mode) => self.set_pin_mode(pin, mode),
                None => warn!("Ignoring unknown mode {:02X} for pin {}", mode, pin),
            },
            HostMessage::SystemReset => self.system_reset(),
        }
    }

    /// Change a physical pin's mode and let the features react
    pub fn set_pin_mode(&mut self, pin: u8, mode: PinMode) {
        if !self.board.set_mode(pin, mode) {
            warn!("Ignoring mode change for unknown pin {}", pin);
            return;
        }

        let mut claimed = false;
        for feature in &mut self.features {
            claimed |= feature.handle_pin_mode(pin, mode, &mut self.board);
        }
        if !claimed {
            debug!("Pin {} set to {:?}, no feature claimed it", pin, mode);
        }
    }

    /// Capability response: each pin's feature entries, `7F`-terminated
    pub fn capability_response(&self) -> Vec<u8> {
        let mut response = vec![sysex::START_SYSEX, sysex::CAPABILITY_RESPONSE];
        for pin in 0..self.board.total_pins() {
            for feature in &self.features {
                feature.handle_capability(pin, &self.board, &mut response);
            }
            response.push(sysex::CAPABILITY_PIN_END);
        }
        response.push(sysex::END_SYSEX);
        response
    }

    /// Reset every feature and restore analog pins to analog mode
    ///
    /// Features see `is_resetting()` for the whole sequence, so restoring the
    /// analog pins does not send anything.
    pub fn system_reset(&mut self) {
        info!("System reset");
        self.board.set_resetting(true);

        for feature in &mut self.features {
            feature.reset();
        }

        let analog: Vec<u8> = self
            .board
            .analog_pins()
            .map(|pin| self.board.physical_pin(pin))
            .collect();
        for pin in analog {
            self.set_pin_mode(pin, PinMode::Analog);
        }

        self.board.set_resetting(false);
    }

    /// One pass of the control loop
    ///
    /// Returns whether this pass was a global-cadence tick.
    pub fn poll(&mut self) -> bool {
        let now = self.board.millis();
        let global_tick =
            now.wrapping_sub(self.last_cadence_ms) >= self.board.sampling_interval_ms();
        if global_tick {
            self.last_cadence_ms = now;
        }

        for feature in &mut self.features {
            feature.report(global_tick, &mut self.board);
        }
        global_tick
    }

    fn handle_sysex(&mut self, command: u8, payload: &[u8]) {
        match command {
            sysex::SAMPLING_INTERVAL => {
                let interval = match payload {
                    [lsb, msb, ..] => u32::from(*lsb) | (u32::from(*msb) << 7),
                    [lsb] => u32::from(*lsb),
                    [] => {
                        warn!("Ignoring empty sampling interval");
                        return;
                    }
                };
                let interval = interval.max(MIN_SAMPLING_INTERVAL_MS);
                info!("Global sampling interval set to {}ms", interval);
                self.board.set_sampling_interval(interval);
            }
            sysex::CAPABILITY_QUERY => {
                let response = self.capability_response();
                self.board.write(&response);
            }
            _ => {
                for feature in &mut self.features {
                    if feature.handle_sysex(command, payload, &mut self.board) {
                        return;
                    }
                }
                self.unhandled += 1;
                debug!("No feature handled sysex {:02X}", command);
            }
        }
    }

    fn report_analog(&mut self, pin: u8, enabled: bool) {
        for feature in &mut self.features {
            if let Some(handler) = feature.report_analog_handler() {
                handler.report_analog(pin, enabled, &mut self.board);
                return;
            }
        }
        debug!("No report-analog handler registered");
    }
}

impl FeatureRegistry for Dispatcher {
    fn register(&mut self, feature: Box<dyn FirmataFeature>) {
        info!("Registered feature {}", feature.name());
        self.features.push(feature);
    }
}
