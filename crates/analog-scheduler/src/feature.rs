//! Analog Input Feature
//!
//! Connects the scheduler and sampler to the host's command dispatcher.
//! The feature registers itself with a [`FeatureRegistry`] when it is built;
//! the host then drives it through the [`FirmataFeature`] trait object.

use crate::host::{Host, HostState};
use crate::sampler::{Sampler, SmoothingConfig};
use crate::scheduler::{PinSchedule, PinScheduler};
use analog_protocol::{capability_entry, AnalogCommand, AnalogPin, PinMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Hooks a host dispatcher calls on every registered feature
pub trait FirmataFeature {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// A physical pin changed mode; returns whether this feature owns the mode
    fn handle_pin_mode(&mut self, pin: u8, mode: PinMode, host: &mut dyn Host) -> bool;

    /// Append this feature's capability bytes for a physical pin
    fn handle_capability(&self, pin: u8, host: &dyn HostState, out: &mut Vec<u8>);

    /// Handle a sysex command; returns `false` to let the host try elsewhere
    fn handle_sysex(&mut self, command: u8, payload: &[u8], host: &mut dyn Host) -> bool;

    /// Return to power-on state
    fn reset(&mut self);

    /// Periodic report hook, `global_tick` marks the host's sampling cadence
    fn report(&mut self, global_tick: bool, host: &mut dyn Host);

    /// Handler for the legacy per-pin report toggle, if this feature takes it
    fn report_analog_handler(&mut self) -> Option<&mut dyn ReportAnalogHandler> {
        None
    }
}

/// Receiver of the per-pin report-analog toggle
pub trait ReportAnalogHandler {
    /// Switch reporting for a raw analog pin number on or off
    fn report_analog(&mut self, pin: u8, enabled: bool, host: &mut dyn Host);
}

/// Where features are registered at construction
pub trait FeatureRegistry {
    /// Take ownership of a feature and start dispatching to it
    fn register(&mut self, feature: Box<dyn FirmataFeature>);
}

/// Analog input feature configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalogInputConfig {
    /// Number of analog-capable pins on the board
    pub pin_count: u8,
    /// Smoothing for scheduled reports
    pub smoothing: SmoothingConfig,
}

impl Default for AnalogInputConfig {
    fn default() -> Self {
        Self {
            pin_count: 6,
            smoothing: SmoothingConfig::default(),
        }
    }
}

/// Variable-rate analog input reporting
pub struct AnalogInputFeature {
    scheduler: PinScheduler,
}

impl AnalogInputFeature {
    /// Create the feature
    pub fn new(config: AnalogInputConfig) -> Self {
        Self {
            scheduler: PinScheduler::new(config.pin_count, Sampler::new(config.smoothing)),
        }
    }

    /// Create the feature and hand it to the host's registry
    pub fn attach<R>(config: AnalogInputConfig, registry: &mut R)
    where
        R: FeatureRegistry + ?Sized,
    {
        info!("Attaching analog input feature ({} pins)", config.pin_count);
        registry.register(Box::new(Self::new(config)));
    }

    /// Scheduling state of a pin
    pub fn schedule(&self, pin: AnalogPin) -> &PinSchedule {
        self.scheduler.schedule(pin)
    }

    /// Analog pin behind a physical pin, if this feature schedules it
    fn own_pin<H>(&self, pin: u8, host: &H) -> Option<AnalogPin>
    where
        H: HostState + ?Sized,
    {
        host.to_analog_pin(pin)
            .and_then(|analog| AnalogPin::new(analog.number(), self.scheduler.pin_count()).ok())
    }

    fn handle_command(&mut self, command: AnalogCommand, host: &mut dyn Host) {
        match command {
            AnalogCommand::SetReportInterval { pin, interval } => {
                let now = host.millis();
                self.scheduler.configure_interval(pin, interval, now);
            }
            AnalogCommand::ReadNow(request) => {
                let value = self.scheduler.sampler().on_demand_read(host, &request);
                host.send_analog_value(request.pin, value);
            }
        }
    }
}

impl FirmataFeature for AnalogInputFeature {
    fn name(&self) -> &'static str {
        "analog-input"
    }

    fn handle_pin_mode(&mut self, pin: u8, mode: PinMode, host: &mut dyn Host) -> bool {
        let Some(analog) = self.own_pin(pin, &*host) else {
            return false;
        };
        let now = host.millis();

        if mode == PinMode::Analog {
            self.scheduler.enable_pin(analog, now, host);
            host.disable_output_driver(analog);
            true
        } else {
            self.scheduler.disable_pin(analog, now);
            false
        }
    }

    fn handle_capability(&self, pin: u8, host: &dyn HostState, out: &mut Vec<u8>) {
        if self.own_pin(pin, host).is_some() {
            out.extend_from_slice(&capability_entry());
        }
    }

    fn handle_sysex(&mut self, command: u8, payload: &[u8], host: &mut dyn Host) -> bool {
        match AnalogCommand::parse(command, payload, self.scheduler.pin_count()) {
            Ok(Some(cmd)) => {
                debug!("Analog command {:?}", cmd);
                self.handle_command(cmd, host);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Ignoring analog command {:02X}: {}", command, e);
                true
            }
        }
    }

    fn reset(&mut self) {
        self.scheduler.reset();
    }

    fn report(&mut self, global_tick: bool, host: &mut dyn Host) {
        let now = host.millis();
        self.scheduler.tick(now, global_tick, host);
    }

    fn report_analog_handler(&mut self) -> Option<&mut dyn ReportAnalogHandler> {
        Some(self)
    }
}

impl ReportAnalogHandler for AnalogInputFeature {
    fn report_analog(&mut self, pin: u8, enabled: bool, host: &mut dyn Host) {
        let pin = match AnalogPin::new(pin, self.scheduler.pin_count()) {
            Ok(pin) => pin,
            Err(e) => {
                debug!("Ignoring report toggle: {}", e);
                return;
            }
        };

        let now = host.millis();
        if enabled {
            self.scheduler.enable_pin(pin, now, host);
        } else {
            self.scheduler.disable_pin(pin, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, RecordingHost, FIRST_ANALOG_PIN};
    use analog_protocol::{sysex, SamplingInterval};
    use embedded_hal::digital::PinState;

    const PINS: u8 = 6;

    fn feature() -> AnalogInputFeature {
        AnalogInputFeature::new(AnalogInputConfig {
            pin_count: PINS,
            smoothing: SmoothingConfig::default(),
        })
    }

    #[derive(Default)]
    struct Registry(Vec<Box<dyn FirmataFeature>>);

    impl FeatureRegistry for Registry {
        fn register(&mut self, feature: Box<dyn FirmataFeature>) {
            self.0.push(feature);
        }
    }

    #[test]
    fn test_attach_registers_feature() {
        let mut registry = Registry::default();
        AnalogInputFeature::attach(AnalogInputConfig::default(), &mut registry);
        assert_eq!(registry.0.len(), 1);
        assert_eq!(registry.0[0].name(), "analog-input");
        assert!(registry.0[0].report_analog_handler().is_some());
    }

    #[test]
    fn test_set_report_interval_is_silent() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        host.now = 1234;

        // 0x2003 -> 3 seconds
        assert!(feature.handle_sysex(sysex::ANALOG_REPORT_INTERVAL, &[2, 0x03, 0x40], &mut host));
        assert!(host.events().is_empty());

        let schedule = feature.schedule(host.pin(2));
        assert_eq!(schedule.interval, SamplingInterval::seconds(3));
        assert_eq!(schedule.last_report_ms, 1234);
    }

    #[test]
    fn test_read_now_reports_immediately() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        host.queue_reads(1, &[100, 200, 300, 401]);

        assert!(feature.handle_sysex(sysex::EXTENDED_ANALOG_READ, &[0, 1, 4, 5, 9], &mut host));

        let pin = host.pin(1);
        assert_eq!(host.sent(), vec![(pin, 250)]);
        assert_eq!(host.events().first(), Some(&Event::Level(9, PinState::High)));
        assert_eq!(host.read_count(), 4);
        // Scheduler untouched
        assert!(!feature.schedule(pin).reporting);
    }

    #[test]
    fn test_malformed_commands_are_consumed() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);

        assert!(feature.handle_sysex(sysex::ANALOG_REPORT_INTERVAL, &[1], &mut host));
        assert!(feature.handle_sysex(sysex::ANALOG_REPORT_INTERVAL, &[PINS, 10, 0], &mut host));
        assert!(feature.handle_sysex(sysex::EXTENDED_ANALOG_READ, &[0, 40], &mut host));
        assert!(feature.handle_sysex(sysex::EXTENDED_ANALOG_READ, &[3, 1], &mut host));
        assert!(host.events().is_empty());
        for n in 0..PINS {
            assert_eq!(feature.schedule(host.pin(n)), &PinSchedule::default());
        }
    }

    #[test]
    fn test_foreign_sysex_not_handled() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        assert!(!feature.handle_sysex(sysex::SAMPLING_INTERVAL, &[19, 0], &mut host));
    }

    #[test]
    fn test_pin_mode_analog_enables_reporting() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        host.queue_reads(0, &[77]);

        assert!(feature.handle_pin_mode(FIRST_ANALOG_PIN, PinMode::Analog, &mut host));

        let pin = host.pin(0);
        assert_eq!(
            host.events(),
            &[Event::Read(pin), Event::Sent(pin, 77), Event::DisableOutput(pin)]
        );
        assert!(feature.schedule(pin).reporting);
    }

    #[test]
    fn test_pin_mode_other_disables_reporting() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        feature.handle_pin_mode(FIRST_ANALOG_PIN + 1, PinMode::Analog, &mut host);

        assert!(!feature.handle_pin_mode(FIRST_ANALOG_PIN + 1, PinMode::Output, &mut host));
        assert!(!feature.schedule(host.pin(1)).reporting);
    }

    #[test]
    fn test_pin_mode_beyond_feature_pins_ignored() {
        let mut feature = feature();
        // Host exposes more analog pins than the feature was configured for
        let mut host = RecordingHost::new(PINS + 2);

        assert!(!feature.handle_pin_mode(FIRST_ANALOG_PIN + PINS + 1, PinMode::Analog, &mut host));
        assert!(!feature.handle_pin_mode(FIRST_ANALOG_PIN + PINS, PinMode::Output, &mut host));
        assert!(host.events().is_empty());

        assert!(feature.handle_pin_mode(FIRST_ANALOG_PIN + PINS - 1, PinMode::Analog, &mut host));
        assert_eq!(host.sent().len(), 1);
    }

    #[test]
    fn test_pin_mode_on_digital_pin_ignored() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        assert!(!feature.handle_pin_mode(3, PinMode::Analog, &mut host));
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_capability_only_for_analog_pins() {
        let feature = feature();
        let host = RecordingHost::new(PINS);
        let mut out = Vec::new();

        feature.handle_capability(2, &host, &mut out);
        assert!(out.is_empty());

        feature.handle_capability(FIRST_ANALOG_PIN, &host, &mut out);
        assert_eq!(out, vec![PinMode::Analog.as_byte(), 10]);
    }

    #[test]
    fn test_report_analog_toggle() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);

        feature.report_analog(3, true, &mut host);
        assert_eq!(host.sent().len(), 1);
        feature.report_analog(3, false, &mut host);
        assert!(!feature.schedule(host.pin(3)).reporting);

        // Out of range is ignored
        feature.report_analog(PINS, true, &mut host);
        assert_eq!(host.sent().len(), 1);
    }

    #[test]
    fn test_report_after_reset_is_silent() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        for n in 0..PINS {
            feature.report_analog(n, true, &mut host);
        }
        host.clear();

        feature.reset();
        host.now = 10_000;
        feature.report(true, &mut host);
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_report_uses_host_clock() {
        let mut feature = feature();
        let mut host = RecordingHost::new(PINS);
        host.resetting = true;
        feature.report_analog(0, true, &mut host);
        host.resetting = false;
        assert!(feature.handle_sysex(sysex::ANALOG_REPORT_INTERVAL, &[0, 100, 0], &mut host));

        host.now = 100;
        feature.report(false, &mut host);
        assert!(host.sent().is_empty());

        host.now = 101;
        feature.report(false, &mut host);
        assert_eq!(host.sent().len(), 1);
    }
}
