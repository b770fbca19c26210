//! Per-Pin Report Scheduler
//!
//! Tracks each analog pin's report interval and the timestamp its current
//! interval is measured from. Timestamps are wrapping milliseconds, so every
//! comparison is made on `now - then`.

use crate::host::Host;
use crate::sampler::Sampler;
use analog_protocol::{AnalogPin, SamplingInterval};
use tracing::{debug, info, trace};

/// Scheduling state of one analog pin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinSchedule {
    /// Configured report interval
    pub interval: SamplingInterval,
    /// Baseline the next interval is measured from (wrapping ms)
    pub last_report_ms: u32,
    /// Whether reporting is switched on for the pin
    pub reporting: bool,
}

impl PinSchedule {
    /// Move the baseline forward by exactly one interval
    ///
    /// A cadence report can fire before the interval has elapsed; the
    /// baseline is then held at `now` so it never sits in the future, where
    /// the wrapping elapsed time would make the pin look due at once.
    fn advance(&mut self, interval_ms: u32, now: u32) {
        let next = self.last_report_ms.wrapping_add(interval_ms);
        self.last_report_ms = if (now.wrapping_sub(next) as i32) < 0 {
            now
        } else {
            next
        };
    }
}

/// Decides which analog pins are due and reports them
pub struct PinScheduler {
    /// One entry per analog pin, indexed by analog pin number
    pins: Box<[PinSchedule]>,
    /// Sampler for scheduled reports
    sampler: Sampler,
}

impl PinScheduler {
    /// Create a scheduler for `pin_count` analog pins, none reporting
    pub fn new(pin_count: u8, sampler: Sampler) -> Self {
        info!("Analog scheduler created for {} pins", pin_count);
        Self {
            pins: vec![PinSchedule::default(); usize::from(pin_count)].into_boxed_slice(),
            sampler,
        }
    }

    /// Number of analog pins
    pub fn pin_count(&self) -> u8 {
        self.pins.len() as u8
    }

    /// Current state of a pin
    pub fn schedule(&self, pin: AnalogPin) -> &PinSchedule {
        &self.pins[pin.index()]
    }

    /// Sampler used for reports
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Turn reporting on and send the pin's current value right away
    ///
    /// The immediate report is suppressed while the host resets, since every
    /// analog pin is re-enabled then and unconnected pins only read noise.
    pub fn enable_pin<H>(&mut self, pin: AnalogPin, now: u32, host: &mut H)
    where
        H: Host + ?Sized,
    {
        let schedule = &mut self.pins[pin.index()];
        schedule.interval = SamplingInterval::EVERY_TICK;
        schedule.last_report_ms = now;
        schedule.reporting = true;

        if host.is_resetting() {
            debug!("Reporting enabled for {} during reset", pin);
            return;
        }

        let value = host.read_raw(pin);
        host.send_analog_value(pin, value);
        debug!("Reporting enabled for {}, initial value {}", pin, value);
    }

    /// Turn reporting off
    pub fn disable_pin(&mut self, pin: AnalogPin, now: u32) {
        let schedule = &mut self.pins[pin.index()];
        schedule.interval = SamplingInterval::DEFAULT_CADENCE;
        schedule.last_report_ms = now;
        schedule.reporting = false;
        debug!("Reporting disabled for {}", pin);
    }

    /// Change a pin's report interval
    ///
    /// Never reports synchronously: the pin next becomes due one full new
    /// interval after `now`.
    pub fn configure_interval(&mut self, pin: AnalogPin, interval: SamplingInterval, now: u32) {
        let schedule = &mut self.pins[pin.index()];
        schedule.interval = interval;
        schedule.last_report_ms = now;
        debug!("Report interval for {} set to {}ms", pin, interval.as_millis());
    }

    /// Report every due pin, returning how many were reported
    ///
    /// A pin is due when it is reporting, the host has it in analog mode, and
    /// either this is a global-cadence tick and its interval is no longer
    /// than the global sampling interval, or more than its interval has
    /// passed since its baseline.
    pub fn tick<H>(&mut self, now: u32, global_tick: bool, host: &mut H) -> usize
    where
        H: Host + ?Sized,
    {
        let cadence_ms = host.sampling_interval_ms();
        let mut reported = 0;

        for pin in AnalogPin::all(self.pin_count()) {
            let schedule = self.pins[pin.index()];
            if !schedule.reporting || !host.is_analog_read_mode(pin) {
                continue;
            }

            let interval_ms = schedule.interval.as_millis();
            let elapsed = now.wrapping_sub(schedule.last_report_ms);
            let on_cadence = global_tick && interval_ms <= cadence_ms;
            let interval_elapsed = !schedule.interval.is_default_cadence() && elapsed > interval_ms;
            if !(on_cadence || interval_elapsed) {
                continue;
            }

            let value = self.sampler.smoothed_read(host, pin);
            host.send_analog_value(pin, value);
            self.pins[pin.index()].advance(interval_ms, now);
            trace!("{} reported {} after {}ms", pin, value, elapsed);
            reported += 1;
        }

        reported
    }

    /// Stop reporting on every pin and clear all intervals and baselines
    pub fn reset(&mut self) {
        self.pins.fill(PinSchedule::default());
        debug!("Analog scheduler reset");
    }
}
