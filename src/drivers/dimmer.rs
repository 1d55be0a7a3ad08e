//! Dimmable light driver (LEDC PWM channel behind a MOSFET).
//!
//! Generic over any `embedded_hal::pwm::SetDutyCycle`, so the same code
//! drives an `esp_idf_svc::hal::ledc::LedcDriver` on target and a fake pin in
//! host tests.  Levels are expressed on the controller's `[0, max_duty]`
//! scale and converted to the channel's native resolution here.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::DutyOutput;

pub struct Dimmer<P> {
    pin: P,
    max_duty: u16,
    level: u16,
}

impl<P: SetDutyCycle> Dimmer<P> {
    /// Wrap `pin` and force it dark.  `max_duty` must be non-zero.
    pub fn new(pin: P, max_duty: u16) -> Self {
        let mut dimmer = Self {
            pin,
            max_duty: max_duty.max(1),
            level: 0,
        };
        dimmer.apply(0);
        dimmer
    }

    /// Last level written.
    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn max_duty(&self) -> u16 {
        self.max_duty
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: SetDutyCycle> DutyOutput for Dimmer<P> {
    fn apply(&mut self, level: u16) {
        let level = level.min(self.max_duty);
        if let Err(e) = self.pin.set_duty_cycle_fraction(level, self.max_duty) {
            warn!("Dimmer: duty write failed ({:?}), level {} not applied", e, level);
            return;
        }
        self.level = level;
    }
}
