//! PIR motion sensor driver.
//!
//! The sensor drives its output line high while it sees motion.  Any
//! `embedded_hal::digital::InputPin` works; on target this is a
//! `PinDriver<_, Input>` on [`MOTION_SENSOR_GPIO`](crate::pins::MOTION_SENSOR_GPIO).

use embedded_hal::digital::InputPin;
use log::debug;

use crate::app::ports::SensorInput;
use crate::error::Error;

pub struct MotionSensor<P> {
    pin: P,
    last: Option<bool>,
}

impl<P: InputPin> MotionSensor<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, last: None }
    }

    /// Last successfully read value.
    pub fn last(&self) -> Option<bool> {
        self.last
    }
}

impl<P: InputPin> SensorInput for MotionSensor<P> {
    fn is_present(&mut self) -> Result<bool, Error> {
        let present = self.pin.is_high().map_err(|_| Error::SensorFault)?;
        if self.last != Some(present) {
            debug!("PIR: {}", if present { "motion" } else { "clear" });
        }
        self.last = Some(present);
        Ok(present)
    }
}
