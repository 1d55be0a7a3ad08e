//! Error taxonomy for the light controller.
//!
//! Every variant is `Copy` so it can travel through the control loop and
//! event sink without allocation.  Only [`Error::ConfigInvalid`] is fatal,
//! and only at startup; the control loop recovers locally from the rest.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The time source could not produce an hour within its bound.
    /// Recovered by falling back to the last known hour.
    ClockUnavailable,
    /// The occupancy sensor could not be read.
    /// Recovered by treating the area as unoccupied.
    SensorFault,
    /// A configuration value is out of range or inconsistent.
    /// The `&'static str` names the field and the rule it broke.
    ConfigInvalid(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockUnavailable => write!(f, "clock unavailable"),
            Self::SensorFault => write!(f, "sensor fault"),
            Self::ConfigInvalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
