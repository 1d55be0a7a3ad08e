//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (PWM output, motion sensor, clock, step timer, event
//! sinks, storage) implement these traits.  The
//! [`ControlLoop`](super::control_loop::ControlLoop) owns them via
//! generics, so the domain core never touches hardware directly.

use core::future::Future;

use embassy_time::Duration;

use crate::config::LightConfig;
use crate::error::Error;
use crate::window::Hour;

// ───────────────────────────────────────────────────────────────
// Duty output (driven adapter: domain → PWM)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the dimmable light.
pub trait DutyOutput {
    /// Apply a duty level in `[0, max_duty]`.  Best-effort: hardware write
    /// failures are the adapter's to log, not the ramp's to handle.
    fn apply(&mut self, level: u16);
}

// ───────────────────────────────────────────────────────────────
// Sensor input (driven adapter: PIR line → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the occupancy signal.  Non-blocking.
pub trait SensorInput {
    /// `Ok(true)` while motion is present.  `Err(Error::SensorFault)` if the
    /// line could not be read.
    fn is_present(&mut self) -> Result<bool, Error>;
}

// ───────────────────────────────────────────────────────────────
// Time source (driven adapter: synchronised clock → domain)
// ───────────────────────────────────────────────────────────────

/// Supplies the already-localised hour of day.
pub trait TimeSource {
    /// Wait at most `bound` for the current hour.  Returns
    /// `Err(Error::ClockUnavailable)` if none arrives in time.
    fn current_hour(&mut self, bound: Duration) -> impl Future<Output = Result<Hour, Error>>;
}

// ───────────────────────────────────────────────────────────────
// Step pacer (driven adapter: domain → timer)
// ───────────────────────────────────────────────────────────────

/// Suspension point between ramp steps.
pub trait StepPacer {
    fn pause(&mut self, delay: Duration) -> impl Future<Output = ()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`LightConfig`].
///
/// Implementations MUST validate before persisting and after loading.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// never silently clamped.
pub trait ConfigPort {
    /// Load configuration.  Returns [`LightConfig::default()`] if nothing is
    /// stored yet.
    fn load(&self) -> Result<LightConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &LightConfig) -> Result<(), ConfigError>;

    /// Whether a configuration blob has been stored.
    fn has_stored(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<Error> for ConfigError {
    fn from(e: Error) -> Self {
        match e {
            Error::ConfigInvalid(msg) => Self::ValidationFailed(msg),
            Error::ClockUnavailable | Error::SensorFault => Self::IoError,
        }
    }
}
