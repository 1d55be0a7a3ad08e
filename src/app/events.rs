//! Outbound application events.
//!
//! The [`ControlLoop`](super::control_loop::ControlLoop) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use crate::fsm::StateId;
use crate::window::Hour;

/// Which way a ramp walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampDirection {
    Up,
    Down,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The control loop has started (initial state and the hour it was
    /// chosen from, if one was available).
    Started { state: StateId, hour: Option<Hour> },

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A fade ramp stopped, either at its endpoint or interrupted.
    RampFinished {
        direction: RampDirection,
        level: u16,
        interrupted: bool,
    },

    /// The time source missed its bound; the loop is running on `fallback`.
    ClockUnavailable { fallback: Option<Hour> },

    /// The motion sensor could not be read; treated as absent.
    SensorFault,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    pub hour: Option<Hour>,
    pub level: u16,
    pub light_on: bool,
    pub occupied: bool,
    pub ticks: u64,
}
