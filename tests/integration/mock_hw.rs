//! Mock hardware adapters for integration tests.
//!
//! Records every duty write and event so tests can assert on the full
//! history without touching real GPIO/PWM registers.

use std::collections::VecDeque;

use dusklight::app::events::AppEvent;
use dusklight::app::ports::{DutyOutput, EventSink, SensorInput, StepPacer, TimeSource};
use dusklight::error::Error;
use dusklight::window::Hour;
use embassy_time::Duration;

// ── RecordingOutput ───────────────────────────────────────────

#[derive(Default)]
pub struct RecordingOutput {
    pub writes: Vec<u16>,
}

#[allow(dead_code)]
impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<u16> {
        self.writes.last().copied()
    }
}

impl DutyOutput for RecordingOutput {
    fn apply(&mut self, level: u16) {
        self.writes.push(level);
    }
}

// ── MockSensor ────────────────────────────────────────────────

/// Returns scripted reads first, then `present` (or a fault).
#[derive(Default)]
pub struct MockSensor {
    pub present: bool,
    pub fault: bool,
    pub script: VecDeque<bool>,
    pub reads: usize,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(present: bool) -> Self {
        Self {
            present,
            ..Self::default()
        }
    }

    /// Queue `n` copies of `value` ahead of the steady-state reading.
    pub fn queue(&mut self, value: bool, n: usize) {
        self.script.extend(std::iter::repeat_n(value, n));
    }
}

impl SensorInput for MockSensor {
    fn is_present(&mut self) -> Result<bool, Error> {
        self.reads += 1;
        if self.fault {
            return Err(Error::SensorFault);
        }
        Ok(self.script.pop_front().unwrap_or(self.present))
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Answers immediately; `None` simulates a clock that misses its bound.
pub struct MockClock {
    pub hour: Option<u8>,
}

impl MockClock {
    pub fn at(hour: u8) -> Self {
        Self { hour: Some(hour) }
    }

    #[allow(dead_code)]
    pub fn unavailable() -> Self {
        Self { hour: None }
    }
}

impl TimeSource for MockClock {
    async fn current_hour(&mut self, _bound: Duration) -> Result<Hour, Error> {
        self.hour
            .and_then(Hour::new)
            .ok_or(Error::ClockUnavailable)
    }
}

// ── NoDelayPacer ──────────────────────────────────────────────

#[derive(Default)]
pub struct NoDelayPacer {
    pub pauses: usize,
}

impl StepPacer for NoDelayPacer {
    async fn pause(&mut self, _delay: Duration) {
        self.pauses += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
