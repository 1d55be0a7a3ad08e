//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{AppEvent, RampDirection};
use crate::app::ports::EventSink;
use crate::window::Hour;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={:?} | hour={} | level={} on={} | occupied={} | ticks={}",
                    t.state,
                    fmt_hour(t.hour),
                    t.level,
                    t.light_on,
                    t.occupied,
                    t.ticks,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::RampFinished {
                direction,
                level,
                interrupted,
            } => {
                let dir = match direction {
                    RampDirection::Up => "up",
                    RampDirection::Down => "down",
                };
                if *interrupted {
                    info!("RAMP | {} interrupted at {}", dir, level);
                } else {
                    info!("RAMP | {} done at {}", dir, level);
                }
            }
            AppEvent::ClockUnavailable { fallback } => {
                warn!("CLOCK | unavailable, running on {}", fmt_hour(*fallback));
            }
            AppEvent::SensorFault => {
                warn!("SENSOR | read failed, treated as absent");
            }
            AppEvent::Started { state, hour } => {
                info!("START | initial_state={:?} hour={}", state, fmt_hour(*hour));
            }
        }
    }
}

fn fmt_hour(hour: Option<Hour>) -> heapless::String<8> {
    use core::fmt::Write;
    let mut s = heapless::String::new();
    let _ = match hour {
        Some(h) => write!(s, "{}", h),
        None => write!(s, "unknown"),
    };
    s
}
