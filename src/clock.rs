//! Hour handoff between the time-sync thread and the control task.
//!
//! ```text
//!  hour-sync thread                      control task
//!  ────────────────                      ────────────
//!  SNTP / localtime ──publish()──▶ [AtomicU8 + Signal] ──wait(bound)──▶ tick
//! ```
//!
//! Single writer, single reader.  The atomic always holds the latest
//! hour (or "unknown"); the signal only wakes a reader that is waiting
//! for the first value.  A reader never waits longer than its bound.

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, with_timeout};

use crate::app::ports::TimeSource;
use crate::error::Error;
use crate::window::Hour;

const UNKNOWN: u8 = u8::MAX;

/// Process-wide handoff used by the firmware binary.
pub static HOUR_HANDOFF: HourHandoff = HourHandoff::new();

pub struct HourHandoff {
    latest: AtomicU8,
    published: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for HourHandoff {
    fn default() -> Self {
        Self::new()
    }
}

impl HourHandoff {
    pub const fn new() -> Self {
        Self {
            latest: AtomicU8::new(UNKNOWN),
            published: Signal::new(),
        }
    }

    /// Store `hour` and wake a waiting reader.  Returns `true` if the
    /// value changed.
    pub fn publish(&self, hour: Hour) -> bool {
        let previous = self.latest.swap(hour.get(), Ordering::AcqRel);
        self.published.signal(());
        previous != hour.get()
    }

    /// Mark the hour unknown (the clock became unreadable).
    pub fn invalidate(&self) {
        self.latest.store(UNKNOWN, Ordering::Release);
    }

    /// Latest published hour, without waiting.
    pub fn latest(&self) -> Option<Hour> {
        Hour::new(self.latest.load(Ordering::Acquire))
    }

    /// Latest hour, waiting at most `bound` for one to be published.
    pub async fn wait(&self, bound: Duration) -> Result<Hour, Error> {
        if let Some(hour) = self.latest() {
            return Ok(hour);
        }
        let arrival = async {
            loop {
                self.published.wait().await;
                if let Some(hour) = self.latest() {
                    return hour;
                }
            }
        };
        with_timeout(bound, arrival)
            .await
            .map_err(|_| Error::ClockUnavailable)
    }
}

/// [`TimeSource`] that reads from an [`HourHandoff`].
pub struct HandoffTimeSource<'a> {
    handoff: &'a HourHandoff,
}

impl<'a> HandoffTimeSource<'a> {
    pub fn new(handoff: &'a HourHandoff) -> Self {
        Self { handoff }
    }
}

impl TimeSource for HandoffTimeSource<'_> {
    async fn current_hour(&mut self, bound: Duration) -> Result<Hour, Error> {
        self.handoff.wait(bound).await
    }
}
