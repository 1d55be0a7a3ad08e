//! Wall-clock adapter.
//!
//! Turns the system clock (set by SNTP) into a local hour of day and
//! publishes it to the control task through an [`HourHandoff`].
//!
//! - **`target_os = "espidf"`** — `gettimeofday()` + `localtime_r()` with
//!   the POSIX `TZ` rule applied through `tzset()`.
//! - **`not(target_os = "espidf")`** — `std::time::SystemTime`, read as
//!   UTC, for host-side simulation.

use std::time::Duration;

use log::{info, warn};

use crate::clock::HourHandoff;
use crate::window::Hour;

/// Years before this mean the RTC still holds its power-on value.
#[cfg(target_os = "espidf")]
const FIRST_SYNCED_YEAR: i32 = 2016;

/// Install `tz` as the process time zone.
#[cfg(target_os = "espidf")]
pub fn set_timezone(tz: &str) {
    // SAFETY: called from the main task before the hour-sync thread starts,
    // so no other thread reads the environment concurrently.
    unsafe {
        std::env::set_var("TZ", tz);
        esp_idf_svc::sys::tzset();
    }
    info!("TIME: timezone set to {}", tz);
}

/// Host simulation reads UTC; the zone rule is only logged.
#[cfg(not(target_os = "espidf"))]
pub fn set_timezone(tz: &str) {
    info!("TIME(sim): timezone {} ignored, using UTC", tz);
}

/// Local hour of day, or `None` while the clock has not been synced.
#[cfg(target_os = "espidf")]
pub fn read_local_hour() -> Option<Hour> {
    use core::ptr;
    let mut tv = esp_idf_svc::sys::timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
        return None;
    }
    let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
    let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
    if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
        return None;
    }
    if tm.tm_year + 1900 < FIRST_SYNCED_YEAR {
        return None;
    }
    u8::try_from(tm.tm_hour).ok().and_then(Hour::new)
}

#[cfg(not(target_os = "espidf"))]
pub fn read_local_hour() -> Option<Hour> {
    // 2016-01-01T00:00:00Z
    const FIRST_SYNCED_EPOCH: u64 = 1_451_606_400;
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_secs();
    if secs < FIRST_SYNCED_EPOCH {
        return None;
    }
    Hour::new(((secs / 3600) % 24) as u8)
}

// ───────────────────────────────────────────────────────────────
// HourPublisher
// ───────────────────────────────────────────────────────────────

/// Polls a clock reader and keeps an [`HourHandoff`] current.
///
/// Runs on its own thread; the control task only ever sees the handoff.
pub struct HourPublisher<'a, R> {
    handoff: &'a HourHandoff,
    read: R,
    retry_count: u8,
    sync_wait: Duration,
    poll: Duration,
}

impl<'a, R> HourPublisher<'a, R>
where
    R: FnMut() -> Option<Hour>,
{
    pub fn new(
        handoff: &'a HourHandoff,
        read: R,
        retry_count: u8,
        sync_wait: Duration,
        poll: Duration,
    ) -> Self {
        Self {
            handoff,
            read,
            retry_count,
            sync_wait,
            poll,
        }
    }

    /// Wait for the first synced reading, at most `retry_count` tries
    /// `sync_wait` apart.  Returns `true` once an hour was published.
    pub fn initial_sync(&mut self) -> bool {
        for attempt in 1..=self.retry_count {
            if let Some(hour) = (self.read)() {
                self.handoff.publish(hour);
                info!("TIME: clock synced, local hour {}", hour);
                return true;
            }
            info!(
                "TIME: waiting for system time to be set... ({}/{})",
                attempt, self.retry_count
            );
            if attempt < self.retry_count {
                std::thread::sleep(self.sync_wait);
            }
        }
        warn!("TIME: clock not synced after {} tries", self.retry_count);
        false
    }

    /// Read once and update the handoff.  Returns the hour read, if any.
    pub fn refresh(&mut self) -> Option<Hour> {
        match (self.read)() {
            Some(hour) => {
                if self.handoff.publish(hour) {
                    info!("TIME: hour is now {}", hour);
                }
                Some(hour)
            }
            None => {
                if self.handoff.latest().is_some() {
                    warn!("TIME: clock became unreadable");
                }
                self.handoff.invalidate();
                None
            }
        }
    }

    /// Initial sync followed by a refresh every `poll`.  Never returns.
    pub fn run(mut self) -> ! {
        self.initial_sync();
        loop {
            std::thread::sleep(self.poll);
            self.refresh();
        }
    }
}
