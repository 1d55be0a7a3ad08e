//! Runtime hooks that the embassy crates link against on ESP-IDF.
//!
//! - `critical-section` 1.x: a re-entrant lock over a std `Mutex`, used by
//!   the `CriticalSectionRawMutex` behind [`HourHandoff`](crate::clock::HourHandoff).
//! - `embassy-time` driver: `esp_timer_get_time()` as the 1 MHz tick, and
//!   one `time-wake` thread that sleeps until the earliest queued deadline.
//!
//! The time driver is provided here rather than through `esp-idf-svc`'s
//! `embassy-time-driver` feature: that feature pins
//! `embassy-time-queue-utils` 0.1, which cannot coexist with the 0.3 line
//! that `embassy-time` 0.5 links.
//!
//! [`start`] must run before the first timer is awaited.

use core::cell::{Cell, RefCell};
use core::task::Waker;
use core::time::Duration;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use embassy_time_driver::Driver;
use embassy_time_queue_utils::Queue;

use super::task_pin::{Core, spawn_on_core};

// ───────────────────────────────────────────────────────────────
// critical-section
// ───────────────────────────────────────────────────────────────

static SECTION_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static SECTION_DEPTH: Cell<u8> = const { Cell::new(0) };
    static SECTION_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

struct ThreadSection;

critical_section::set_impl!(ThreadSection);

// SAFETY: the outermost acquire on a thread takes `SECTION_LOCK` and the
// matching outermost release drops it, so at most one thread is ever
// inside a critical section.
unsafe impl critical_section::Impl for ThreadSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        SECTION_DEPTH.with(|depth| {
            if depth.get() == 0 {
                let guard = SECTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
                SECTION_GUARD.with(|slot| *slot.borrow_mut() = Some(guard));
            }
            depth.set(depth.get().saturating_add(1));
        });
    }

    unsafe fn release(_restore: critical_section::RawRestoreState) {
        SECTION_DEPTH.with(|depth| {
            let d = depth.get();
            if d == 0 {
                return;
            }
            depth.set(d - 1);
            if d == 1 {
                SECTION_GUARD.with(|slot| *slot.borrow_mut() = None);
            }
        });
    }
}

// ───────────────────────────────────────────────────────────────
// embassy-time driver
// ───────────────────────────────────────────────────────────────

struct EspTimeDriver {
    queue: Mutex<Queue>,
    changed: Condvar,
}

embassy_time_driver::time_driver_impl!(static DRIVER: EspTimeDriver = EspTimeDriver {
    queue: Mutex::new(Queue::new()),
    changed: Condvar::new(),
});

impl Driver for EspTimeDriver {
    fn now(&self) -> u64 {
        // SAFETY: esp_timer is started by ESP-IDF before `app_main`.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        u64::try_from(us).unwrap_or(0)
    }

    fn schedule_wake(&self, at: u64, waker: &Waker) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.schedule_wake(at, waker) {
            self.changed.notify_one();
        }
    }
}

static STARTED: AtomicBool = AtomicBool::new(false);

/// Spawn the `time-wake` thread.  Later calls are no-ops.
pub fn start() -> io::Result<()> {
    if STARTED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }
    spawn_on_core(Core::App, 6, 3, "time-wake\0", || {
        wake_loop();
    })?;
    Ok(())
}

fn wake_loop() -> ! {
    let mut queue = DRIVER.queue.lock().unwrap_or_else(PoisonError::into_inner);
    loop {
        let now = DRIVER.now();
        let next = queue.next_expiration(now);
        queue = if next == u64::MAX {
            DRIVER
                .changed
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner)
        } else {
            let sleep = Duration::from_micros(next.saturating_sub(now));
            DRIVER
                .changed
                .wait_timeout(queue, sleep)
                .unwrap_or_else(PoisonError::into_inner)
                .0
        };
    }
}
