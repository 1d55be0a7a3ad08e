//! Daytime suppression window.
//!
//! The light must stay dark between `start` and `end` (both inclusive)
//! regardless of motion.  Outside that range the controller is
//! motion-responsive.
//!
//! ```text
//!   0        start            end          23
//!   ├─ Active ─┼─── Suppressed ──┼─ Active ──┤
//! ```
//!
//! Classification is a pure function of the hour; nothing here touches
//! the clock.

use core::fmt;

use crate::error::{Error, Result};

// ───────────────────────────────────────────────────────────────
// Hour
// ───────────────────────────────────────────────────────────────

/// Local hour of day, `0..=23`.
///
/// Only constructible through [`Hour::new`], so every `Hour` in the
/// system is valid and classification never has to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

impl Hour {
    pub const MIDNIGHT: Self = Self(0);
    pub const LAST: Self = Self(23);

    pub const fn new(value: u8) -> Option<Self> {
        if value <= 23 { Some(Self(value)) } else { None }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}h", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Window
// ───────────────────────────────────────────────────────────────

/// Result of classifying an hour against the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Light must stay off; motion is ignored.
    Suppressed,
    /// Motion-responsive.
    Active,
}

/// Inclusive `[start, end]` range of suppressed hours.  `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressWindow {
    start: Hour,
    end: Hour,
}

impl SuppressWindow {
    pub fn new(start: Hour, end: Hour) -> Result<Self> {
        if start > end {
            return Err(Error::ConfigInvalid(
                "suppress_start_hour must be <= suppress_end_hour",
            ));
        }
        Ok(Self { start, end })
    }

    /// Build from raw configuration values, rejecting out-of-range hours.
    pub fn from_hours(start: u8, end: u8) -> Result<Self> {
        let start = Hour::new(start)
            .ok_or(Error::ConfigInvalid("suppress_start_hour must be 0–23"))?;
        let end =
            Hour::new(end).ok_or(Error::ConfigInvalid("suppress_end_hour must be 0–23"))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> Hour {
        self.start
    }

    pub fn end(&self) -> Hour {
        self.end
    }

    pub fn classify(&self, hour: Hour) -> WindowState {
        if self.start <= hour && hour <= self.end {
            WindowState::Suppressed
        } else {
            WindowState::Active
        }
    }
}

/// Free-function form of [`SuppressWindow::classify`].
pub fn classify(hour: Hour, window: &SuppressWindow) -> WindowState {
    window.classify(hour)
}
