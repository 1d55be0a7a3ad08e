//! System configuration parameters
//!
//! All tunable parameters for the light controller.  Loaded once at boot
//! from NVS (or defaults) and immutable afterwards.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;
use crate::window::SuppressWindow;

/// Default POSIX TZ rule: US Central with DST.
pub const DEFAULT_TIMEZONE: &str = "CST6CDT,M3.2.0/2,M11.1.0";

/// Upper bound on ramps executed within a single control tick: one
/// interrupted ramp plus the reversal that follows it.
pub const MAX_RAMPS_PER_TICK: u64 = 2;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightConfig {
    // --- Timing ---
    /// Control tick interval (milliseconds)
    pub tick_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,

    // --- Suppressed window (inclusive local hours) ---
    pub suppress_start_hour: u8,
    pub suppress_end_hour: u8,

    // --- Ramp ---
    /// Duty ceiling; 1023 for the 10-bit LEDC timer
    pub max_duty: u16,
    /// Duty increment per ramp step
    pub ramp_step: u16,
    /// Pause between ramp steps (milliseconds)
    pub step_delay_ms: u16,
    /// Reverse a ramp mid-way when occupancy changes
    pub interruptible_ramps: bool,

    // --- Occupancy ---
    /// Seconds the area stays "occupied" after the last detected motion
    pub hold_secs: u32,

    // --- Clock ---
    /// Bounded wait for the first hour at startup (milliseconds)
    pub clock_wait_ms: u32,
    /// Bounded wait for the hour on every tick (milliseconds)
    pub tick_clock_wait_ms: u32,
    /// POSIX TZ string handed to the C library
    pub timezone: heapless::String<48>,
    /// SNTP initial sync attempts
    pub sync_retry_count: u8,
    /// Wait per SNTP attempt (milliseconds)
    pub sync_wait_ms: u32,
    /// Period at which the time thread republishes the hour (seconds)
    pub hour_poll_secs: u32,

    // --- Housekeeping ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// Blink the current hour on the light at boot
    pub announce_hour_on_boot: bool,

    // --- Network (station credentials for SNTP) ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,       // 1 Hz
            telemetry_interval_secs: 300, // every 5 min

            suppress_start_hour: 8,
            suppress_end_hour: 15,

            max_duty: pins::LIGHT_MAX_DUTY,
            ramp_step: 1,
            step_delay_ms: 2,
            interruptible_ramps: true,

            hold_secs: 60,

            clock_wait_ms: 30_000,
            tick_clock_wait_ms: 100,
            timezone: bounded(DEFAULT_TIMEZONE),
            sync_retry_count: 15,
            sync_wait_ms: 2000,
            hour_poll_secs: 30,

            watchdog_timeout_ms: 10_000,
            announce_hour_on_boot: false,

            wifi_ssid: bounded(option_env!("DUSKLIGHT_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("DUSKLIGHT_WIFI_PASSWORD").unwrap_or("")),
        }
    }
}

impl LightConfig {
    /// Range- and consistency-check every field.
    ///
    /// Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        self.window()?;
        if self.max_duty == 0 {
            return Err(Error::ConfigInvalid("max_duty must be >= 1"));
        }
        if self.ramp_step == 0 || self.ramp_step > self.max_duty {
            return Err(Error::ConfigInvalid("ramp_step must be 1..=max_duty"));
        }
        if !(100..=300_000).contains(&self.tick_interval_ms) {
            return Err(Error::ConfigInvalid("tick_interval_ms must be 100–300000"));
        }
        if self.step_delay_ms > 1000 {
            return Err(Error::ConfigInvalid("step_delay_ms must be <= 1000"));
        }
        if self.tick_clock_wait_ms >= self.tick_interval_ms {
            return Err(Error::ConfigInvalid(
                "tick_clock_wait_ms must be < tick_interval_ms",
            ));
        }
        if self.worst_case_tick_ms() >= u64::from(self.watchdog_timeout_ms) {
            return Err(Error::ConfigInvalid(
                "ramp duration exceeds watchdog_timeout_ms",
            ));
        }
        if self.timezone.is_empty() {
            return Err(Error::ConfigInvalid("timezone must not be empty"));
        }
        if self.sync_retry_count == 0 {
            return Err(Error::ConfigInvalid("sync_retry_count must be >= 1"));
        }
        if self.hour_poll_secs == 0 {
            return Err(Error::ConfigInvalid("hour_poll_secs must be >= 1"));
        }
        Ok(())
    }

    pub fn window(&self) -> Result<SuppressWindow> {
        SuppressWindow::from_hours(self.suppress_start_hour, self.suppress_end_hour)
    }

    /// Number of ramp steps between dark and full.
    pub fn steps_per_ramp(&self) -> u64 {
        u64::from(self.max_duty).div_ceil(u64::from(self.ramp_step.max(1)))
    }

    /// Longest time one control tick can spend blocked: the clock wait plus
    /// the maximum number of full ramps.
    pub fn worst_case_tick_ms(&self) -> u64 {
        let ramp_ms = self.steps_per_ramp() * u64::from(self.step_delay_ms);
        u64::from(self.tick_clock_wait_ms) + ramp_ms * MAX_RAMPS_PER_TICK
    }

    /// Occupancy hold expressed in control ticks (rounded up).
    pub fn hold_ticks(&self) -> u32 {
        let hold_ms = u64::from(self.hold_secs) * 1000;
        let ticks = hold_ms.div_ceil(u64::from(self.tick_interval_ms.max(1)));
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Ticks between telemetry events (at least one).
    pub fn telemetry_every_ticks(&self) -> u64 {
        let every_ms = u64::from(self.telemetry_interval_secs) * 1000;
        (every_ms / u64::from(self.tick_interval_ms.max(1))).max(1)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.tick_interval_ms))
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.step_delay_ms))
    }

    pub fn clock_wait(&self) -> Duration {
        Duration::from_millis(u64::from(self.clock_wait_ms))
    }

    pub fn tick_clock_wait(&self) -> Duration {
        Duration::from_millis(u64::from(self.tick_clock_wait_ms))
    }
}

/// Copy `s` into a fixed-capacity string, truncating at capacity.
fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
