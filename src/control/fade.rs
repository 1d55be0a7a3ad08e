//! Brightness ramp controller.
//!
//! Owns the current duty level and the "light is on" flag.  Ramps walk
//! the level in fixed steps towards full or dark, applying every
//! intermediate value and awaiting the step pacer in between.
//!
//! ```text
//!  level
//!  max ┤            ┌──────┐
//!      │         ╱            ╲
//!      │      ╱                  ╲
//!    0 ┼───╱                        ╲────
//!          fade_up        fade_down
//! ```
//!
//! Ramps resume from whatever level they find; an interrupted ramp leaves
//! the level where it stopped and the flag untouched.

use embassy_time::{Duration, Timer};

use crate::app::ports::{DutyOutput, StepPacer};
use crate::config::LightConfig;
use crate::fsm::context::LampStatus;

/// How a ramp call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampOutcome {
    /// Reached the endpoint.
    Completed,
    /// Already at the endpoint; nothing was applied.
    Unchanged,
    /// `keep_going` returned false before the endpoint.
    Interrupted,
}

pub struct FadeController {
    level: u16,
    light_on: bool,
    max_duty: u16,
    step: u16,
    step_delay: Duration,
}

impl FadeController {
    pub fn new(max_duty: u16, step: u16, step_delay: Duration) -> Self {
        Self {
            level: 0,
            light_on: false,
            max_duty,
            step: step.max(1),
            step_delay,
        }
    }

    pub fn from_config(config: &LightConfig) -> Self {
        Self::new(config.max_duty, config.ramp_step, config.step_delay())
    }

    // ── Ramps ─────────────────────────────────────────────────

    /// Walk up to `max_duty`.  No-op when already full.
    ///
    /// `keep_going` is polled before each step; returning `false` stops
    /// the ramp at the current level.
    pub async fn fade_up(
        &mut self,
        out: &mut impl DutyOutput,
        pacer: &mut impl StepPacer,
        mut keep_going: impl FnMut() -> bool,
    ) -> RampOutcome {
        if self.is_full() {
            return RampOutcome::Unchanged;
        }
        while self.level < self.max_duty {
            if !keep_going() {
                return RampOutcome::Interrupted;
            }
            self.level = self.level.saturating_add(self.step).min(self.max_duty);
            out.apply(self.level);
            pacer.pause(self.step_delay).await;
        }
        self.light_on = true;
        RampOutcome::Completed
    }

    /// Walk down to 0.  No-op when already dark.
    ///
    /// On completion the output is forced to 0 once more, so a
    /// miscounted step can never leave the light glowing.
    pub async fn fade_down(
        &mut self,
        out: &mut impl DutyOutput,
        pacer: &mut impl StepPacer,
        mut keep_going: impl FnMut() -> bool,
    ) -> RampOutcome {
        if self.is_dark() {
            return RampOutcome::Unchanged;
        }
        while self.level > 0 {
            if !keep_going() {
                return RampOutcome::Interrupted;
            }
            self.level = self.level.saturating_sub(self.step);
            out.apply(self.level);
            pacer.pause(self.step_delay).await;
        }
        self.light_on = false;
        out.apply(0);
        RampOutcome::Completed
    }

    /// Blink the light `blinks` times at full duty, then restore the
    /// current level.  Level and flag are not modified.
    pub async fn announce(
        &self,
        out: &mut impl DutyOutput,
        pacer: &mut impl StepPacer,
        blinks: u8,
        half_period: Duration,
    ) {
        for _ in 0..blinks {
            out.apply(self.max_duty);
            pacer.pause(half_period).await;
            out.apply(0);
            pacer.pause(half_period).await;
        }
        out.apply(self.level);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn is_on(&self) -> bool {
        self.light_on
    }

    pub fn max_duty(&self) -> u16 {
        self.max_duty
    }

    /// Nothing lit and no completed fade-up outstanding.
    pub fn is_dark(&self) -> bool {
        self.level == 0 && !self.light_on
    }

    /// At the ceiling with the fade-up completed.
    pub fn is_full(&self) -> bool {
        self.light_on && self.level == self.max_duty
    }

    pub fn status(&self) -> LampStatus {
        LampStatus {
            level: self.level,
            light_on: self.light_on,
            dark: self.is_dark(),
            full: self.is_full(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Timer-backed pacer
// ───────────────────────────────────────────────────────────────

/// [`StepPacer`] backed by the embassy-time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimerPacer;

impl StepPacer for TimerPacer {
    async fn pause(&mut self, delay: Duration) {
        Timer::after(delay).await;
    }
}
