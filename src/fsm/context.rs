//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  The control loop fills in the per-tick inputs and the lamp
//! snapshot, the handlers write back a ramp command, and the loop
//! executes it.  Think of it as the "blackboard" in a blackboard
//! architecture.

use crate::config::LightConfig;
use crate::window::{Hour, WindowState};

// ---------------------------------------------------------------------------
// Tick inputs (read-only to state handlers; written by the control loop)
// ---------------------------------------------------------------------------

/// What the control loop observed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInputs {
    /// Hour used for classification; `None` until the clock has ever
    /// produced one.
    pub hour: Option<Hour>,
    pub window: WindowState,
    /// Debounced occupancy.  Always `false` while suppressed.
    pub occupied: bool,
}

impl Default for TickInputs {
    fn default() -> Self {
        Self {
            hour: None,
            window: WindowState::Active,
            occupied: false,
        }
    }
}

/// Snapshot of the fade controller, refreshed before every FSM step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampStatus {
    pub level: u16,
    pub light_on: bool,
    /// Level 0 and no completed fade-up outstanding.
    pub dark: bool,
    /// At the ceiling with the fade-up completed.
    pub full: bool,
}

impl Default for LampStatus {
    fn default() -> Self {
        Self {
            level: 0,
            light_on: false,
            dark: true,
            full: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Ramp command (written by state handlers; executed by the control loop)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampCommand {
    /// Leave the output where it is.
    #[default]
    Hold,
    /// Fade towards full, stopping early if occupancy is lost.
    Up,
    /// Fade towards dark.  `interruptible` lets returning presence stop it.
    Down { interruptible: bool },
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Duration of one tick in seconds.
    pub tick_period_secs: f32,

    // -- Inputs --
    pub inputs: TickInputs,
    pub lamp: LampStatus,

    // -- Output --
    /// Ramp the control loop should run after this step.
    pub command: RampCommand,

    // -- Configuration --
    pub config: LightConfig,
}

impl FsmContext {
    pub fn new(config: LightConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_secs: config.tick_interval_ms as f32 / 1000.0,
            inputs: TickInputs::default(),
            lamp: LampStatus::default(),
            command: RampCommand::Hold,
            config,
        }
    }

    /// Seconds elapsed since the current state was entered.
    pub fn secs_in_state(&self) -> f32 {
        self.ticks_in_state as f32 * self.tick_period_secs
    }

    pub fn is_suppressed(&self) -> bool {
        self.inputs.window == WindowState::Suppressed
    }

    /// Fade-down command honouring the configured interruption policy.
    pub fn vacate_command(&self) -> RampCommand {
        RampCommand::Down {
            interruptible: self.config.interruptible_ramps,
        }
    }
}
