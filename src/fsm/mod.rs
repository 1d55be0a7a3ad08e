//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌────────────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ StateId        │ on_enter  │ on_exit  │ on_update         │   │
//! │  ├────────────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ Suppressed     │ fn(ctx)   │ -        │ fn(ctx)->Option<> │   │
//! │  │ ActiveIdle     │ fn(ctx)   │ -        │ fn(ctx)->Option<> │   │
//! │  │ ActiveOccupied │ fn(ctx)   │ -        │ fn(ctx)->Option<> │   │
//! │  │ ActiveVacated  │ fn(ctx)   │ -        │ fn(ctx)->Option<> │   │
//! │  └────────────────┴───────────┴──────────┴───────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  Handlers never touch hardware: they only write a
//! [`RampCommand`](context::RampCommand) into the context.
//!
//! [`Fsm::step`] re-evaluates the current state without counting a new
//! tick; the control loop uses it after a ramp changes the lamp mid-tick.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all controller states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Inside the daytime window: dark, motion ignored.
    Suppressed = 0,
    /// Active window, nobody present, light dark.
    ActiveIdle = 1,
    /// Active window, presence detected, light on or ramping up.
    ActiveOccupied = 2,
    /// Active window, presence just lost, ramping down.
    ActiveVacated = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Asserts in debug builds;
    /// falls back to `Suppressed` (lamp dark) in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Suppressed,
            1 => Self::ActiveIdle,
            2 => Self::ActiveOccupied,
            3 => Self::ActiveVacated,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Suppressed
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick, then evaluate the current state.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;
        ctx.total_ticks = self.tick_count;
        self.step(ctx);
    }

    /// Evaluate `on_update` for the current state without counting a tick.
    pub fn step(&mut self, ctx: &mut FsmContext) {
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (used to place the machine in the
    /// state implied by the startup hour).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    pub fn state_name(&self) -> &'static str {
        self.table[self.current].name
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::{FsmContext, LampStatus, RampCommand};
    use super::*;
    use crate::config::LightConfig;
    use crate::window::{Hour, WindowState};

    const FULL: LampStatus = LampStatus {
        level: 1023,
        light_on: true,
        dark: false,
        full: true,
    };

    fn make_ctx() -> FsmContext {
        FsmContext::new(LightConfig::default())
    }

    fn make_fsm(initial: StateId) -> (Fsm, FsmContext) {
        let mut fsm = Fsm::new(states::build_state_table(), initial);
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        (fsm, ctx)
    }

    fn active(ctx: &mut FsmContext, occupied: bool) {
        ctx.inputs.hour = Hour::new(20);
        ctx.inputs.window = WindowState::Active;
        ctx.inputs.occupied = occupied;
    }

    fn suppressed(ctx: &mut FsmContext) {
        ctx.inputs.hour = Hour::new(10);
        ctx.inputs.window = WindowState::Suppressed;
        ctx.inputs.occupied = false;
    }

    #[test]
    fn tick_increments_counter() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveIdle);
        active(&mut ctx, false);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.ticks_in_current_state(), 1);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.ticks_in_current_state(), 2);
        assert_eq!(ctx.total_ticks, 2);
    }

    #[test]
    fn step_does_not_count_a_tick() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveIdle);
        active(&mut ctx, false);
        fsm.step(&mut ctx);
        fsm.step(&mut ctx);
        assert_eq!(fsm.ticks_in_current_state(), 0);
    }

    #[test]
    fn idle_to_occupied_requests_fade_up() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveIdle);
        active(&mut ctx, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::ActiveOccupied);
        assert_eq!(ctx.command, RampCommand::Up);
    }

    #[test]
    fn occupied_and_full_holds_without_retrigger() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveOccupied);
        active(&mut ctx, true);
        ctx.lamp = FULL;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::ActiveOccupied);
        assert_eq!(ctx.command, RampCommand::Hold);
    }

    #[test]
    fn losing_occupancy_vacates_and_fades_down() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveOccupied);
        active(&mut ctx, false);
        ctx.lamp = FULL;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::ActiveVacated);
        assert_eq!(ctx.command, RampCommand::Down { interruptible: true });
    }

    #[test]
    fn vacated_settles_to_idle_once_dark() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveVacated);
        active(&mut ctx, false);
        ctx.lamp = LampStatus::default();
        fsm.step(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::ActiveIdle);
        assert_eq!(ctx.command, RampCommand::Hold);
    }

    #[test]
    fn vacated_returns_to_occupied_on_presence() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveVacated);
        active(&mut ctx, true);
        ctx.lamp = LampStatus {
            level: 400,
            light_on: true,
            dark: false,
            full: false,
        };
        fsm.step(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::ActiveOccupied);
        assert_eq!(ctx.command, RampCommand::Up);
    }

    #[test]
    fn entering_window_forces_uninterruptible_fade_down() {
        for start in [StateId::ActiveIdle, StateId::ActiveOccupied, StateId::ActiveVacated] {
            let (mut fsm, mut ctx) = make_fsm(start);
            suppressed(&mut ctx);
            ctx.lamp = FULL;
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_state(), StateId::Suppressed, "from {:?}", start);
            assert_eq!(ctx.command, RampCommand::Down { interruptible: false });
        }
    }

    #[test]
    fn suppressed_ignores_occupancy() {
        let (mut fsm, mut ctx) = make_fsm(StateId::Suppressed);
        suppressed(&mut ctx);
        ctx.inputs.occupied = true;
        for _ in 0..5 {
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_state(), StateId::Suppressed);
            assert_eq!(ctx.command, RampCommand::Hold);
        }
    }

    #[test]
    fn leaving_window_with_presence_goes_occupied() {
        let (mut fsm, mut ctx) = make_fsm(StateId::Suppressed);
        active(&mut ctx, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::ActiveOccupied);
    }

    #[test]
    fn leaving_window_empty_goes_idle() {
        let (mut fsm, mut ctx) = make_fsm(StateId::Suppressed);
        active(&mut ctx, false);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::ActiveIdle);
    }

    #[test]
    fn legacy_mode_fades_down_uninterruptibly() {
        let mut fsm = Fsm::new(states::build_state_table(), StateId::ActiveOccupied);
        let mut ctx = FsmContext::new(LightConfig {
            interruptible_ramps: false,
            ..Default::default()
        });
        fsm.start(&mut ctx);
        active(&mut ctx, false);
        ctx.lamp = FULL;
        fsm.tick(&mut ctx);
        assert_eq!(ctx.command, RampCommand::Down { interruptible: false });
    }

    #[test]
    fn force_transition_runs_enter() {
        let (mut fsm, mut ctx) = make_fsm(StateId::ActiveIdle);
        ctx.lamp = FULL;
        fsm.force_transition(StateId::Suppressed, &mut ctx);
        assert_eq!(fsm.current_state(), StateId::Suppressed);
        assert_eq!(ctx.command, RampCommand::Down { interruptible: false });
    }

    #[test]
    fn state_id_from_index_roundtrip() {
        for i in 0..StateId::COUNT {
            let id = StateId::from_index(i);
            assert_eq!(id as usize, i);
        }
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn state_id_from_invalid_index_falls_back_dark() {
        assert_eq!(StateId::from_index(99), StateId::Suppressed);
    }
}
