//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers with no closures and
//! no heap.  Handlers read the tick inputs and lamp
//! snapshot from the context and write back a ramp command.
//!
//! ```text
//!                 [hour in window]            (from any Active* state)
//!   ┌──────────────────────────────────────────────────┐
//!   ▼                                                  │
//! SUPPRESSED ──[hour outside window]──▶ ACTIVE_IDLE ◀──┤
//!                                        │    ▲        │
//!                                 [occupied]  [dark]   │
//!                                        ▼    │        │
//!                             ACTIVE_OCCUPIED ◀─[occupied]─┐
//!                                        │                 │
//!                                [not occupied]            │
//!                                        ▼                 │
//!                                 ACTIVE_VACATED ──────────┘
//! ```

use super::context::{FsmContext, RampCommand};
use super::{StateDescriptor, StateId};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Suppressed
        StateDescriptor {
            id: StateId::Suppressed,
            name: "Suppressed",
            on_enter: Some(suppressed_enter),
            on_exit: Some(suppressed_exit),
            on_update: suppressed_update,
        },
        // Index 1 — ActiveIdle
        StateDescriptor {
            id: StateId::ActiveIdle,
            name: "ActiveIdle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 2 — ActiveOccupied
        StateDescriptor {
            id: StateId::ActiveOccupied,
            name: "ActiveOccupied",
            on_enter: Some(occupied_enter),
            on_exit: None,
            on_update: occupied_update,
        },
        // Index 3 — ActiveVacated
        StateDescriptor {
            id: StateId::ActiveVacated,
            name: "ActiveVacated",
            on_enter: Some(vacated_enter),
            on_exit: None,
            on_update: vacated_update,
        },
    ]
}

/// State to enter when the window opens, given the current inputs.
fn active_entry(ctx: &FsmContext) -> StateId {
    if ctx.inputs.occupied {
        StateId::ActiveOccupied
    } else if ctx.lamp.dark {
        StateId::ActiveIdle
    } else {
        StateId::ActiveVacated
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SUPPRESSED — daytime window, motion ignored
// ═══════════════════════════════════════════════════════════════════════════

/// Darkness is enforced unconditionally: the fade-down here is never
/// interruptible, whatever the sensor says.
fn suppress_command(ctx: &FsmContext) -> RampCommand {
    if ctx.lamp.dark {
        RampCommand::Hold
    } else {
        RampCommand::Down {
            interruptible: false,
        }
    }
}

fn suppressed_enter(ctx: &mut FsmContext) {
    ctx.command = suppress_command(ctx);
    info!(
        "SUPPRESSED: window {:02}–{:02}h, motion ignored (level={})",
        ctx.config.suppress_start_hour, ctx.config.suppress_end_hour, ctx.lamp.level
    );
}

fn suppressed_exit(ctx: &mut FsmContext) {
    info!("SUPPRESSED: window closed after {:.0}s", ctx.secs_in_state());
}

fn suppressed_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.is_suppressed() {
        return Some(active_entry(ctx));
    }
    ctx.command = suppress_command(ctx);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACTIVE_IDLE — nobody present, light dark
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.command = RampCommand::Hold;
    info!("ACTIVE_IDLE: light dark, watching for motion");
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.is_suppressed() {
        return Some(StateId::Suppressed);
    }
    if ctx.inputs.occupied {
        return Some(StateId::ActiveOccupied);
    }
    // Idle never keeps a lit lamp.
    if !ctx.lamp.dark {
        return Some(StateId::ActiveVacated);
    }
    ctx.command = RampCommand::Hold;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACTIVE_OCCUPIED — presence detected, light on or ramping up
// ═══════════════════════════════════════════════════════════════════════════

fn occupied_command(ctx: &FsmContext) -> RampCommand {
    if ctx.lamp.full {
        RampCommand::Hold
    } else {
        RampCommand::Up
    }
}

fn occupied_enter(ctx: &mut FsmContext) {
    ctx.command = occupied_command(ctx);
    info!("ACTIVE_OCCUPIED: motion, fading up from {}", ctx.lamp.level);
}

fn occupied_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.is_suppressed() {
        return Some(StateId::Suppressed);
    }
    if !ctx.inputs.occupied {
        return Some(if ctx.lamp.dark {
            StateId::ActiveIdle
        } else {
            StateId::ActiveVacated
        });
    }
    ctx.command = occupied_command(ctx);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACTIVE_VACATED — presence lost, ramping down
// ═══════════════════════════════════════════════════════════════════════════

fn vacated_command(ctx: &FsmContext) -> RampCommand {
    if ctx.lamp.dark {
        RampCommand::Hold
    } else {
        ctx.vacate_command()
    }
}

fn vacated_enter(ctx: &mut FsmContext) {
    ctx.command = vacated_command(ctx);
    info!("ACTIVE_VACATED: no motion, fading down from {}", ctx.lamp.level);
}

fn vacated_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.is_suppressed() {
        return Some(StateId::Suppressed);
    }
    if ctx.inputs.occupied {
        return Some(StateId::ActiveOccupied);
    }
    if ctx.lamp.dark {
        return Some(StateId::ActiveIdle);
    }
    ctx.command = vacated_command(ctx);
    None
}
