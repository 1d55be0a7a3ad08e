//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the light controller:
//! window classification, occupancy debounce, FSM orchestration and ramp
//! execution.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod control_loop;
pub mod events;
pub mod ports;
