//! Output control: the brightness ramp and its step pacing.

pub mod fade;
