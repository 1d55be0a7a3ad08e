//! Peripheral drivers: PWM dimmer, PIR input, watchdog, task pinning,
//! and the embassy runtime hooks for ESP-IDF.

pub mod dimmer;
pub mod motion;
#[cfg(target_os = "espidf")]
pub mod runtime_hooks;
pub mod task_pin;
pub mod watchdog;
