//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                      |
//! |------------|--------------|----------------------------------|
//! | `log_sink` | EventSink    | Serial log output                |
//! | `nvs`      | ConfigPort   | NVS / in-memory store            |
//! | `time`     | (HourHandoff)| System clock, SNTP, POSIX TZ     |
//! | `wifi`     | —            | ESP-IDF WiFi STA (for SNTP)      |
//!
//! The PWM and PIR drivers that implement `DutyOutput` and
//! `SensorInput` live in [`crate::drivers`].

pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
