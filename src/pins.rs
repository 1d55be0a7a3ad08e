//! GPIO / peripheral assignments for the light controller board.
//!
//! Single source of truth for pin numbers and PWM parameters.  `main`
//! takes the matching typed pins from `Peripherals`; the numbers here are
//! what gets logged at boot and what the board is wired to.

// ---------------------------------------------------------------------------
// PIR motion sensor (HC-SR501 class, digital output)
// ---------------------------------------------------------------------------

/// Digital input: HIGH while motion is detected.
pub const MOTION_SENSOR_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Dimmable light (LEDC PWM into a MOSFET driver)
// ---------------------------------------------------------------------------

/// LEDC output to the light driver.
pub const LIGHT_PWM_GPIO: i32 = 2;
/// LEDC timer resolution.
pub const LIGHT_PWM_RESOLUTION_BITS: u32 = 10;
/// Highest duty value at [`LIGHT_PWM_RESOLUTION_BITS`].
pub const LIGHT_MAX_DUTY: u16 = (1 << LIGHT_PWM_RESOLUTION_BITS) - 1;
/// PWM carrier frequency; well above visible flicker.
pub const LIGHT_PWM_FREQ_HZ: u32 = 5_000;
