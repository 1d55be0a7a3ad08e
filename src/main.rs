//! Dusklight Firmware — Main Entry Point
//!
//! Hexagonal architecture: an async control task on the main thread and
//! a clock thread that keeps the local hour current.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Dimmer (LEDC)   MotionSensor (GPIO)   LogEventSink   NvsStore │
//! │  (DutyOutput)    (SensorInput)         (EventSink)   (Config)  │
//! │  WifiStation + EspSntp ──▶ HourPublisher ──▶ HOUR_HANDOFF      │
//! │                                               (TimeSource)     │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ControlLoop (pure logic)                  │    │
//! │  │  Window · Occupancy · FSM · FadeController             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration as StdDuration;

use anyhow::{Result, anyhow};
use embassy_time::Ticker;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sntp::EspSntp;
use log::{error, info, warn};

use dusklight::adapters::log_sink::LogEventSink;
use dusklight::adapters::nvs::NvsConfigStore;
use dusklight::adapters::time::{HourPublisher, read_local_hour, set_timezone};
use dusklight::adapters::wifi::WifiStation;
use dusklight::app::control_loop::ControlLoop;
use dusklight::app::events::AppEvent;
use dusklight::app::ports::{
    ConfigError, ConfigPort, DutyOutput, EventSink, SensorInput, StepPacer, TimeSource,
};
use dusklight::clock::{HOUR_HANDOFF, HandoffTimeSource};
use dusklight::config::LightConfig;
use dusklight::control::fade::TimerPacer;
use dusklight::drivers::dimmer::Dimmer;
use dusklight::drivers::motion::MotionSensor;
use dusklight::drivers::runtime_hooks;
use dusklight::drivers::task_pin::{Core, spawn_on_core};
use dusklight::drivers::watchdog::Watchdog;
use dusklight::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    runtime_hooks::start()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Dusklight v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsConfigStore::new() {
        Ok(store) => load_config(&store)?,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            LightConfig::default()
        }
    };
    log_config(&config);
    if let Err(e) = config.validate() {
        error!("Config rejected: {}, refusing to start", e);
        return Err(e.into());
    }

    // ── 3. Network + time sync ────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    let _wifi = if config.wifi_ssid.is_empty() {
        warn!("WiFi: no SSID configured, running without wall-clock time");
        None
    } else {
        match WifiStation::connect(
            peripherals.modem,
            &sysloop,
            &config.wifi_ssid,
            &config.wifi_password,
        ) {
            Ok(station) => Some(station),
            Err(e) => {
                warn!("WiFi: {}, running without wall-clock time", e);
                None
            }
        }
    };
    let _sntp = EspSntp::new_default()
        .inspect_err(|e| warn!("SNTP: init failed ({})", e))
        .ok();
    set_timezone(&config.timezone);

    let publisher = HourPublisher::new(
        &HOUR_HANDOFF,
        read_local_hour,
        config.sync_retry_count,
        StdDuration::from_millis(u64::from(config.sync_wait_ms)),
        StdDuration::from_secs(u64::from(config.hour_poll_secs)),
    );
    spawn_on_core(Core::Pro, 5, 4, "hour-sync\0", move || {
        publisher.run();
    })?;

    // ── 4. Light + sensor peripherals ─────────────────────────
    info!(
        "Pins: PIR=GPIO{} light=GPIO{} ({} Hz, {}-bit)",
        pins::MOTION_SENSOR_GPIO,
        pins::LIGHT_PWM_GPIO,
        pins::LIGHT_PWM_FREQ_HZ,
        pins::LIGHT_PWM_RESOLUTION_BITS
    );
    let ledc_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(Hertz(pins::LIGHT_PWM_FREQ_HZ))
            .resolution(Resolution::Bits10),
    )?;
    let channel = LedcDriver::new(peripherals.ledc.channel0, &ledc_timer, peripherals.pins.gpio2)?;
    let pir = PinDriver::input(peripherals.pins.gpio17)?;

    // ── 5. Control loop ───────────────────────────────────────
    let control = ControlLoop::new(
        config.clone(),
        Dimmer::new(channel, config.max_duty),
        MotionSensor::new(pir),
        HandoffTimeSource::new(&HOUR_HANDOFF),
        TimerPacer,
    )
    .inspect_err(|e| error!("ControlLoop refused config: {}", e))?;

    info!("System ready. Entering control loop.");

    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor.spawn(control_task(control)).detach();
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));

    Ok(())
}

/// Stored config, or defaults on first boot.  A stored config that fails
/// validation is fatal; storage faults fall back to defaults.
fn load_config(store: &impl ConfigPort) -> Result<LightConfig> {
    match store.load() {
        Ok(cfg) => {
            if !store.has_stored() {
                match store.save(&cfg) {
                    Ok(()) => info!("Config: defaults written to NVS"),
                    Err(e) => warn!("Config: could not persist defaults ({})", e),
                }
            }
            Ok(cfg)
        }
        Err(ConfigError::ValidationFailed(why)) => {
            error!("Config: stored config invalid ({}), refusing to start", why);
            Err(anyhow!("stored config invalid: {}", why))
        }
        Err(e) => {
            warn!("Config: load failed ({}), using defaults", e);
            Ok(LightConfig::default())
        }
    }
}

fn log_config(config: &LightConfig) {
    let mut shown = config.clone();
    if !shown.wifi_password.is_empty() {
        shown.wifi_password.clear();
        let _ = shown.wifi_password.push_str("***");
    }
    match serde_json::to_string(&shown) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config: not printable ({})", e),
    }
}

/// The light control task: start, then one tick per interval forever.
async fn control_task<O, S, T, P>(mut control: ControlLoop<O, S, T, P>)
where
    O: DutyOutput,
    S: SensorInput,
    T: TimeSource,
    P: StepPacer,
{
    let mut sink = LogEventSink::new();
    control.start(&mut sink).await;

    let watchdog = Watchdog::new(control.config().watchdog_timeout_ms);
    let telemetry_every = control.config().telemetry_every_ticks();
    let mut ticker = Ticker::every(control.config().tick_interval());

    loop {
        ticker.next().await;
        control.tick(&mut sink).await;
        watchdog.feed();

        if control.tick_count() % telemetry_every == 0 {
            sink.emit(&AppEvent::Telemetry(control.build_telemetry()));
        }
    }
}
