//! Integration tests for the ControlLoop → FSM → fade pipeline.
//!
//! These run on the host (x86_64) against the mocks in `mock_hw`, with a
//! pacer that never sleeps so full 1023-step ramps finish instantly.

use futures_lite::future::block_on;

use dusklight::app::control_loop::ControlLoop;
use dusklight::app::events::{AppEvent, RampDirection};
use dusklight::config::LightConfig;
use dusklight::error::Error;
use dusklight::fsm::StateId;
use dusklight::window::Hour;

use crate::mock_hw::{MockClock, MockSensor, NoDelayPacer, RecordingOutput, RecordingSink};

type Loop = ControlLoop<RecordingOutput, MockSensor, MockClock, NoDelayPacer>;

/// Defaults with no occupancy hold, so absence is acted on at once.
fn no_hold() -> LightConfig {
    LightConfig {
        hold_secs: 0,
        ..LightConfig::default()
    }
}

fn started(config: LightConfig, hour: Option<u8>, present: bool) -> (Loop, RecordingSink) {
    let clock = MockClock { hour };
    let mut ctl = ControlLoop::new(
        config,
        RecordingOutput::new(),
        MockSensor::new(present),
        clock,
        NoDelayPacer::default(),
    )
    .unwrap();
    let mut sink = RecordingSink::new();
    block_on(ctl.start(&mut sink));
    (ctl, sink)
}

fn tick(ctl: &mut Loop, sink: &mut RecordingSink) {
    block_on(ctl.tick(sink));
}

fn set_present(ctl: &mut Loop, present: bool) {
    ctl.sensor_mut().present = present;
}

fn set_hour(ctl: &mut Loop, hour: Option<u8>) {
    ctl.clock_mut().hour = hour;
}

fn is_monotonic_up(levels: &[u16]) -> bool {
    levels.windows(2).all(|w| w[0] <= w[1])
}

fn is_monotonic_down(levels: &[u16]) -> bool {
    levels.windows(2).all(|w| w[0] >= w[1])
}

// ── Startup ──────────────────────────────────────────────────

#[test]
fn starts_dark_and_reports_initial_state() {
    let (ctl, sink) = started(no_hold(), Some(20), false);
    assert_eq!(ctl.state(), StateId::ActiveIdle);
    assert_eq!(ctl.output().writes, vec![0]);
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::Started {
            state: StateId::ActiveIdle,
            hour: Hour::new(20),
        })
    );
}

#[test]
fn starts_suppressed_inside_window() {
    let (ctl, _) = started(no_hold(), Some(8), true);
    assert_eq!(ctl.state(), StateId::Suppressed);
}

#[test]
fn invalid_config_is_refused() {
    let config = LightConfig {
        suppress_start_hour: 15,
        suppress_end_hour: 8,
        ..LightConfig::default()
    };
    let result = ControlLoop::new(
        config,
        RecordingOutput::new(),
        MockSensor::new(false),
        MockClock::at(12),
        NoDelayPacer::default(),
    );
    assert!(matches!(result, Err(Error::ConfigInvalid(_))));
}

#[test]
fn boot_announcement_blinks_the_hour() {
    let config = LightConfig {
        announce_hour_on_boot: true,
        ..no_hold()
    };
    let (ctl, _) = started(config, Some(3), false);
    assert_eq!(
        ctl.output().writes,
        vec![0, 1023, 0, 1023, 0, 1023, 0, 0],
        "three blinks, then restore dark"
    );
    assert_eq!(ctl.level(), 0);
    assert!(!ctl.is_light_on());
}

// ── Suppressed window ────────────────────────────────────────

#[test]
fn motion_is_ignored_while_suppressed() {
    let (mut ctl, mut sink) = started(no_hold(), Some(10), true);
    for _ in 0..5 {
        tick(&mut ctl, &mut sink);
    }
    assert_eq!(ctl.state(), StateId::Suppressed);
    assert_eq!(ctl.output().writes, vec![0]);
    assert_eq!(ctl.sensor_mut().reads, 0, "sensor must not be read");
}

#[test]
fn window_bounds_are_inclusive() {
    let (mut ctl, mut sink) = started(no_hold(), Some(15), true);
    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.state(), StateId::Suppressed);
    assert_eq!(ctl.level(), 0);

    set_hour(&mut ctl, Some(16));
    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.state(), StateId::ActiveOccupied);
    assert_eq!(ctl.level(), 1023);
}

#[test]
fn entering_window_forces_light_off_despite_motion() {
    let (mut ctl, mut sink) = started(no_hold(), Some(7), true);
    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.level(), 1023);

    let reads_before = ctl.sensor_mut().reads;
    set_hour(&mut ctl, Some(8));
    tick(&mut ctl, &mut sink);

    assert_eq!(ctl.state(), StateId::Suppressed);
    assert_eq!(ctl.level(), 0);
    assert!(!ctl.is_light_on());
    assert_eq!(ctl.output().last(), Some(0));
    assert_eq!(ctl.sensor_mut().reads, reads_before);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::RampFinished {
                direction: RampDirection::Down,
                interrupted: false,
                ..
            }
        )),
        1
    );
}

// ── Active window ────────────────────────────────────────────

#[test]
fn presence_fades_up_to_full() {
    let (mut ctl, mut sink) = started(no_hold(), Some(16), true);
    tick(&mut ctl, &mut sink);

    assert_eq!(ctl.state(), StateId::ActiveOccupied);
    assert_eq!(ctl.level(), 1023);
    assert!(ctl.is_light_on());

    let writes = &ctl.output().writes;
    assert_eq!(writes.len(), 1 + 1023);
    assert!(is_monotonic_up(writes));
    assert_eq!(writes.last(), Some(&1023));
}

#[test]
fn fade_up_is_idempotent_once_full() {
    let (mut ctl, mut sink) = started(no_hold(), Some(16), true);
    tick(&mut ctl, &mut sink);
    let writes = ctl.output().writes.len();

    for _ in 0..3 {
        tick(&mut ctl, &mut sink);
    }
    assert_eq!(ctl.output().writes.len(), writes, "no re-apply at full");
    assert_eq!(ctl.state(), StateId::ActiveOccupied);
}

#[test]
fn absence_fades_down_and_returns_to_idle() {
    let (mut ctl, mut sink) = started(no_hold(), Some(22), true);
    tick(&mut ctl, &mut sink);
    let lit = ctl.output().writes.len();
    set_present(&mut ctl, false);
    tick(&mut ctl, &mut sink);

    assert_eq!(ctl.state(), StateId::ActiveIdle);
    assert_eq!(ctl.level(), 0);
    assert!(!ctl.is_light_on());
    assert_eq!(ctl.output().last(), Some(0));

    let fade_down = &ctl.output().writes[lit - 1..];
    assert_eq!(fade_down.first(), Some(&1023));
    assert!(is_monotonic_down(fade_down));

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (StateId::ActiveIdle, StateId::ActiveOccupied),
            (StateId::ActiveOccupied, StateId::ActiveVacated),
            (StateId::ActiveVacated, StateId::ActiveIdle),
        ]
    );
}

#[test]
fn repeated_visits_round_trip() {
    let (mut ctl, mut sink) = started(no_hold(), Some(23), false);
    for _ in 0..3 {
        set_present(&mut ctl, true);
        tick(&mut ctl, &mut sink);
        assert_eq!(ctl.level(), 1023);
        set_present(&mut ctl, false);
        tick(&mut ctl, &mut sink);
        assert_eq!(ctl.level(), 0);
    }
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::RampFinished { interrupted: false, .. })),
        6
    );
    assert_eq!(ctl.state(), StateId::ActiveIdle);
}

#[test]
fn hold_keeps_light_on_between_detections() {
    let config = LightConfig {
        hold_secs: 3,
        tick_interval_ms: 1000,
        ..LightConfig::default()
    };
    let (mut ctl, mut sink) = started(config, Some(21), true);
    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.level(), 1023);

    set_present(&mut ctl, false);
    for _ in 0..3 {
        tick(&mut ctl, &mut sink);
        assert_eq!(ctl.state(), StateId::ActiveOccupied);
        assert_eq!(ctl.level(), 1023);
    }

    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.state(), StateId::ActiveIdle);
    assert_eq!(ctl.level(), 0);
}

#[test]
fn returning_presence_reverses_fade_down_within_the_tick() {
    let (mut ctl, mut sink) = started(no_hold(), Some(19), true);
    tick(&mut ctl, &mut sink);
    let before = ctl.output().writes.len();

    // Tick sample plus 100 in-ramp samples read absent, then presence returns.
    ctl.sensor_mut().queue(false, 101);
    tick(&mut ctl, &mut sink);

    let tick_writes = &ctl.output().writes[before..];
    let lowest = tick_writes.iter().copied().min();
    assert_eq!(lowest, Some(923));
    assert_eq!(ctl.level(), 1023);
    assert_eq!(ctl.state(), StateId::ActiveOccupied);
    assert!(sink.events.contains(&AppEvent::RampFinished {
        direction: RampDirection::Down,
        level: 923,
        interrupted: true,
    }));
}

#[test]
fn losing_presence_reverses_fade_up_within_the_tick() {
    let (mut ctl, mut sink) = started(no_hold(), Some(20), false);

    // Tick sample plus 50 in-ramp samples read present, then the area empties.
    ctl.sensor_mut().queue(true, 51);
    tick(&mut ctl, &mut sink);

    assert!(sink.events.contains(&AppEvent::RampFinished {
        direction: RampDirection::Up,
        level: 50,
        interrupted: true,
    }));
    assert_eq!(ctl.output().writes.iter().copied().max(), Some(50));
    assert_eq!(ctl.level(), 0);
    assert!(!ctl.is_light_on());
    assert_eq!(ctl.state(), StateId::ActiveIdle);
}

#[test]
fn legacy_ramps_run_to_completion() {
    let config = LightConfig {
        interruptible_ramps: false,
        ..no_hold()
    };
    let (mut ctl, mut sink) = started(config, Some(18), false);
    ctl.sensor_mut().queue(true, 1);
    tick(&mut ctl, &mut sink);

    assert_eq!(ctl.level(), 1023, "fade-up ignores the sensor");
    assert_eq!(ctl.sensor_mut().reads, 1);

    ctl.sensor_mut().queue(false, 1);
    set_present(&mut ctl, true);
    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.level(), 0, "fade-down ignores returning motion");
    assert_eq!(ctl.state(), StateId::ActiveIdle);
}

// ── Degraded inputs ──────────────────────────────────────────

#[test]
fn sensor_fault_reads_as_absent() {
    let (mut ctl, mut sink) = started(no_hold(), Some(20), true);
    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.level(), 1023);

    ctl.sensor_mut().fault = true;
    tick(&mut ctl, &mut sink);

    assert_eq!(ctl.level(), 0);
    assert_eq!(ctl.state(), StateId::ActiveIdle);
    assert!(sink.events.contains(&AppEvent::SensorFault));
}

#[test]
fn stuck_sensor_fault_is_reported_once_per_tick() {
    let (mut ctl, mut sink) = started(no_hold(), Some(20), true);
    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.level(), 1023);

    ctl.sensor_mut().fault = true;
    let reads_before = ctl.sensor_mut().reads;
    tick(&mut ctl, &mut sink);

    // The interruptible fade-down keeps sampling every step...
    assert!(ctl.sensor_mut().reads - reads_before > 1000);
    // ...but the fault surfaces as a single event.
    assert_eq!(sink.count(|e| *e == AppEvent::SensorFault), 1);
    assert_eq!(ctl.level(), 0);
    assert_eq!(ctl.state(), StateId::ActiveIdle);

    tick(&mut ctl, &mut sink);
    assert_eq!(sink.count(|e| *e == AppEvent::SensorFault), 2);
}

#[test]
fn late_clock_falls_back_to_last_hour() {
    let (mut ctl, mut sink) = started(no_hold(), Some(11), true);
    set_hour(&mut ctl, None);
    tick(&mut ctl, &mut sink);

    assert_eq!(ctl.state(), StateId::Suppressed);
    assert_eq!(ctl.last_hour(), Hour::new(11));
    assert!(sink.events.contains(&AppEvent::ClockUnavailable {
        fallback: Hour::new(11),
    }));
}

#[test]
fn never_synced_clock_is_motion_responsive() {
    let (mut ctl, mut sink) = started(no_hold(), None, true);
    assert_eq!(ctl.state(), StateId::ActiveIdle);
    assert!(sink
        .events
        .contains(&AppEvent::ClockUnavailable { fallback: None }));

    tick(&mut ctl, &mut sink);
    assert_eq!(ctl.level(), 1023);
}

#[test]
fn telemetry_reflects_loop_state() {
    let (mut ctl, mut sink) = started(no_hold(), Some(17), true);
    tick(&mut ctl, &mut sink);
    let t = ctl.build_telemetry();
    assert_eq!(t.state, StateId::ActiveOccupied);
    assert_eq!(t.hour, Hour::new(17));
    assert_eq!(t.level, 1023);
    assert!(t.light_on);
    assert!(t.occupied);
    assert_eq!(t.ticks, 1);
}
