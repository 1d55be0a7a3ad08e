//! Control loop — the hexagonal core.
//!
//! [`ControlLoop`] owns the FSM, the fade controller, the occupancy
//! filter, and the four driven ports.  Each [`tick`](ControlLoop::tick)
//! reads the hour, classifies it, samples occupancy, steps the FSM and
//! then executes whatever ramp the FSM asked for.
//!
//! ```text
//!  TimeSource ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                 │        ControlLoop          │
//! SensorInput ──▶ │ Window · Occupancy · FSM    │ ──▶ DutyOutput
//!                 │        FadeController       │ ◀─▶ StepPacer
//!                 └────────────────────────────┘
//! ```
//!
//! Nothing inside a tick can fail: a late clock falls back to the last
//! known hour, a sensor fault reads as "absent".

use embassy_time::Duration;
use log::{info, warn};

use crate::config::{LightConfig, MAX_RAMPS_PER_TICK};
use crate::control::fade::{FadeController, RampOutcome};
use crate::error::Result;
use crate::fsm::context::{FsmContext, RampCommand, TickInputs};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::occupancy::OccupancyFilter;
use crate::window::{Hour, SuppressWindow, WindowState};

use super::events::{AppEvent, RampDirection, TelemetryData};
use super::ports::{DutyOutput, EventSink, SensorInput, StepPacer, TimeSource};

/// Half period of one boot-time hour blink.
const ANNOUNCE_HALF_PERIOD: Duration = Duration::from_millis(500);

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop<O, S, T, P> {
    fsm: Fsm,
    ctx: FsmContext,
    fade: FadeController,
    occupancy: OccupancyFilter,
    window: SuppressWindow,
    /// Last hour actually obtained from the time source.
    last_hour: Option<Hour>,
    tick_count: u64,
    /// A sensor fault has already been reported during this tick.
    fault_reported: bool,

    output: O,
    sensor: S,
    clock: T,
    pacer: P,
}

impl<O, S, T, P> ControlLoop<O, S, T, P>
where
    O: DutyOutput,
    S: SensorInput,
    T: TimeSource,
    P: StepPacer,
{
    /// Validate `config` and build the loop.  Refuses to construct with
    /// [`Error::ConfigInvalid`](crate::error::Error::ConfigInvalid).
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: LightConfig, output: O, sensor: S, clock: T, pacer: P) -> Result<Self> {
        config.validate()?;
        let window = config.window()?;
        let fade = FadeController::from_config(&config);
        let occupancy = OccupancyFilter::new(config.hold_ticks());
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::ActiveIdle);

        Ok(Self {
            fsm,
            ctx,
            fade,
            occupancy,
            window,
            last_hour: None,
            tick_count: 0,
            fault_reported: false,
            output,
            sensor,
            clock,
            pacer,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Wait (bounded) for the first hour, pick the initial state from it
    /// and force the output dark.
    pub async fn start(&mut self, sink: &mut impl EventSink) {
        let hour = match self.clock.current_hour(self.ctx.config.clock_wait()).await {
            Ok(hour) => Some(hour),
            Err(e) => {
                warn!("CLOCK: no hour at startup ({}), starting motion-responsive", e);
                sink.emit(&AppEvent::ClockUnavailable { fallback: None });
                None
            }
        };
        self.last_hour = hour;

        let window = self.classify(hour);
        let initial = match window {
            WindowState::Suppressed => StateId::Suppressed,
            WindowState::Active => StateId::ActiveIdle,
        };
        self.ctx.inputs = TickInputs {
            hour,
            window,
            occupied: false,
        };
        self.output.apply(0);
        self.refresh_lamp();
        self.fsm.start(&mut self.ctx);
        self.fsm.force_transition(initial, &mut self.ctx);

        if self.ctx.config.announce_hour_on_boot {
            if let Some(hour) = hour {
                info!("CLOCK: announcing {} on the light", hour);
                self.fade
                    .announce(&mut self.output, &mut self.pacer, hour.get(), ANNOUNCE_HALF_PERIOD)
                    .await;
            }
        }

        sink.emit(&AppEvent::Started {
            state: initial,
            hour,
        });
        info!("ControlLoop started in {:?} (hour={:?})", initial, hour);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: clock → window → occupancy → FSM → ramps.
    pub async fn tick(&mut self, sink: &mut impl EventSink) {
        self.tick_count += 1;
        self.fault_reported = false;

        // 1. Hour (bounded), falling back to the last known value
        let hour = self.resolve_hour(sink).await;
        let window = self.classify(hour);

        // 2. Occupancy; the sensor is not read while suppressed
        self.occupancy.advance();
        let occupied = match window {
            WindowState::Suppressed => {
                self.occupancy.clear();
                false
            }
            WindowState::Active => {
                let raw = sample(&mut self.sensor, sink, &mut self.fault_reported);
                self.occupancy.observe(raw)
            }
        };
        self.ctx.inputs = TickInputs {
            hour,
            window,
            occupied,
        };

        // 3. FSM tick (pure state logic)
        self.refresh_lamp();
        let prev = self.fsm.current_state();
        self.fsm.tick(&mut self.ctx);
        self.note_transition(prev, sink);

        // 4. Execute the requested ramp(s)
        self.run_ramps(sink).await;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            state: self.fsm.current_state(),
            hour: self.ctx.inputs.hour,
            level: self.fade.level(),
            light_on: self.fade.is_on(),
            occupied: self.ctx.inputs.occupied,
            ticks: self.tick_count,
        }
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn level(&self) -> u16 {
        self.fade.level()
    }

    pub fn is_light_on(&self) -> bool {
        self.fade.is_on()
    }

    pub fn last_hour(&self) -> Option<Hour> {
        self.last_hour
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &LightConfig {
        &self.ctx.config
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn clock_mut(&mut self) -> &mut T {
        &mut self.clock
    }

    // ── Internal ──────────────────────────────────────────────

    /// An hour that was never obtained classifies as `Active`.
    fn classify(&self, hour: Option<Hour>) -> WindowState {
        hour.map_or(WindowState::Active, |h| self.window.classify(h))
    }

    async fn resolve_hour(&mut self, sink: &mut impl EventSink) -> Option<Hour> {
        match self.clock.current_hour(self.ctx.config.tick_clock_wait()).await {
            Ok(hour) => {
                self.last_hour = Some(hour);
                Some(hour)
            }
            Err(e) => {
                warn!("CLOCK: {} — using last known hour {:?}", e, self.last_hour);
                sink.emit(&AppEvent::ClockUnavailable {
                    fallback: self.last_hour,
                });
                self.last_hour
            }
        }
    }

    fn refresh_lamp(&mut self) {
        self.ctx.lamp = self.fade.status();
    }

    fn note_transition(&self, prev: StateId, sink: &mut impl EventSink) {
        let now = self.fsm.current_state();
        if now != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to: now });
        }
    }

    /// Execute the FSM's ramp command.  An interrupted ramp re-steps the
    /// FSM with the occupancy that stopped it, so the reversal starts from
    /// the current level within the same tick.
    async fn run_ramps(&mut self, sink: &mut impl EventSink) {
        let live = self.ctx.config.interruptible_ramps;

        for _ in 0..MAX_RAMPS_PER_TICK {
            let mut occupied = self.ctx.inputs.occupied;
            let sensor = &mut self.sensor;
            let occupancy = &mut self.occupancy;
            let reported = &mut self.fault_reported;

            let (direction, outcome) = match self.ctx.command {
                RampCommand::Hold => return,
                RampCommand::Up => {
                    let outcome = self
                        .fade
                        .fade_up(&mut self.output, &mut self.pacer, || {
                            if !live {
                                return true;
                            }
                            occupied = occupancy.observe(sample(sensor, sink, reported));
                            occupied
                        })
                        .await;
                    (RampDirection::Up, outcome)
                }
                RampCommand::Down { interruptible } => {
                    let outcome = self
                        .fade
                        .fade_down(&mut self.output, &mut self.pacer, || {
                            if !(interruptible && live) {
                                return true;
                            }
                            occupied = occupancy.observe(sample(sensor, sink, reported));
                            !occupied
                        })
                        .await;
                    (RampDirection::Down, outcome)
                }
            };

            if outcome == RampOutcome::Unchanged {
                return;
            }
            sink.emit(&AppEvent::RampFinished {
                direction,
                level: self.fade.level(),
                interrupted: outcome == RampOutcome::Interrupted,
            });

            self.ctx.inputs.occupied = occupied;
            self.refresh_lamp();
            let prev = self.fsm.current_state();
            self.fsm.step(&mut self.ctx);
            self.note_transition(prev, sink);
        }
    }
}

/// Read the sensor, mapping faults to "absent".  Only the first fault of
/// a tick is reported; ramps sample once per step.
fn sample(sensor: &mut impl SensorInput, sink: &mut impl EventSink, reported: &mut bool) -> bool {
    match sensor.is_present() {
        Ok(present) => present,
        Err(e) => {
            if !*reported {
                *reported = true;
                warn!("SENSOR: {}, treating as absent", e);
                sink.emit(&AppEvent::SensorFault);
            }
            false
        }
    }
}
