//! # Engine — The Loop Driver
//!
//! The [`Engine`] owns the [`Context`] (and with it the world), the
//! [`Scheduler`] and the [`PluginStore`], and drives them through the
//! lifecycle:
//!
//! ```text
//! start(fps) ─► Prepare (first start only) ─► Startup ─┐
//!                                                      ▼
//!        ┌───────────── every sampling tick ─────────────┐
//!        │ Update         always                         │
//!        │ FixedUpdate    once a frame period has passed │
//!        └───────────────────────────────────────────────┘
//! stop() ─► Stop plugins ─► Stop systems
//! ```
//!
//! Each lifecycle phase first builds the plugins registered under it, then
//! runs one scheduler pass. Update and FixedUpdate only run systems.
//!
//! ## Two cadences
//!
//! The loop samples time at [`EngineConfig::sample_interval_ms`], which should
//! be finer than the frame period. Update runs on every sample. FixedUpdate
//! runs when at least one frame period has passed since its previous run,
//! at most once per sample: missed periods are never replayed in a burst.
//!
//! ## Comparison
//!
//! - **bevy_app**: `App::run` hands control to a runner; `FixedUpdate` catches
//!   up with an accumulator, running several times per frame if needed.
//! - **ravn**: one driver, one clock; FixedUpdate fires at most once per tick.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::ecs::system::{Phase, Scheduler, System, SystemId};
use crate::ecs::world::World;
use crate::error::{EcsError, Result};
use crate::plugin::{Plugin, PluginStore, Timing};
use crate::signal::Signal;
use crate::time::{Clock, SystemClock, Time};

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Running {
        period: Duration,
        started: Duration,
        last_tick: Duration,
        last_fixed: Duration,
    },
    Stopped,
}

/// Lifecycle and loop driver.
pub struct Engine<C: Clock = SystemClock> {
    ctx: Context,
    scheduler: Scheduler,
    plugins: PluginStore,
    clock: C,
    config: EngineConfig,
    state: State,
    prepared: bool,
    phases: Signal<Phase>,
}

impl Engine<SystemClock> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl Default for Engine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Engine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Self {
        Self {
            ctx: Context::new(),
            scheduler: Scheduler::new(),
            plugins: PluginStore::new(),
            clock,
            config,
            state: State::Idle,
            prepared: false,
            phases: Signal::with_history_limit(1),
        }
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn world(&self) -> &World {
        &self.ctx.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.ctx.world
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Register `system` under `phase`. It takes part in the next pass of
    /// that phase.
    pub fn add_system(&mut self, phase: Phase, system: System) -> SystemId {
        let id = self.ctx.add_system(phase, system);
        self.scheduler.absorb(&mut self.ctx);
        id
    }

    /// Permanently disable a system. `false` if the id is unknown.
    pub fn disable_system(&mut self, id: SystemId) -> bool {
        self.ctx.disable_system(id);
        self.scheduler.disable(id)
    }

    /// Register a plugin under a lifecycle phase (Prepare, Startup or Stop).
    pub fn add_plugin(
        &mut self,
        phase: Phase,
        plugin: impl Plugin + 'static,
        timing: Timing,
    ) -> Result<()> {
        self.plugins.add(phase, plugin, timing)
    }

    // ── Phase notifications ─────────────────────────────────────────────

    /// Signal set after every completed pass, carrying its phase.
    pub fn phases(&self) -> &Signal<Phase> {
        &self.phases
    }

    /// Signal notified after each completed pass of `phase`.
    ///
    /// ```ignore
    /// engine.when(Phase::FixedUpdate).subscribe(|_| frames.set(frames.get() + 1), false);
    /// ```
    pub fn when(&self, phase: Phase) -> Signal<Phase> {
        self.phases.filter(move |current| *current == phase)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Start the loop at `fps` FixedUpdates per second without blocking.
    ///
    /// If the loop is already running it is stopped first. Prepare runs on
    /// the first start only; Startup runs on every start. Drive the loop with
    /// [`tick`](Self::tick), or use [`run`](Self::run) to block.
    pub fn start(&mut self, fps: f64) -> Result<()> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(EcsError::InvalidFrameRate(fps));
        }
        if self.is_running() {
            log::info!("restarting loop");
            self.stop()?;
        } else if !self.prepared {
            self.run_lifecycle(Phase::Prepare)?;
            self.prepared = true;
        }
        self.reset_time()?;
        self.run_lifecycle(Phase::Startup)?;

        let period = EngineConfig::frame_period(fps);
        let interval = self.config.sample_interval();
        if interval >= period {
            log::warn!(
                "sample interval {interval:?} is not finer than the frame period {period:?}; \
                 FixedUpdate will drift"
            );
        }
        let now = self.clock.now();
        self.state = State::Running {
            period,
            started: now,
            last_tick: now,
            last_fixed: now,
        };
        log::info!("loop started at {fps} fps (sampling every {interval:?})");
        self.honor_stop_request()
    }

    /// Run one sampling tick: Update always, FixedUpdate when a frame period
    /// has passed since the last one. Does nothing unless running.
    pub fn tick(&mut self) -> Result<()> {
        let State::Running {
            period,
            started,
            last_tick,
            mut last_fixed,
        } = self.state
        else {
            return Ok(());
        };
        let now = self.clock.now();

        if let Ok(mut time) = self.ctx.world.resource_mut::<Time>() {
            time.record_update(now.saturating_sub(last_tick), now.saturating_sub(started));
        }
        self.run_pass(Phase::Update)?;

        let since_fixed = now.saturating_sub(last_fixed);
        if since_fixed >= period {
            if let Ok(mut time) = self.ctx.world.resource_mut::<Time>() {
                time.record_fixed_update(since_fixed);
            }
            self.run_pass(Phase::FixedUpdate)?;
            last_fixed = now;
        }

        self.state = State::Running {
            period,
            started,
            last_tick: now,
            last_fixed,
        };
        self.honor_stop_request()
    }

    /// Start the loop and block until it stops, sleeping one sample interval
    /// between ticks. A failing system stops the engine and its error is
    /// returned.
    pub fn run(&mut self, fps: f64) -> Result<()> {
        self.start(fps)?;
        let interval = self.config.sample_interval();
        while self.is_running() {
            self.clock.sleep(interval);
            if let Err(err) = self.tick() {
                log::error!("loop aborted: {err}");
                if let Err(stop_err) = self.stop() {
                    log::error!("stop after abort failed: {stop_err}");
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// [`run`](Self::run) at the configured target frame rate.
    pub fn run_configured(&mut self) -> Result<()> {
        self.run(self.config.target_fps)
    }

    /// Halt the loop, then build the Stop plugins and run the Stop systems.
    /// Does nothing unless running.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.state = State::Stopped;
        log::info!("loop stopped");
        self.run_lifecycle(Phase::Stop)
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn run_lifecycle(&mut self, phase: Phase) -> Result<()> {
        self.plugins.build(phase, &mut self.ctx)?;
        self.run_pass(phase)
    }

    fn run_pass(&mut self, phase: Phase) -> Result<()> {
        self.scheduler.execute(phase, &mut self.ctx)?;
        self.phases.set(phase);
        self.phases.flush();
        Ok(())
    }

    fn reset_time(&mut self) -> Result<()> {
        let world = &mut self.ctx.world;
        if world.has_resource::<Time>() {
            world.resource_mut::<Time>()?.reset();
            Ok(())
        } else {
            world.insert_resource(Time::default())
        }
    }

    fn honor_stop_request(&mut self) -> Result<()> {
        if self.ctx.take_stop_request() {
            self.stop()?;
        }
        Ok(())
    }

    /// Loop counters, entity pool statistics and the timings of the most
    /// recent pass of every phase. Resets the per-tick entity counters.
    #[cfg(feature = "diagnostics")]
    pub fn diagnostics_snapshot(&mut self) -> crate::diag::EngineSnapshot {
        use crate::diag::{EngineSnapshot, SystemTimingSnapshot};

        let time = self
            .ctx
            .world
            .resource::<Time>()
            .map(|time| *time)
            .unwrap_or_default();
        let systems = Phase::ALL
            .iter()
            .flat_map(|&phase| {
                self.scheduler
                    .timings(phase)
                    .iter()
                    .map(move |timing| SystemTimingSnapshot {
                        phase: format!("{phase:?}"),
                        name: timing.name.clone(),
                        duration_us: timing.duration_us,
                    })
            })
            .collect();
        EngineSnapshot {
            updates: time.updates(),
            fixed_updates: time.fixed_updates(),
            elapsed_secs: time.elapsed().as_secs_f64(),
            entities: self.ctx.world.diagnostics_entity_stats(),
            resources: self.ctx.world.resources().len(),
            systems,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::ecs::lineage::Component;
    use crate::ecs::query::{Filter, Query};
    use crate::time::ManualClock;

    struct Health(i32);
    impl Component for Health {}

    fn engine() -> (Engine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = EngineConfig {
            target_fps: 10.0,
            sample_interval_ms: 10,
        };
        (Engine::with_clock(config, clock.clone()), clock)
    }

    fn counter(engine: &mut Engine<ManualClock>, phase: Phase) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        engine.add_system(
            phase,
            System::new(Query::new(), move |_, _, _| {
                seen.set(seen.get() + 1);
                Ok(())
            }),
        );
        count
    }

    #[test]
    fn update_every_tick_fixed_update_at_frame_rate() {
        let (mut engine, clock) = engine();
        let updates = counter(&mut engine, Phase::Update);
        let fixed = counter(&mut engine, Phase::FixedUpdate);

        engine.start(10.0).unwrap();
        for _ in 0..25 {
            clock.advance(Duration::from_millis(10));
            engine.tick().unwrap();
        }

        assert_eq!(updates.get(), 25);
        assert_eq!(fixed.get(), 2);
        let time = *engine.world().resource::<Time>().unwrap();
        assert_eq!(time.updates(), 25);
        assert_eq!(time.fixed_updates(), 2);
        assert_eq!(time.delta(), Duration::from_millis(10));
        assert_eq!(time.fixed_delta(), Duration::from_millis(100));
        assert_eq!(time.elapsed(), Duration::from_millis(250));
    }

    #[test]
    fn fixed_update_does_not_burst_after_a_long_gap() {
        let (mut engine, clock) = engine();
        let fixed = counter(&mut engine, Phase::FixedUpdate);
        engine.start(10.0).unwrap();

        clock.advance(Duration::from_millis(550));
        engine.tick().unwrap();
        assert_eq!(fixed.get(), 1);

        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        assert_eq!(fixed.get(), 1);
    }

    #[test]
    fn run_blocks_until_a_system_stops_the_loop() {
        let (mut engine, clock) = engine();
        let fixed = counter(&mut engine, Phase::FixedUpdate);
        engine.add_system(
            Phase::Update,
            System::new(Query::new(), |_, _, ctx| {
                if ctx.world.resource::<Time>()?.updates() >= 25 {
                    ctx.stop();
                }
                Ok(())
            }),
        );

        engine.run_configured().unwrap();
        assert!(!engine.is_running());
        assert_eq!(fixed.get(), 2);
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn prepare_once_startup_every_start() {
        let (mut engine, _clock) = engine();
        let prepare = counter(&mut engine, Phase::Prepare);
        let startup = counter(&mut engine, Phase::Startup);
        let stop = counter(&mut engine, Phase::Stop);

        engine.start(10.0).unwrap();
        engine.start(10.0).unwrap();
        assert_eq!(prepare.get(), 1);
        assert_eq!(startup.get(), 2);
        assert_eq!(stop.get(), 1);
        assert!(engine.is_running());

        engine.stop().unwrap();
        engine.start(20.0).unwrap();
        assert_eq!(prepare.get(), 1);
        assert_eq!(startup.get(), 3);
        assert_eq!(stop.get(), 2);
    }

    #[test]
    fn plugins_build_in_timing_order_before_systems() {
        let (mut engine, _clock) = engine();
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&order);
        engine
            .add_plugin(
                Phase::Prepare,
                move |_: &mut Context| -> Result<()> {
                    log.borrow_mut().push("late");
                    Ok(())
                },
                5,
            )
            .unwrap();
        let log = Rc::clone(&order);
        engine
            .add_plugin(
                Phase::Prepare,
                move |ctx: &mut Context| -> Result<()> {
                    log.borrow_mut().push("early");
                    let log = Rc::clone(&log);
                    ctx.add_system(
                        Phase::Prepare,
                        System::new(Query::new(), move |_, _, _| {
                            log.borrow_mut().push("system");
                            Ok(())
                        }),
                    );
                    Ok(())
                },
                1,
            )
            .unwrap();

        engine.start(10.0).unwrap();
        assert_eq!(*order.borrow(), vec!["early", "late", "system"]);
    }

    #[test]
    fn plugins_cannot_target_loop_phases() {
        let (mut engine, _clock) = engine();
        let err = engine.add_plugin(Phase::Update, |_: &mut Context| Ok::<(), EcsError>(()), 0);
        assert_eq!(err, Err(EcsError::UnknownSchedulePhase(Phase::Update)));
    }

    #[test]
    fn invalid_frame_rates_are_rejected() {
        let (mut engine, _clock) = engine();
        assert_eq!(engine.start(0.0), Err(EcsError::InvalidFrameRate(0.0)));
        assert_eq!(engine.start(-5.0), Err(EcsError::InvalidFrameRate(-5.0)));
        assert!(matches!(
            engine.start(f64::NAN),
            Err(EcsError::InvalidFrameRate(_))
        ));
        assert!(!engine.is_running());
    }

    #[test]
    fn phase_signals_follow_the_loop() {
        let (mut engine, clock) = engine();
        let fixed_passes = Rc::new(Cell::new(0));
        let seen = Rc::clone(&fixed_passes);
        engine
            .when(Phase::FixedUpdate)
            .subscribe(move |_| seen.set(seen.get() + 1), false);

        engine.start(10.0).unwrap();
        assert_eq!(engine.phases().get(), Some(Phase::Startup));
        for _ in 0..10 {
            clock.advance(Duration::from_millis(10));
            engine.tick().unwrap();
        }
        assert_eq!(fixed_passes.get(), 1);
        assert_eq!(engine.phases().get(), Some(Phase::FixedUpdate));
        assert_eq!(engine.phases().history().len(), 1);

        engine.stop().unwrap();
        assert_eq!(engine.phases().get(), Some(Phase::Stop));
    }

    #[test]
    fn stop_builds_stop_plugins_and_halts_ticks() {
        let (mut engine, clock) = engine();
        let updates = counter(&mut engine, Phase::Update);
        engine
            .add_plugin(
                Phase::Stop,
                |ctx: &mut Context| ctx.world.insert_resource(Health(0)),
                0,
            )
            .unwrap();

        engine.start(10.0).unwrap();
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        engine.stop().unwrap();
        assert!(engine.world().has_resource::<Health>());

        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        assert_eq!(updates.get(), 1);
        // Stopping twice is harmless.
        engine.stop().unwrap();
    }

    #[test]
    fn failing_system_aborts_run() {
        let (mut engine, _clock) = engine();
        let stop = counter(&mut engine, Phase::Stop);
        engine.add_system(
            Phase::FixedUpdate,
            System::new(
                Query::new().bundle([Filter::of::<Health>()]),
                |_, _, ctx| {
                    ctx.world.insert_resource(7u32)?;
                    ctx.world.insert_resource(8u32)
                },
            ),
        );

        let err = engine.run(10.0);
        assert_eq!(err, Err(EcsError::DuplicateResource("u32")));
        assert!(!engine.is_running());
        assert_eq!(stop.get(), 1);
    }

    #[test]
    fn disabled_systems_stay_off() {
        let (mut engine, clock) = engine();
        let updates = Rc::new(Cell::new(0));
        let seen = Rc::clone(&updates);
        let id = engine.add_system(
            Phase::Update,
            System::new(Query::new(), move |_, _, _| {
                seen.set(seen.get() + 1);
                Ok(())
            }),
        );
        engine.start(10.0).unwrap();
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();

        assert!(engine.disable_system(id));
        assert_eq!(engine.scheduler().is_active(id), Some(false));
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        assert_eq!(updates.get(), 1);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn snapshot_reports_loop_counters() {
        let (mut engine, clock) = engine();
        counter(&mut engine, Phase::Update);
        engine.world_mut().spawn((Health(3),)).unwrap();
        engine.start(10.0).unwrap();
        for _ in 0..10 {
            clock.advance(Duration::from_millis(10));
            engine.tick().unwrap();
        }

        let snapshot = engine.diagnostics_snapshot();
        assert_eq!(snapshot.updates, 10);
        assert_eq!(snapshot.fixed_updates, 1);
        assert_eq!(snapshot.entities.alive_count, 1);
        assert_eq!(snapshot.resources, 1);
        assert!(snapshot.systems.iter().any(|s| s.phase == "Update"));
        assert!(snapshot.to_json().unwrap().contains("\"fixed_updates\":1"));
    }
}
