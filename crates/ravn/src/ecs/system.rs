//! # System — A Query Bound to a Callback
//!
//! A system pairs one [`Query`] with one callback. Every time its phase runs,
//! the query is executed against the current world and the callback receives
//! the fresh matches, the bound resources, and the [`Context`]:
//!
//! ```ignore
//! let regen = System::new(
//!     Query::new().bundle([Filter::of::<Health>()]),
//!     |matches, _resources, ctx| {
//!         for &e in &matches[0] {
//!             if let Some(h) = ctx.world.get_mut::<Health>(e) {
//!                 h.0 += 1;
//!             }
//!         }
//!         Ok(())
//!     },
//! );
//! engine.add_system(Phase::Update, regen);
//! ```
//!
//! ## Scheduler
//!
//! The [`Scheduler`] keeps one list of systems per [`Phase`] and runs them in
//! the order they were registered. There is no snapshot isolation between
//! systems: whatever one system changes, the next one's query sees.
//!
//! Systems registered while a pass is running are queued on the context and
//! join their phase at the start of its next pass. Disabling is permanent;
//! there is no way to re-enable a system.
//!
//! ## Comparison
//!
//! - **hecs**: no built-in systems or schedules.
//! - **bevy_ecs**: `SystemParam` injection, parallel execution with conflict
//!   detection, run conditions... much more.
//! - **ravn**: one query, one callback, one phase, sequential.

use std::collections::HashMap;

use super::query::{BoundResources, Matches, Query};
use crate::context::Context;
use crate::error::Result;

/// A stage of the loop. Each system is registered into exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Runs once, on the first start.
    Prepare,
    /// Runs on every start, after Prepare.
    Startup,
    /// Runs on every sampling tick.
    Update,
    /// Runs at most once per tick, at the target frame rate.
    FixedUpdate,
    /// Runs once when the loop stops.
    Stop,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Prepare,
        Phase::Startup,
        Phase::Update,
        Phase::FixedUpdate,
        Phase::Stop,
    ];
}

/// Handle returned when a system is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub(crate) u64);

type Callback = Box<dyn FnMut(&Matches, &BoundResources, &mut Context) -> Result<()>>;

/// A query and the callback that consumes its results.
pub struct System {
    name: String,
    query: Query,
    callback: Callback,
    active: bool,
}

impl System {
    pub fn new<F>(query: Query, callback: F) -> Self
    where
        F: FnMut(&Matches, &BoundResources, &mut Context) -> Result<()> + 'static,
    {
        Self {
            name: short_system_name(std::any::type_name::<F>()),
            query,
            callback: Box::new(callback),
            active: true,
        }
    }

    /// Override the name used in logs and timings.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Permanently switch the system off.
    pub fn disable(&mut self) {
        self.active = false;
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

struct Scheduled {
    id: SystemId,
    system: System,
}

/// Per-system timing recorded during the most recent pass of a phase.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// Systems grouped by phase, in registration order.
#[derive(Default)]
pub struct Scheduler {
    phases: HashMap<Phase, Vec<Scheduled>>,
    #[cfg(feature = "diagnostics")]
    timings: HashMap<Phase, Vec<SystemTiming>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move systems queued on the context into their phases.
    pub fn absorb(&mut self, ctx: &mut Context) {
        for (phase, id, system) in ctx.drain_pending() {
            log::debug!("system `{}` registered under {phase:?}", system.name);
            self.phases
                .entry(phase)
                .or_default()
                .push(Scheduled { id, system });
        }
    }

    /// Run every active system of `phase`, in registration order.
    ///
    /// Each system's query is executed right before its callback, so it sees
    /// the effects of the systems before it. The first error stops the pass
    /// and is returned.
    pub fn execute(&mut self, phase: Phase, ctx: &mut Context) -> Result<()> {
        self.absorb(ctx);
        #[cfg(feature = "diagnostics")]
        let timings = {
            let timings = self.timings.entry(phase).or_default();
            timings.clear();
            timings
        };
        let Some(systems) = self.phases.get_mut(&phase) else {
            return Ok(());
        };

        for scheduled in systems.iter_mut() {
            if ctx.is_disabled(scheduled.id) {
                scheduled.system.active = false;
            }
            if !scheduled.system.active {
                continue;
            }
            #[cfg(feature = "diagnostics")]
            let start = std::time::Instant::now();

            let id = scheduled.id;
            let system = &mut scheduled.system;
            let result = match system.query.execute(&ctx.world) {
                Ok((matches, resources)) => {
                    ctx.set_current(Some(id));
                    let result = (system.callback)(&matches, &resources, ctx);
                    ctx.set_current(None);
                    result
                }
                Err(err) => Err(err),
            };

            #[cfg(feature = "diagnostics")]
            timings.push(SystemTiming {
                name: system.name.clone(),
                duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
            });

            if let Err(err) = result {
                log::error!("system `{}` failed during {phase:?}: {err}", system.name);
                return Err(err);
            }
            if ctx.is_disabled(id) {
                system.active = false;
            }
        }
        Ok(())
    }

    /// Permanently disable a system. `false` if the id is unknown.
    pub fn disable(&mut self, id: SystemId) -> bool {
        match self.find_mut(id) {
            Some(system) => {
                system.disable();
                true
            }
            None => false,
        }
    }

    /// `None` if the id is unknown.
    pub fn is_active(&self, id: SystemId) -> Option<bool> {
        self.phases
            .values()
            .flatten()
            .find(|scheduled| scheduled.id == id)
            .map(|scheduled| scheduled.system.active)
    }

    /// Number of systems registered under `phase`.
    pub fn len(&self, phase: Phase) -> usize {
        self.phases.get(&phase).map_or(0, Vec::len)
    }

    /// Names of the systems under `phase`, in execution order.
    pub fn names(&self, phase: Phase) -> Vec<&str> {
        self.phases
            .get(&phase)
            .map(|systems| systems.iter().map(|s| s.system.name()).collect())
            .unwrap_or_default()
    }

    /// Timings from the most recent pass of `phase`.
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self, phase: Phase) -> &[SystemTiming] {
        self.timings.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find_mut(&mut self, id: SystemId) -> Option<&mut System> {
        self.phases
            .values_mut()
            .flatten()
            .find(|scheduled| scheduled.id == id)
            .map(|scheduled| &mut scheduled.system)
    }
}

/// Keep only the last path segment of a callback's type name
/// (`my_game::spawn_wave` → `spawn_wave`, `{{closure}}` → `<closure>`).
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}
