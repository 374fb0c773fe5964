//! Context — the handle passed to every system callback and plugin.
//!
//! [`Context`] owns the [`World`] and collects the requests a callback can make
//! of the loop: register more systems, disable a system, stop the engine.
//! Requests are queued here and applied by the [`Scheduler`] and the
//! [`Engine`](crate::engine::Engine) once the current call returns.
//!
//! [`Scheduler`]: crate::ecs::system::Scheduler

use std::collections::HashSet;

use crate::ecs::entity::Entity;
use crate::ecs::query::{BoundResources, Matches, Query};
use crate::ecs::system::{Phase, System, SystemId};
use crate::ecs::world::{SpawnBundle, World};
use crate::error::Result;

/// World access plus the loop-level requests systems and plugins can make.
///
/// # Example
///
/// ```ignore
/// fn setup(ctx: &mut Context) -> Result<()> {
///     ctx.world.insert_resource(Gold(100))?;
///     ctx.spawn((Position { x: 0.0, y: 0.0 }, Health(10)))?;
///     ctx.add_system(Phase::Update, System::new(movers(), move_system));
///     Ok(())
/// }
/// ```
pub struct Context {
    /// The ECS world. Mutate freely.
    pub world: World,
    pending: Vec<(Phase, SystemId, System)>,
    next_id: u64,
    disabled: HashSet<SystemId>,
    current: Option<SystemId>,
    stop_requested: bool,
}

impl Context {
    pub fn new() -> Self {
        Self::with_world(World::new())
    }

    pub fn with_world(world: World) -> Self {
        Self {
            world,
            pending: Vec::new(),
            next_id: 0,
            disabled: HashSet::new(),
            current: None,
            stop_requested: false,
        }
    }

    /// Shorthand for `ctx.world.spawn(bundle)`.
    pub fn spawn<B: SpawnBundle>(&mut self, bundle: B) -> Result<Entity> {
        self.world.spawn(bundle)
    }

    /// Register `system` under `phase`. It runs from the next pass of that
    /// phase onward.
    pub fn add_system(&mut self, phase: Phase, system: System) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id += 1;
        self.pending.push((phase, id, system));
        id
    }

    /// Permanently disable a system. Takes effect before its next run; a
    /// system disabling itself finishes the current call.
    pub fn disable_system(&mut self, id: SystemId) {
        self.disabled.insert(id);
    }

    pub fn is_disabled(&self, id: SystemId) -> bool {
        self.disabled.contains(&id)
    }

    /// The system whose callback is running, if any.
    pub fn current_system(&self) -> Option<SystemId> {
        self.current
    }

    /// Execute an ad-hoc query against the world.
    pub fn query(&self, query: &mut Query) -> Result<(Matches, BoundResources)> {
        query.execute(&self.world)
    }

    /// Ask the engine to stop once the current phase finishes.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub(crate) fn take_stop_request(&mut self) -> bool {
        std::mem::take(&mut self.stop_requested)
    }

    pub(crate) fn drain_pending(&mut self) -> Vec<(Phase, SystemId, System)> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn set_current(&mut self, id: Option<SystemId>) {
        self.current = id;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
