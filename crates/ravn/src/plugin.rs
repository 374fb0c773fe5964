//! Plugins — ordered setup callbacks per lifecycle phase.
//!
//! A plugin adds resources, entities and systems to the engine. Each one is
//! registered under a lifecycle phase ([`Phase::Prepare`], [`Phase::Startup`]
//! or [`Phase::Stop`]) with a timing: lower timings build first, equal timings
//! build in registration order. Every plugin builds once; the list of a phase
//! is emptied after it has been built.
//!
//! ```ignore
//! struct EconomyPlugin;
//!
//! impl Plugin for EconomyPlugin {
//!     fn build(&self, ctx: &mut Context) -> Result<()> {
//!         ctx.world.insert_resource(Gold(100))?;
//!         ctx.add_system(Phase::FixedUpdate, System::new(income_query(), income));
//!         Ok(())
//!     }
//! }
//!
//! engine.add_plugin(Phase::Prepare, EconomyPlugin, 0)?;
//! ```

use std::collections::HashMap;

use crate::context::Context;
use crate::ecs::system::Phase;
use crate::error::{EcsError, Result};

/// Setup logic run once at a lifecycle phase.
pub trait Plugin {
    fn build(&self, ctx: &mut Context) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Blanket impl: any `Fn(&mut Context) -> Result<()>` is a `Plugin`.
impl<F: Fn(&mut Context) -> Result<()>> Plugin for F {
    fn build(&self, ctx: &mut Context) -> Result<()> {
        (self)(ctx)
    }
}

/// A plugin position in its phase. Lower builds first.
pub type Timing = i32;

struct Registered {
    timing: Timing,
    plugin: Box<dyn Plugin>,
}

/// Plugins grouped by lifecycle phase, sorted by timing.
pub struct PluginStore {
    lists: HashMap<Phase, Vec<Registered>>,
}

impl PluginStore {
    /// Phases plugins can be registered under.
    pub const PHASES: [Phase; 3] = [Phase::Prepare, Phase::Startup, Phase::Stop];

    pub fn new() -> Self {
        Self {
            lists: Self::PHASES
                .into_iter()
                .map(|phase| (phase, Vec::new()))
                .collect(),
        }
    }

    /// Register `plugin` under `phase`. Fails with
    /// [`EcsError::UnknownSchedulePhase`] for Update and FixedUpdate.
    pub fn add(&mut self, phase: Phase, plugin: impl Plugin + 'static, timing: Timing) -> Result<()> {
        let list = self
            .lists
            .get_mut(&phase)
            .ok_or(EcsError::UnknownSchedulePhase(phase))?;
        let at = list
            .iter()
            .position(|registered| registered.timing > timing)
            .unwrap_or(list.len());
        list.insert(
            at,
            Registered {
                timing,
                plugin: Box::new(plugin),
            },
        );
        Ok(())
    }

    /// Build every plugin of `phase` in timing order, then empty the list.
    /// Stops at the first error.
    pub fn build(&mut self, phase: Phase, ctx: &mut Context) -> Result<()> {
        let Some(list) = self.lists.get_mut(&phase) else {
            return Ok(());
        };
        for registered in std::mem::take(list) {
            log::debug!(
                "building plugin `{}` ({phase:?}, timing {})",
                registered.plugin.name(),
                registered.timing
            );
            registered.plugin.build(ctx)?;
        }
        Ok(())
    }

    /// Plugins waiting to build under `phase`.
    pub fn len(&self, phase: Phase) -> usize {
        self.lists.get(&phase).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.lists.values().all(Vec::is_empty)
    }
}

impl Default for PluginStore {
    fn default() -> Self {
        Self::new()
    }
}
