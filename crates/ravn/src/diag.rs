//! Diagnostics — logger setup and engine snapshots.
//!
//! [`init_logger`] wires the `log` facade to `env_logger` so the runtime's
//! `log::debug!`/`info!`/`warn!` output reaches stderr. Filtering follows
//! `RUST_LOG`; without it, `Info` and above pass.
//!
//! With the `diagnostics` feature (on by default) the engine can also produce
//! an [`EngineSnapshot`]: entity pool counters and the per-system timings of
//! the most recent pass of each phase, serializable to JSON.

#[cfg(feature = "diagnostics")]
use serde::Serialize;

/// Install `env_logger` as the global logger. Safe to call more than once;
/// later calls (or an already-installed logger) are left alone.
pub fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already installed; keeping it");
    }
}

/// Entity pool statistics gathered by [`World::diagnostics_entity_stats`].
///
/// [`World::diagnostics_entity_stats`]: crate::ecs::world::World::diagnostics_entity_stats
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityPoolStats {
    pub total_slots: u32,
    pub free_count: usize,
    pub alive_count: usize,
    /// Concrete component types that have had a storage created.
    pub component_types: usize,
    pub spawned_this_tick: u32,
    pub despawned_this_tick: u32,
}

/// Timing of one system in the most recent pass of its phase.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Serialize)]
pub struct SystemTimingSnapshot {
    pub phase: String,
    pub name: String,
    pub duration_us: f64,
}

/// Everything the engine reports about itself at one point in time.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub updates: u64,
    pub fixed_updates: u64,
    pub elapsed_secs: f64,
    pub entities: EntityPoolStats,
    pub resources: usize,
    pub systems: Vec<SystemTimingSnapshot>,
}

#[cfg(feature = "diagnostics")]
impl EngineSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
