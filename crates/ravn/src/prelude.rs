//! Convenience re-exports — `use ravn::prelude::*` for the common items.

pub use crate::config::{ConfigError, EngineConfig};
pub use crate::context::Context;
pub use crate::diag::init_logger;
pub use crate::ecs::{
    BoundResources, Bundle, Capability, Component, Entity, Filter, Lineage, Matches, Phase,
    Query, Root, System, SystemId, TypeKey, World,
};
pub use crate::engine::Engine;
pub use crate::error::{EcsError, Result};
pub use crate::plugin::{Plugin, Timing};
pub use crate::render::{Canvas, DrawCommand, DrawPlugin, Drawable, RecordingSurface, Rgba, Surface};
pub use crate::signal::{Signal, Subscription};
pub use crate::time::{Clock, ManualClock, SystemClock, Time};
#[cfg(feature = "diagnostics")]
pub use crate::diag::EngineSnapshot;
