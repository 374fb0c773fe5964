//! # Capability-Aware ECS
//!
//! A small Entity Component System where queries can name *capabilities*
//! (`dyn Drawable`) as well as concrete component types. Storage is one column
//! per concrete type plus an inverted index from type to owners; there are no
//! archetypes.
//!
//! ## Module Overview
//!
//! - [`entity`] — Generational entity IDs
//! - [`lineage`] — Type keys, capabilities and the type graph
//! - `component` — Type-erased columnar storage (`Box<dyn Any>`)
//! - [`resource`] — Singleton values keyed by type
//! - [`world`] — Central container (entities + components + resources)
//! - [`query`] — Filters, bundles and resource sets
//! - [`system`] — Systems, phases and the scheduler

pub(crate) mod component;
pub mod entity;
pub mod lineage;
pub mod query;
pub mod resource;
pub mod system;
pub mod world;

pub use entity::Entity;
pub use lineage::{Capability, Component, Lineage, Root, TypeGraph, TypeKey};
pub use query::{BoundResources, Bundle, Filter, Matches, Query, TypeSet};
pub use resource::ResourceRegistry;
pub use system::{Phase, Scheduler, System, SystemId};
pub use world::{SpawnBundle, World};
