//! # Ravn — Capability-Aware ECS Runtime
//!
//! An entity-component-system runtime with a phase-based loop driver,
//! capability queries over a component type graph, and push-based reactive
//! signals.
//!
//! Start with `use ravn::prelude::*`, register plugins and systems on an
//! [`Engine`](engine::Engine), then [`run`](engine::Engine::run) it.

pub mod config;
pub mod context;
pub mod diag;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod prelude;
pub mod render;
pub mod signal;
pub mod time;
