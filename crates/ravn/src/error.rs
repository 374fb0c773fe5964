//! # Errors
//!
//! Every failure the runtime can report is a variant of [`EcsError`]. They are
//! all *programming* errors: adding a component twice, registering the same
//! resource type twice, asking for a resource nobody registered. Nothing is
//! retried internally. The failing call returns `Err` and leaves every index it
//! would have touched untouched.
//!
//! ```ignore
//! match world.insert(enemy, Health(100)) {
//!     Ok(()) => {}
//!     Err(EcsError::DuplicateComponent { component, .. }) => {
//!         log::warn!("enemy already had {component}");
//!     }
//!     Err(other) => return Err(other),
//! }
//! ```

use thiserror::Error;

use crate::ecs::entity::Entity;
use crate::ecs::system::Phase;

/// Errors raised by the world, queries, the scheduler and the loop driver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EcsError {
    /// An entity already owns an instance of this concrete component type.
    #[error("entity {entity} already has a `{component}` component")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },

    /// A spawn bundle lists the same component type more than once.
    #[error("spawn bundle contains `{0}` more than once")]
    DuplicateComponentInBundle(&'static str),

    /// A resource of this type is already registered.
    #[error("resource `{0}` is already registered")]
    DuplicateResource(&'static str),

    /// The resource was requested but never registered (or was unregistered).
    #[error("resource `{0}` is not loaded")]
    ResourceNotLoaded(&'static str),

    /// The resource exists but is currently borrowed in a conflicting way.
    #[error("resource `{0}` is already borrowed")]
    ResourceBorrowed(&'static str),

    /// A query already has its resource set; it can only be attached once.
    #[error("query already has a resource set attached")]
    DuplicateResourceSetOnQuery,

    /// A resource set names the same resource type twice.
    #[error("resource `{0}` appears more than once in a resource set")]
    ResourceSetNotUnique(&'static str),

    /// Plugins can only be registered under Prepare, Startup and Stop.
    #[error("plugins cannot be registered under the {0:?} phase")]
    UnknownSchedulePhase(Phase),

    /// The entity handle refers to a despawned (possibly recycled) slot.
    #[error("entity {0} is not alive")]
    StaleEntity(Entity),

    /// The loop driver needs a positive, finite frame rate.
    #[error("invalid frame rate {0}: expected a positive, finite value")]
    InvalidFrameRate(f64),
}

/// Shorthand used across the crate.
pub type Result<T, E = EcsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_type() {
        let err = EcsError::DuplicateResource("Canvas");
        assert_eq!(err.to_string(), "resource `Canvas` is already registered");

        let err = EcsError::UnknownSchedulePhase(Phase::FixedUpdate);
        assert_eq!(
            err.to_string(),
            "plugins cannot be registered under the FixedUpdate phase"
        );
    }
}
