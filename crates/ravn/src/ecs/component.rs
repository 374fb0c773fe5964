//! # Component Storage — One Column per Concrete Type
//!
//! Every concrete component type gets one [`ComponentStorage`]. It holds two
//! things side by side:
//!
//! ```text
//! ComponentStorage<Health>
//!   column: [Health(100), Health(40), Health(-1)]   ← every live instance
//!   owners: [e3,          e7,         e1        ]   ← who owns each row
//!   rows:   { e3: 0, e7: 1, e1: 2 }                  ← entity → row
//! ```
//!
//! `column` is the per-type instance set and `owners` is the inverted index:
//! "which entities have a `Health`?" is a slice read. Both change in the same
//! call, so they can never disagree.
//!
//! ## Why `Box<dyn Any>`?
//!
//! The world holds storages for types it only knows as a
//! [`TypeKey`](super::lineage::TypeKey). Each instance is boxed and recovered
//! with `downcast_ref`/`downcast_mut`. This trades cache locality for **zero
//! unsafe code**.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: archetype tables of raw bytes (`BlobVec`), lots of
//!   unsafe, fast iteration over component *combinations*.
//! - **ravn**: one boxed column per type plus an owner list. Intersections are
//!   done by the query engine over owner lists instead of by archetype layout.

use std::any::Any;
use std::collections::HashMap;

use super::entity::Entity;

pub(crate) type BoxedComponent = Box<dyn Any>;

/// All live instances of one concrete component type and their owners.
#[derive(Default)]
pub(crate) struct ComponentStorage {
    column: Vec<BoxedComponent>,
    owners: Vec<Entity>,
    rows: HashMap<Entity, usize>,
}

impl ComponentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` for `owner`. The caller has already checked that
    /// `owner` has no instance here.
    pub fn push(&mut self, owner: Entity, value: BoxedComponent) {
        debug_assert!(!self.rows.contains_key(&owner));
        self.rows.insert(owner, self.column.len());
        self.column.push(value);
        self.owners.push(owner);
    }

    /// Swap-remove `owner`'s instance and return it.
    pub fn take(&mut self, owner: Entity) -> Option<BoxedComponent> {
        let row = self.rows.remove(&owner)?;
        let value = self.column.swap_remove(row);
        self.owners.swap_remove(row);
        if let Some(&moved) = self.owners.get(row) {
            self.rows.insert(moved, row);
        }
        Some(value)
    }

    pub fn contains(&self, owner: Entity) -> bool {
        self.rows.contains_key(&owner)
    }

    pub fn get(&self, owner: Entity) -> Option<&dyn Any> {
        let row = *self.rows.get(&owner)?;
        Some(self.column[row].as_ref())
    }

    pub fn get_mut(&mut self, owner: Entity) -> Option<&mut dyn Any> {
        let row = *self.rows.get(&owner)?;
        Some(self.column[row].as_mut())
    }

    pub fn get_typed<T: 'static>(&self, owner: Entity) -> Option<&T> {
        self.get(owner)?.downcast_ref()
    }

    pub fn get_typed_mut<T: 'static>(&mut self, owner: Entity) -> Option<&mut T> {
        self.get_mut(owner)?.downcast_mut()
    }

    /// Entities owning an instance, in row order.
    pub fn owners(&self) -> &[Entity] {
        &self.owners
    }

    pub fn instances<T: 'static>(&self) -> impl Iterator<Item = &T> {
        self.column.iter().filter_map(|boxed| boxed.downcast_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }
}
