//! # Resources — Singletons Keyed by Type
//!
//! Resources are "global" data that belongs to no entity: the clock, the
//! canvas, the player's gold. At most one instance of each type can be
//! registered at a time. Registering a second one is an error, not a silent
//! replace, because two plugins fighting over the same singleton is almost
//! always a wiring bug.
//!
//! ## Storage
//!
//! ```text
//! entries: { TypeId(Time):   ("Time",   Rc<RefCell<Time>>),
//!            TypeId(Canvas): ("Canvas", Rc<RefCell<Canvas>>) }
//! ```
//!
//! Each instance sits in its own `Rc<RefCell<_>>`. Queries that declare a
//! resource set clone the `Rc` on their first run and keep it (see
//! [`Query`](super::query::Query)), so an instance stays alive for as long as
//! any query bound to it, even after it is unregistered.

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use super::lineage::TypeKey;
use crate::error::{EcsError, Result};

/// A type-erased `Rc<RefCell<R>>`.
pub(crate) type ResourceHandle = Rc<dyn Any>;

struct ResourceEntry {
    key: TypeKey,
    cell: ResourceHandle,
}

/// Uniqueness-enforcing singleton store.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: HashMap<TypeId, ResourceEntry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value`. Fails with [`EcsError::DuplicateResource`] if an
    /// instance of `R` is already registered.
    pub fn insert<R: 'static>(&mut self, value: R) -> Result<()> {
        let key = TypeKey::of::<R>();
        if self.entries.contains_key(&key.id()) {
            return Err(EcsError::DuplicateResource(key.short_name()));
        }
        log::debug!("resource registered: {}", key.short_name());
        let cell: ResourceHandle = Rc::new(RefCell::new(value));
        self.entries.insert(key.id(), ResourceEntry { key, cell });
        Ok(())
    }

    /// Unregister `R`, freeing its slot. `false` if nothing was registered.
    pub fn remove<R: 'static>(&mut self) -> bool {
        let removed = self.entries.remove(&TypeId::of::<R>()).is_some();
        if removed {
            log::debug!("resource unregistered: {}", TypeKey::of::<R>().short_name());
        }
        removed
    }

    pub fn contains<R: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<R>())
    }

    /// Borrow `R`. Fails if it is not registered or is mutably borrowed.
    pub fn get<R: 'static>(&self) -> Result<Ref<'_, R>> {
        let entry = self.entry::<R>()?;
        borrow(&entry.cell, entry.key)
    }

    /// Mutably borrow `R`. Fails if it is not registered or already borrowed.
    pub fn get_mut<R: 'static>(&self) -> Result<RefMut<'_, R>> {
        let entry = self.entry::<R>()?;
        borrow_mut(&entry.cell, entry.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared handle to the instance registered under `key`, for binding.
    pub(crate) fn handle(&self, key: TypeKey) -> Result<ResourceHandle> {
        self.entries
            .get(&key.id())
            .map(|entry| Rc::clone(&entry.cell))
            .ok_or(EcsError::ResourceNotLoaded(key.short_name()))
    }

    fn entry<R: 'static>(&self) -> Result<&ResourceEntry> {
        self.entries
            .get(&TypeId::of::<R>())
            .ok_or_else(|| EcsError::ResourceNotLoaded(TypeKey::of::<R>().short_name()))
    }
}

pub(crate) fn borrow<R: 'static>(cell: &ResourceHandle, key: TypeKey) -> Result<Ref<'_, R>> {
    cell.downcast_ref::<RefCell<R>>()
        .ok_or(EcsError::ResourceNotLoaded(key.short_name()))?
        .try_borrow()
        .map_err(|_| EcsError::ResourceBorrowed(key.short_name()))
}

pub(crate) fn borrow_mut<R: 'static>(
    cell: &ResourceHandle,
    key: TypeKey,
) -> Result<RefMut<'_, R>> {
    cell.downcast_ref::<RefCell<R>>()
        .ok_or(EcsError::ResourceNotLoaded(key.short_name()))?
        .try_borrow_mut()
        .map_err(|_| EcsError::ResourceBorrowed(key.short_name()))
}
