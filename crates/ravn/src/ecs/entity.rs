//! # Entity — Stable Handles With Recycled Ids
//!
//! An [`Entity`] owns nothing. The [`World`](super::world::World) maps each
//! entity to the components attached to it, and the per-type storages map
//! each component type back to its owners.
//!
//! ## Id Recycling
//!
//! Ids come from a counter plus a free list. Despawning an entity pushes its
//! slot onto the free list and the next spawn pops it again, so ids stay
//! dense even in worlds that churn through thousands of short-lived
//! entities. Reuse means a saved handle can outlive its entity:
//!
//! ```text
//! let tower = world.spawn(..)?;   // slot 5
//! let target = tower;             // kept by a turret
//! world.despawn(tower);           // slot 5 is vacant
//! let scout = world.spawn(..)?;   // slot 5 again
//! world.get::<Health>(target)     // must not be the scout's health
//! ```
//!
//! Every slot therefore carries a **generation** that is bumped on despawn.
//! A handle is only alive while its generation matches the slot's, so the
//! last lookup fails the liveness check instead of reading the scout.
//!
//! ```text
//! Entity(5:0)   handed out first
//! Entity(5:1)   same slot, after one despawn
//! ```

use std::fmt;

/// Copyable handle naming one entity of a [`World`](super::world::World).
///
/// Only the world creates entities ([`World::spawn`](super::world::World::spawn)).
/// A handle stays valid until the entity is despawned; after that every
/// lookup through it returns `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    /// Slot index. Recycled after despawn.
    pub(crate) index: u32,
    /// Bumped each time the slot is recycled.
    pub(crate) generation: u32,
}

impl Entity {
    /// The integer id of this entity. Ids are reused after despawn; pair it
    /// with [`generation`](Self::generation) when identity matters.
    pub fn id(self) -> u32 {
        self.index
    }

    /// How many times this entity's slot had been recycled when it was created.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({self})")
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}

/// Hands out entity ids and takes them back.
///
/// ```text
/// slots:  [0, 1, 0, 2, 0]   ← current generation of every slot ever used
/// vacant: [1, 3]            ← slots waiting for reuse, most recent last
/// ```
pub(crate) struct EntityAllocator {
    slots: Vec<u32>,
    vacant: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Reuse the most recently freed slot, or open a new one.
    pub fn allocate(&mut self) -> Entity {
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.slots.push(0);
                (self.slots.len() - 1) as u32
            }
        };
        Entity {
            index,
            generation: self.slots[index as usize],
        }
    }

    /// Retire `entity`'s slot. `false` if the handle was already stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(entity.index as usize)
            .filter(|generation| **generation == entity.generation)
        else {
            return false;
        };
        *slot = slot.wrapping_add(1);
        self.vacant.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots.get(entity.index as usize) == Some(&entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub(crate) fn free_count(&self) -> usize {
        self.vacant.len()
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub(crate) fn total_slots(&self) -> u32 {
        self.slots.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_count_up_from_zero() {
        let mut allocator = EntityAllocator::new();
        let ids: Vec<_> = (0..3).map(|_| allocator.allocate()).collect();
        assert!(ids.iter().map(|e| e.id()).eq(0..3));
        assert!(ids.iter().all(|e| e.generation() == 0));
    }

    #[test]
    fn freed_id_is_reused_by_next_allocation() {
        let mut allocator = EntityAllocator::new();
        let _e0 = allocator.allocate();
        let e1 = allocator.allocate();
        let _e2 = allocator.allocate();
        assert!(allocator.deallocate(e1));

        let reused = allocator.allocate();
        assert_eq!(reused.id(), 1);
        assert_eq!(reused.generation(), 1);
        assert_ne!(reused, e1);
    }

    #[test]
    fn free_list_is_last_in_first_out() {
        let mut allocator = EntityAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        allocator.deallocate(a);
        allocator.deallocate(b);
        assert_eq!(allocator.allocate().id(), b.id());
        assert_eq!(allocator.allocate().id(), a.id());
    }

    #[test]
    fn stale_handle_is_not_alive() {
        let mut allocator = EntityAllocator::new();
        let e0 = allocator.allocate();
        allocator.deallocate(e0);
        let _recycled = allocator.allocate();
        assert!(!allocator.is_alive(e0));
        assert!(!allocator.deallocate(e0));
    }

    #[test]
    fn counts_track_alive_and_free_slots() {
        let mut allocator = EntityAllocator::new();
        let first = allocator.allocate();
        allocator.allocate();
        assert_eq!(allocator.alive_count(), 2);
        allocator.deallocate(first);
        assert_eq!(
            (allocator.alive_count(), allocator.free_count(), allocator.total_slots()),
            (1, 1, 2)
        );
    }

    #[test]
    fn generation_wraps_at_the_top() {
        let mut allocator = EntityAllocator::new();
        allocator.allocate();
        allocator.slots[0] = u32::MAX;
        let worn = Entity {
            index: 0,
            generation: u32::MAX,
        };
        assert!(allocator.deallocate(worn));
        let next = allocator.allocate();
        assert_eq!((next.id(), next.generation()), (0, 0));
        assert!(!allocator.is_alive(worn));
    }

    #[test]
    fn display_shows_id_and_generation() {
        let e = Entity {
            index: 7,
            generation: 2,
        };
        assert_eq!(e.to_string(), "7:2");
        assert_eq!(format!("{e:?}"), "Entity(7:2)");
    }
}
