//! # World — Entities, Components, Resources
//!
//! The [`World`] is the store every system reads and writes: live entities,
//! their components, the capability graph, and the resource registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ World                                                    │
//! │                                                          │
//! │  EntityAllocator: generational id lifecycle              │
//! │                                                          │
//! │  records: HashMap<Entity, Vec<TypeKey>>                  │
//! │    per-entity list of the concrete types it owns         │
//! │                                                          │
//! │  storages: HashMap<TypeKey, ComponentStorage>            │
//! │    per-type instances + owning entities (inverted index) │
//! │                                                          │
//! │  graph: TypeGraph                                        │
//! │    capability → concrete types, for abstract queries     │
//! │                                                          │
//! │  resources: ResourceRegistry                             │
//! │    singleton data not tied to an entity                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation updates `records`, the matching storage and the graph in
//! the same call. A rejected call (duplicate component, stale entity) touches
//! none of them.
//!
//! ## Matching by filters
//!
//! [`World::query_filters`] resolves each filter to a candidate set: the
//! owners of exactly that type, or, when nobody owns it directly, the owners
//! of every type recorded below it in the graph. Sets are intersected left to
//! right and each filter's predicate narrows what survives.
//!
//! ## Comparison
//!
//! - **hecs**: archetypes only; no resources, no capability lookups.
//! - **bevy_ecs**: archetypes + sparse sets, resources, schedules, observers,
//!   hooks... much more.
//! - **ravn**: per-type sparse storages, a capability graph, and resources.

use std::any::Any;
use std::cell::{Ref, RefMut};
use std::collections::{HashMap, HashSet};

use super::component::ComponentStorage;
use super::entity::{Entity, EntityAllocator};
use super::lineage::{Component, TypeGraph, TypeKey};
use super::query::Filter;
use super::resource::ResourceRegistry;
use crate::error::{EcsError, Result};

/// The central container for all simulation state.
pub struct World {
    allocator: EntityAllocator,
    records: HashMap<Entity, Vec<TypeKey>>,
    storages: HashMap<TypeKey, ComponentStorage>,
    graph: TypeGraph,
    resources: ResourceRegistry,
    /// Number of entities spawned since the last stats snapshot.
    #[cfg(feature = "diagnostics")]
    spawned_this_tick: u32,
    /// Number of entities despawned since the last stats snapshot.
    #[cfg(feature = "diagnostics")]
    despawned_this_tick: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            records: HashMap::new(),
            storages: HashMap::new(),
            graph: TypeGraph::new(),
            resources: ResourceRegistry::new(),
            #[cfg(feature = "diagnostics")]
            spawned_this_tick: 0,
            #[cfg(feature = "diagnostics")]
            despawned_this_tick: 0,
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Register a resource. Fails with [`EcsError::DuplicateResource`] if one
    /// of the same type is already registered.
    pub fn insert_resource<R: 'static>(&mut self, value: R) -> Result<()> {
        self.resources.insert(value)
    }

    /// Unregister a resource. `false` if none was registered.
    pub fn remove_resource<R: 'static>(&mut self) -> bool {
        self.resources.remove::<R>()
    }

    /// Borrow a resource, or [`EcsError::ResourceNotLoaded`].
    pub fn resource<R: 'static>(&self) -> Result<Ref<'_, R>> {
        self.resources.get()
    }

    /// Mutably borrow a resource. Resources live in `RefCell`s, so this only
    /// needs `&self`; overlapping borrows fail with
    /// [`EcsError::ResourceBorrowed`].
    pub fn resource_mut<R: 'static>(&self) -> Result<RefMut<'_, R>> {
        self.resources.get_mut()
    }

    pub fn has_resource<R: 'static>(&self) -> bool {
        self.resources.contains::<R>()
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Concrete component types `entity` owns, in the order they were added.
    pub fn components_of(&self, entity: Entity) -> &[TypeKey] {
        self.records.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `entity` owns a `T`.
    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.storages
            .get(&TypeKey::of::<T>())
            .is_some_and(|storage| storage.contains(entity))
    }

    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.storages.get(&TypeKey::of::<T>())?.get_typed(entity)
    }

    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storages.get_mut(&TypeKey::of::<T>())?.get_typed_mut(entity)
    }

    /// The instance `entity` owns at `key`: the exact type if it has one,
    /// otherwise the first recorded descendant of `key` it owns.
    pub fn get_dyn(&self, entity: Entity, key: TypeKey) -> Option<&dyn Any> {
        let owned = self
            .candidate_types(key)
            .into_iter()
            .find(|candidate| self.owns(entity, *candidate))?;
        let component = self.storages.get(&owned)?.get(entity)?;
        Some(component as &dyn Any)
    }

    /// Borrow `entity`'s component as the capability `C`.
    ///
    /// Looks at an exact `C` first, then at every type recorded below `C`
    /// that declared how to be borrowed as one.
    ///
    /// ```ignore
    /// if let Some(drawable) = world.capability::<dyn Drawable>(entity) {
    ///     println!("layer {}", drawable.layer());
    /// }
    /// ```
    pub fn capability<C: ?Sized + 'static>(&self, entity: Entity) -> Option<&C> {
        let owned = self.castable_type::<C>(entity)?;
        let caster = self.graph.caster::<C>(owned.id())?;
        let component = self.storages.get(&owned)?.get(entity)?;
        caster.cast(component)
    }

    pub fn capability_mut<C: ?Sized + 'static>(&mut self, entity: Entity) -> Option<&mut C> {
        let owned = self.castable_type::<C>(entity)?;
        let caster = self.graph.caster::<C>(owned.id())?;
        let component = self.storages.get_mut(&owned)?.get_mut(entity)?;
        caster.cast_mut(component)
    }

    /// Entities owning exactly a `T`, in storage order.
    pub fn entities_with<T: 'static>(&self) -> Vec<Entity> {
        self.storages
            .get(&TypeKey::of::<T>())
            .map(|storage| storage.owners().to_vec())
            .unwrap_or_default()
    }

    /// Every live instance of exactly `T`.
    pub fn instances<T: 'static>(&self) -> impl Iterator<Item = &T> {
        self.storages
            .get(&TypeKey::of::<T>())
            .into_iter()
            .flat_map(|storage| storage.instances::<T>())
    }

    /// Types recorded below `key` in the capability graph.
    pub fn descendants_of(&self, key: TypeKey) -> Vec<TypeKey> {
        self.graph.descendants_of(key)
    }

    pub fn type_graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Entities satisfying every filter at once.
    ///
    /// The first filter seeds the result with its candidates; each later
    /// filter intersects it with its own. Any empty candidate set ends the
    /// search early. An empty filter list matches nothing.
    ///
    /// Results come out in the first filter's storage order, but callers
    /// should treat them as a set.
    pub fn query_filters(&self, filters: &[Filter]) -> Vec<Entity> {
        let Some((first, rest)) = filters.split_first() else {
            return Vec::new();
        };
        let mut matched = self.owners_at(first.key());
        matched.retain(|&entity| first.accepts(self, entity));

        for filter in rest {
            if matched.is_empty() {
                break;
            }
            let owners: HashSet<Entity> = self.owners_at(filter.key()).into_iter().collect();
            if owners.is_empty() {
                return Vec::new();
            }
            matched.retain(|&entity| owners.contains(&entity) && filter.accepts(self, entity));
        }
        matched
    }

    // ── Spawn / Despawn ──────────────────────────────────────────────

    /// A fresh entity that owns nothing yet.
    pub fn spawn_empty(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_tick += 1;
        }
        self.records.insert(entity, Vec::new());
        entity
    }

    /// Spawn an entity carrying every component of `bundle`.
    ///
    /// Fails without allocating anything if the bundle names a component type
    /// twice.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let e = world.spawn((Position { x: 0.0, y: 0.0 }, Health(100)))?;
    /// ```
    pub fn spawn<B: SpawnBundle>(&mut self, bundle: B) -> Result<Entity> {
        let keys = B::type_keys();
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(EcsError::DuplicateComponentInBundle(key.short_name()));
            }
        }
        let entity = self.spawn_empty();
        bundle.attach_to(self, entity);
        log::debug!("spawned {entity} with {keys:?}");
        Ok(entity)
    }

    /// Despawn an entity and drop all of its components. Returns `false` if
    /// the handle was already stale.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        let keys = self.records.remove(&entity).unwrap_or_default();
        for key in &keys {
            if let Some(storage) = self.storages.get_mut(key) {
                storage.take(entity);
            }
        }
        self.allocator.deallocate(entity);
        #[cfg(feature = "diagnostics")]
        {
            self.despawned_this_tick += 1;
        }
        log::debug!("despawned {entity} ({} components)", keys.len());
        true
    }

    // ── Component insert / remove ────────────────────────────────────

    /// Attach `component` to `entity`.
    ///
    /// Fails with [`EcsError::DuplicateComponent`] if the entity already owns
    /// a `T`, and with [`EcsError::StaleEntity`] if the entity was despawned.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity(entity));
        }
        if self.has::<T>(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: TypeKey::of::<T>().short_name(),
            });
        }
        self.attach(entity, component);
        Ok(())
    }

    /// Detach and return `entity`'s `T`. `None` if it had none.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let key = TypeKey::of::<T>();
        let boxed = self.storages.get_mut(&key)?.take(entity)?;
        if let Some(record) = self.records.get_mut(&entity) {
            record.retain(|owned| *owned != key);
        }
        boxed.downcast::<T>().ok().map(|component| *component)
    }

    fn attach<T: Component>(&mut self, entity: Entity, component: T) {
        let key = TypeKey::of::<T>();
        self.graph.record::<T>();
        self.storages
            .entry(key)
            .or_insert_with(ComponentStorage::new)
            .push(entity, Box::new(component));
        self.records.entry(entity).or_default().push(key);
    }

    // ── Internals ────────────────────────────────────────────────────

    fn owns(&self, entity: Entity, key: TypeKey) -> bool {
        self.storages
            .get(&key)
            .is_some_and(|storage| storage.contains(entity))
    }

    /// `key` itself followed by everything recorded below it.
    fn candidate_types(&self, key: TypeKey) -> Vec<TypeKey> {
        let mut types = vec![key];
        types.extend(self.graph.descendants_of(key));
        types
    }

    fn castable_type<C: ?Sized + 'static>(&self, entity: Entity) -> Option<TypeKey> {
        self.candidate_types(TypeKey::of::<C>())
            .into_iter()
            .find(|key| self.owns(entity, *key) && self.graph.caster::<C>(key.id()).is_some())
    }

    /// Direct owners of `key`, or, when there are none, the owners of every
    /// type recorded below it (each entity once).
    fn owners_at(&self, key: TypeKey) -> Vec<Entity> {
        if let Some(storage) = self.storages.get(&key).filter(|s| !s.is_empty()) {
            return storage.owners().to_vec();
        }
        let mut seen = HashSet::new();
        let mut owners = Vec::new();
        for descendant in self.graph.descendants_of(key) {
            if let Some(storage) = self.storages.get(&descendant) {
                owners.extend(storage.owners().iter().filter(|e| seen.insert(**e)));
            }
        }
        owners
    }

    /// Collect entity pool statistics and reset the per-tick counters.
    #[cfg(feature = "diagnostics")]
    pub fn diagnostics_entity_stats(&mut self) -> crate::diag::EntityPoolStats {
        let stats = crate::diag::EntityPoolStats {
            total_slots: self.allocator.total_slots(),
            free_count: self.allocator.free_count(),
            alive_count: self.allocator.alive_count(),
            component_types: self.storages.len(),
            spawned_this_tick: self.spawned_this_tick,
            despawned_this_tick: self.despawned_this_tick,
        };
        self.spawned_this_tick = 0;
        self.despawned_this_tick = 0;
        stats
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ── SpawnBundle ──────────────────────────────────────────────────────

/// Tuples of components that can be spawned together.
///
/// Implemented for `()` and tuples of up to 8 [`Component`]s.
pub trait SpawnBundle {
    fn type_keys() -> Vec<TypeKey>;
    /// Attach every component to `entity`. Duplicates were already ruled out.
    fn attach_to(self, world: &mut World, entity: Entity);
}

macro_rules! impl_spawn_bundle {
    ($($T:ident),*) => {
        impl<$($T: Component),*> SpawnBundle for ($($T,)*) {
            fn type_keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$T>()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn attach_to(self, world: &mut World, entity: Entity) {
                let ($($T,)*) = self;
                $(world.attach(entity, $T);)*
            }
        }
    };
}

impl_spawn_bundle!();
impl_spawn_bundle!(A);
impl_spawn_bundle!(A, B);
impl_spawn_bundle!(A, B, C);
impl_spawn_bundle!(A, B, C, D);
impl_spawn_bundle!(A, B, C, D, E);
impl_spawn_bundle!(A, B, C, D, E, F);
impl_spawn_bundle!(A, B, C, D, E, F, G);
impl_spawn_bundle!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::lineage::{Capability, Lineage, Root};

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    struct Marker;
    impl Component for Marker {}

    trait Shape {
        fn area(&self) -> f32;
        fn grow(&mut self);
    }
    impl Capability for dyn Shape {
        type Base = Root;
    }

    struct Square(f32);
    impl Shape for Square {
        fn area(&self) -> f32 {
            self.0 * self.0
        }
        fn grow(&mut self) {
            self.0 += 1.0;
        }
    }
    impl Component for Square {
        fn lineage(lineage: &mut Lineage<Self>) {
            lineage.extends::<dyn Shape>(|s| s, |s| s);
        }
    }

    struct Circle(f32);
    impl Shape for Circle {
        fn area(&self) -> f32 {
            3.0 * self.0 * self.0
        }
        fn grow(&mut self) {
            self.0 += 1.0;
        }
    }
    impl Component for Circle {
        fn lineage(lineage: &mut Lineage<Self>) {
            lineage.extends::<dyn Shape>(|s| s, |s| s);
        }
    }

    #[test]
    fn spawn_and_get() {
        let mut world = World::new();
        let e = world
            .spawn((Position { x: 1.0, y: 2.0 }, Health(100)))
            .unwrap();
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Health>(e), Some(&Health(100)));
        assert!(world.get::<Marker>(e).is_none());
        assert_eq!(world.entity_count(), 1);
        assert_eq!(
            world.components_of(e),
            &[TypeKey::of::<Position>(), TypeKey::of::<Health>()]
        );
    }

    #[test]
    fn spawn_rejects_repeated_type_without_allocating() {
        let mut world = World::new();
        let result = world.spawn((Health(1), Health(2)));
        assert_eq!(result, Err(EcsError::DuplicateComponentInBundle("Health")));
        assert_eq!(world.entity_count(), 0);
        assert!(world.entities_with::<Health>().is_empty());
    }

    #[test]
    fn insert_registers_everywhere_and_rejects_duplicates() {
        let mut world = World::new();
        let e = world.spawn_empty();
        world.insert(e, Health(10)).unwrap();
        assert_eq!(world.get::<Health>(e), Some(&Health(10)));
        assert_eq!(world.entities_with::<Health>(), vec![e]);
        assert!(world.has::<Health>(e));

        let err = world.insert(e, Health(20));
        assert_eq!(
            err,
            Err(EcsError::DuplicateComponent {
                entity: e,
                component: "Health"
            })
        );
        assert_eq!(world.get::<Health>(e), Some(&Health(10)));
        assert_eq!(world.instances::<Health>().count(), 1);
    }

    #[test]
    fn remove_component_updates_all_indices() {
        let mut world = World::new();
        let e = world.spawn((Health(5), Marker)).unwrap();
        assert_eq!(world.remove::<Health>(e), Some(Health(5)));
        assert!(world.remove::<Health>(e).is_none());
        assert!(world.entities_with::<Health>().is_empty());
        assert_eq!(world.instances::<Health>().count(), 0);
        assert_eq!(world.components_of(e), &[TypeKey::of::<Marker>()]);
    }

    #[test]
    fn despawn_removes_from_every_index() {
        let mut world = World::new();
        let a = world.spawn((Health(1), Marker)).unwrap();
        let b = world.spawn((Health(2),)).unwrap();
        assert!(world.despawn(a));
        assert!(!world.despawn(a));

        assert_eq!(world.entities_with::<Health>(), vec![b]);
        assert!(world.entities_with::<Marker>().is_empty());
        assert_eq!(world.instances::<Health>().map(|h| h.0).collect::<Vec<_>>(), vec![2]);
        assert!(world.query_filters(&[Filter::of::<Marker>()]).is_empty());
        assert!(world.components_of(a).is_empty());
    }

    #[test]
    fn recycled_id_does_not_alias_stale_handle() {
        let mut world = World::new();
        let old = world.spawn((Health(1),)).unwrap();
        world.despawn(old);
        let new = world.spawn((Health(2),)).unwrap();
        assert_eq!(old.id(), new.id());
        assert!(world.get::<Health>(old).is_none());
        assert!(!world.is_alive(old));
        assert_eq!(world.insert(old, Marker), Err(EcsError::StaleEntity(old)));
        assert!(!world.has::<Marker>(new));
    }

    #[test]
    fn query_intersects_filters() {
        let mut world = World::new();
        let both = world
            .spawn((Position { x: 0.0, y: 0.0 }, Health(100)))
            .unwrap();
        let _pos_only = world.spawn((Position { x: 1.0, y: 1.0 },)).unwrap();
        let _health_only = world.spawn((Health(3),)).unwrap();

        let matched = world.query_filters(&[Filter::of::<Position>(), Filter::of::<Health>()]);
        assert_eq!(matched, vec![both]);
    }

    #[test]
    fn query_short_circuits_on_unknown_type() {
        let mut world = World::new();
        world.spawn((Health(1),)).unwrap();
        assert!(world.query_filters(&[Filter::of::<Health>(), Filter::of::<Marker>()]).is_empty());
        assert!(world.query_filters(&[]).is_empty());
    }

    #[test]
    fn predicate_narrows_within_type() {
        let mut world = World::new();
        let alive = world.spawn((Health(100),)).unwrap();
        let dead = world.spawn((Health(-1),)).unwrap();

        let dying = [Filter::when::<Health>(|h| h.0 <= 0)];
        assert_eq!(world.query_filters(&dying), vec![dead]);

        if let Some(h) = world.get_mut::<Health>(alive) {
            h.0 = 0;
        }
        let mut matched = world.query_filters(&dying);
        matched.sort();
        assert_eq!(matched, vec![alive, dead]);
    }

    #[test]
    fn abstract_query_falls_back_to_descendants() {
        let mut world = World::new();
        let square = world.spawn((Square(2.0),)).unwrap();
        let circle = world.spawn((Circle(1.0), Health(4))).unwrap();
        world.spawn((Health(9),)).unwrap();

        let shapes = world.query_filters(&[Filter::of::<dyn Shape>()]);
        assert_eq!(shapes, vec![square, circle]);

        let hurt_shapes =
            world.query_filters(&[Filter::of::<dyn Shape>(), Filter::of::<Health>()]);
        assert_eq!(hurt_shapes, vec![circle]);
    }

    #[test]
    fn abstract_query_matches_type_never_seen_alongside_sibling() {
        let mut world = World::new();
        let square = world.spawn((Square(1.0),)).unwrap();
        world.despawn(square);
        let circle = world.spawn((Circle(1.0),)).unwrap();
        assert_eq!(world.query_filters(&[Filter::of::<dyn Shape>()]), vec![circle]);
    }

    #[test]
    fn get_dyn_and_capability_resolve_through_descendants() {
        let mut world = World::new();
        let e = world.spawn((Square(3.0),)).unwrap();

        let any = world.get_dyn(e, TypeKey::of::<dyn Shape>());
        assert!(any.is_some_and(|c| c.is::<Square>()));
        assert_eq!(world.capability::<dyn Shape>(e).map(|s| s.area()), Some(9.0));

        if let Some(shape) = world.capability_mut::<dyn Shape>(e) {
            shape.grow();
        }
        assert_eq!(world.get::<Square>(e).map(|s| s.0), Some(4.0));
        let bare = world.spawn_empty();
        assert!(world.capability::<dyn Shape>(bare).is_none());
    }

    #[test]
    fn graph_survives_last_instance_removal() {
        let mut world = World::new();
        let e = world.spawn((Square(1.0),)).unwrap();
        world.remove::<Square>(e);
        assert_eq!(
            world.descendants_of(TypeKey::of::<dyn Shape>()),
            vec![TypeKey::of::<Square>()]
        );
        world.insert(e, Square(2.0)).unwrap();
        assert_eq!(world.query_filters(&[Filter::of::<dyn Shape>()]), vec![e]);
    }

    #[test]
    fn component_can_hold_shared_handles() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Tally(Rc<Cell<u32>>);
        impl Component for Tally {}

        let shared = Rc::new(Cell::new(0));
        let mut world = World::new();
        let e = world.spawn((Tally(Rc::clone(&shared)),)).unwrap();
        if let Some(tally) = world.get::<Tally>(e) {
            tally.0.set(3);
        }
        assert_eq!(shared.get(), 3);
        assert!(world.despawn(e));
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn resources() {
        let mut world = World::new();
        world.insert_resource(42u32).unwrap();
        assert_eq!(*world.resource::<u32>().unwrap(), 42);
        *world.resource_mut::<u32>().unwrap() += 1;
        assert_eq!(*world.resource::<u32>().unwrap(), 43);
        assert_eq!(
            world.insert_resource(7u32),
            Err(EcsError::DuplicateResource("u32"))
        );
        assert!(world.remove_resource::<u32>());
        world.insert_resource(7u32).unwrap();
        assert_eq!(*world.resource::<u32>().unwrap(), 7);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn entity_stats_reset_per_snapshot() {
        let mut world = World::new();
        let a = world.spawn((Marker,)).unwrap();
        world.spawn((Marker,)).unwrap();
        world.despawn(a);
        let stats = world.diagnostics_entity_stats();
        assert_eq!(stats.spawned_this_tick, 2);
        assert_eq!(stats.despawned_this_tick, 1);
        assert_eq!(stats.alive_count, 1);
        assert_eq!(stats.free_count, 1);
        let stats = world.diagnostics_entity_stats();
        assert_eq!(stats.spawned_this_tick, 0);
    }
}
