//! # Query — Bundles of Filters plus a Resource Set
//!
//! A [`Query`] describes what a system needs:
//!
//! - one or more **bundles**, each an ordered list of [`Filter`]s that must all
//!   hold for an entity to match, and
//! - at most one **resource set**, the singletons the system reads or writes.
//!
//! ```text
//! Query::new()
//!     .bundle([Filter::of::<dyn Drawable>()])          ← bundle 0
//!     .bundle([Filter::when::<Health>(|h| h.0 <= 0)])  ← bundle 1
//!     .resources::<(Canvas, Time)>()?
//!
//! query.execute(&world)?  →  (Matches [[e1, e4], [e7]], BoundResources {Canvas, Time})
//! ```
//!
//! ## Executing
//!
//! Every execution re-runs each bundle against the current world through
//! [`World::query_filters`], so a system always sees what earlier systems in
//! the same pass did. The matched lists are owned snapshots: mutating the
//! world while walking them is fine and only shows up on the next execution.
//!
//! ## Resource binding
//!
//! Resources are fetched on the **first successful execution** and the
//! handles are kept for the lifetime of the query. Unregistering a resource
//! and registering a new instance afterwards does not affect a query that has
//! already bound the old one. If a declared resource is missing, execution
//! fails with [`EcsError::ResourceNotLoaded`], nothing is cached, and the next
//! execution tries again.
//!
//! ## Comparison
//!
//! - **hecs**: typed `Query` over tuples; no resources.
//! - **bevy_ecs**: `Query<D, F>` + `Res<T>` system params, resolved every run.
//! - **ravn**: erased filter lists with runtime predicates, resources pinned
//!   on first bind.

use std::any::Any;
use std::cell::{Ref, RefMut};
use std::ops::Index;

use super::entity::Entity;
use super::lineage::TypeKey;
use super::resource::{ResourceHandle, borrow, borrow_mut};
use super::world::World;
use crate::error::{EcsError, Result};

/// One term of a bundle: a type key and an optional predicate.
pub struct Filter {
    key: TypeKey,
    predicate: Option<Box<dyn Fn(&dyn Any) -> bool>>,
}

impl Filter {
    /// Match entities owning a `T`, or any type recorded below `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            predicate: None,
        }
    }

    /// Match entities owning a `T` for which `predicate` holds.
    ///
    /// The predicate only narrows: an instance at this slot that is not a `T`
    /// passes.
    pub fn when<T: 'static>(predicate: impl Fn(&T) -> bool + 'static) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            predicate: Some(Box::new(move |component: &dyn Any| {
                component
                    .downcast_ref::<T>()
                    .is_none_or(|value| predicate(value))
            })),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub(crate) fn accepts(&self, world: &World, entity: Entity) -> bool {
        let Some(predicate) = &self.predicate else {
            return true;
        };
        world
            .get_dyn(entity, self.key)
            .is_none_or(|component| predicate(component))
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("key", &self.key)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// An ordered list of filters that must all hold.
#[derive(Debug, Default)]
pub struct Bundle {
    filters: Vec<Filter>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bundle of plain type filters, one per tuple element.
    ///
    /// ```ignore
    /// let movers = Bundle::of::<(Position, Velocity)>();
    /// ```
    pub fn of<S: TypeSet>() -> Self {
        Self {
            filters: S::type_keys()
                .into_iter()
                .map(|key| Filter { key, predicate: None })
                .collect(),
        }
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl From<Vec<Filter>> for Bundle {
    fn from(filters: Vec<Filter>) -> Self {
        Self { filters }
    }
}

impl<const N: usize> From<[Filter; N]> for Bundle {
    fn from(filters: [Filter; N]) -> Self {
        Self {
            filters: filters.into(),
        }
    }
}

/// Tuples of types, used to name resource sets and plain bundles.
pub trait TypeSet {
    fn type_keys() -> Vec<TypeKey>;
}

macro_rules! impl_type_set {
    ($($T:ident),+) => {
        impl<$($T: 'static),+> TypeSet for ($($T,)+) {
            fn type_keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$T>()),+]
            }
        }
    };
}

impl_type_set!(A);
impl_type_set!(A, B);
impl_type_set!(A, B, C);
impl_type_set!(A, B, C, D);
impl_type_set!(A, B, C, D, E);
impl_type_set!(A, B, C, D, E, F);
impl_type_set!(A, B, C, D, E, F, G);
impl_type_set!(A, B, C, D, E, F, G, H);

/// Bundles plus an optional resource set. See the [module docs](self).
#[derive(Debug, Default)]
pub struct Query {
    bundles: Vec<Bundle>,
    resources: Option<Vec<TypeKey>>,
    bound: Option<BoundResources>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bundle(mut self, bundle: impl Into<Bundle>) -> Self {
        self.bundles.push(bundle.into());
        self
    }

    /// Attach the resource set `S`, a tuple of resource types.
    ///
    /// Fails with [`EcsError::DuplicateResourceSetOnQuery`] if the query
    /// already has one and with [`EcsError::ResourceSetNotUnique`] if `S`
    /// names a type twice.
    pub fn resources<S: TypeSet>(mut self) -> Result<Self> {
        if self.resources.is_some() {
            return Err(EcsError::DuplicateResourceSetOnQuery);
        }
        let keys = S::type_keys();
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(EcsError::ResourceSetNotUnique(key.short_name()));
            }
        }
        self.resources = Some(keys);
        Ok(self)
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    /// Whether the resource handles have been fetched and pinned.
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Match every bundle against `world` and hand out the bound resources.
    pub fn execute(&mut self, world: &World) -> Result<(Matches, BoundResources)> {
        let resources = self.bind(world)?;
        let matches = Matches {
            bundles: self
                .bundles
                .iter()
                .map(|bundle| world.query_filters(bundle.filters()))
                .collect(),
        };
        Ok((matches, resources))
    }

    fn bind(&mut self, world: &World) -> Result<BoundResources> {
        if let Some(bound) = &self.bound {
            return Ok(bound.clone());
        }
        let keys = self.resources.as_deref().unwrap_or(&[]);
        let entries = keys
            .iter()
            .map(|&key| world.resources().handle(key).map(|handle| (key, handle)))
            .collect::<Result<Vec<_>>>()?;
        if !entries.is_empty() {
            log::debug!("query bound resources {keys:?}");
        }
        let bound = BoundResources { entries };
        self.bound = Some(bound.clone());
        Ok(bound)
    }
}

/// Matched entities, one list per bundle in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    bundles: Vec<Vec<Entity>>,
}

impl Matches {
    pub fn bundle(&self, index: usize) -> &[Entity] {
        self.bundles.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Entity]> {
        self.bundles.iter().map(Vec::as_slice)
    }

    /// Number of bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl Index<usize> for Matches {
    type Output = [Entity];

    fn index(&self, index: usize) -> &[Entity] {
        &self.bundles[index]
    }
}

/// Resource handles pinned by a query.
#[derive(Clone, Default)]
pub struct BoundResources {
    entries: Vec<(TypeKey, ResourceHandle)>,
}

impl BoundResources {
    /// Borrow `R`. Fails with [`EcsError::ResourceNotLoaded`] if `R` is not
    /// part of the query's resource set.
    pub fn get<R: 'static>(&self) -> Result<Ref<'_, R>> {
        let (key, handle) = self.entry::<R>()?;
        borrow(handle, *key)
    }

    pub fn get_mut<R: 'static>(&self) -> Result<RefMut<'_, R>> {
        let (key, handle) = self.entry::<R>()?;
        borrow_mut(handle, *key)
    }

    pub fn contains<R: 'static>(&self) -> bool {
        self.entry::<R>().is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry<R: 'static>(&self) -> Result<&(TypeKey, ResourceHandle)> {
        let wanted = TypeKey::of::<R>();
        self.entries
            .iter()
            .find(|(key, _)| *key == wanted)
            .ok_or(EcsError::ResourceNotLoaded(wanted.short_name()))
    }
}

impl std::fmt::Debug for BoundResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key))
            .finish()
    }
}
