//! # Lineage — Querying by Capability
//!
//! Components are plain data, but game code often wants to ask for *what a
//! component can do* rather than *what it is*: "every entity that can be
//! drawn", not "every entity with a `Sprite`, a `Label`, or a `HealthBar`".
//! This module provides the pieces that make that possible:
//!
//! - [`TypeKey`] — the identity of any type (sized or not) at runtime.
//! - [`Capability`] — an abstract type that concrete components can derive
//!   from. Usually a trait object (`dyn Drawable`); its chain of bases ends at
//!   [`Root`].
//! - [`Component`] — a concrete component. Its [`lineage`](Component::lineage)
//!   hook declares the capability it derives from and how to borrow it as one.
//! - [`TypeGraph`] — the forest of `base → [derived]` edges recorded the first
//!   time each concrete type enters the world.
//!
//! ```text
//!            dyn Drawable
//!            ┌─────┴─────┐
//!        dyn Tower     Label
//!        ┌───┴───┐
//!     Turret   Mortar
//! ```
//!
//! Asking for `dyn Drawable` resolves to the owners of `Label`, `Turret` and
//! `Mortar`, even though no component *is* a `dyn Drawable`.
//!
//! ## Why declare, not discover?
//!
//! Rust has no runtime class hierarchy to walk. Each concrete type states its
//! base once, in code, and the graph is assembled from those declarations as
//! types show up. Edges are never removed: once a type is known, re-adding it
//! after every instance was dropped needs no extra bookkeeping.
//!
//! ## Comparison
//!
//! - **bevy_ecs**: `#[reflect(Trait)]` + `ReflectTrait` type data, looked up
//!   through the type registry. Opt-in per trait.
//! - **hecs**: no capability queries; you query concrete types.
//! - **ravn**: one explicit `extends` per type, a forest of edges, and an
//!   upcast stored next to each edge.

use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Runtime identity of a type, sized or not.
///
/// Equality and hashing only look at the [`TypeId`]; the name is kept for
/// error messages and logs.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully-qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path (`ravn::render::Canvas` → `Canvas`).
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Strip the module path from a type name, leaving generic arguments alone.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

// ── Capabilities ───────────────────────────────────────────────────────

/// The end of every capability chain. Uninhabited; never stored.
pub enum Root {}

/// An abstract type concrete components can derive from.
///
/// Implement it for a trait object to make the trait queryable:
///
/// ```ignore
/// pub trait Drawable { fn layer(&self) -> usize; /* ... */ }
/// impl Capability for dyn Drawable { type Base = Root; }
///
/// pub trait Tower: Drawable { fn range(&self) -> f32; }
/// impl Capability for dyn Tower { type Base = dyn Drawable; }
/// ```
///
/// Chains are single-parent: each capability names exactly one base.
pub trait Capability: 'static {
    type Base: ?Sized + Capability;
}

impl Capability for Root {
    type Base = Root;
}

/// Walk `B`'s chain of bases, `B` first, stopping before [`Root`].
///
/// A chain that loops back on itself is cut at the first repeat.
pub(crate) fn ancestry<B: ?Sized + Capability>() -> Vec<TypeKey> {
    let mut chain = Vec::new();
    push_ancestry::<B>(&mut chain);
    chain
}

fn push_ancestry<B: ?Sized + Capability>(chain: &mut Vec<TypeKey>) {
    let key = TypeKey::of::<B>();
    if key.id == TypeId::of::<Root>() || chain.contains(&key) {
        return;
    }
    chain.push(key);
    push_ancestry::<B::Base>(chain);
}

// ── Components ─────────────────────────────────────────────────────────

/// A concrete piece of entity data.
///
/// Most components need nothing beyond the empty impl:
///
/// ```ignore
/// struct Health(i32);
/// impl Component for Health {}
/// ```
///
/// Components that derive from a capability declare it in `lineage`:
///
/// ```ignore
/// impl Component for Turret {
///     fn lineage(lineage: &mut Lineage<Self>) {
///         lineage
///             .extends::<dyn Tower>(|t| t, |t| t)
///             .cast_as::<dyn Drawable>(|t| t, |t| t);
///     }
/// }
/// ```
pub trait Component: Any + Sized {
    /// Declare the capability this type derives from. Called once, the first
    /// time the type enters a world.
    fn lineage(lineage: &mut Lineage<Self>) {
        let _ = lineage;
    }
}

/// Borrow a type-erased component as the capability `C`.
pub(crate) trait Caster<C: ?Sized> {
    fn cast<'a>(&self, any: &'a dyn Any) -> Option<&'a C>;
    fn cast_mut<'a>(&self, any: &'a mut dyn Any) -> Option<&'a mut C>;
}

struct FnCaster<T, C: ?Sized> {
    as_ref: fn(&T) -> &C,
    as_mut: fn(&mut T) -> &mut C,
}

impl<T: 'static, C: ?Sized + 'static> Caster<C> for FnCaster<T, C> {
    fn cast<'a>(&self, any: &'a dyn Any) -> Option<&'a C> {
        any.downcast_ref::<T>().map(self.as_ref)
    }

    fn cast_mut<'a>(&self, any: &'a mut dyn Any) -> Option<&'a mut C> {
        any.downcast_mut::<T>().map(self.as_mut)
    }
}

/// What a concrete component `T` declares about itself: its base chain and
/// the capabilities it can be borrowed as.
pub struct Lineage<T> {
    ancestors: Vec<TypeKey>,
    /// `(capability, Box<dyn Caster<capability>>)`
    casters: Vec<(TypeId, Box<dyn Any>)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> Lineage<T> {
    fn new() -> Self {
        let mut lineage = Self {
            ancestors: Vec::new(),
            casters: Vec::new(),
            _marker: PhantomData,
        };
        lineage.cast_as::<T>(|t| t, |t| t);
        lineage
    }

    /// Derive `T` from the capability `B`. Records `B`'s whole chain of bases
    /// and lets `T` be borrowed as `B`. A second call replaces the base.
    pub fn extends<B: ?Sized + Capability>(
        &mut self,
        as_ref: fn(&T) -> &B,
        as_mut: fn(&mut T) -> &mut B,
    ) -> &mut Self {
        self.ancestors = ancestry::<B>();
        self.cast_as(as_ref, as_mut)
    }

    /// Let `T` be borrowed as `C` without changing its base. Used for the
    /// bases further up the chain.
    pub fn cast_as<C: ?Sized + 'static>(
        &mut self,
        as_ref: fn(&T) -> &C,
        as_mut: fn(&mut T) -> &mut C,
    ) -> &mut Self {
        let caster: Box<dyn Caster<C>> = Box::new(FnCaster { as_ref, as_mut });
        let id = TypeId::of::<C>();
        self.casters.retain(|(existing, _)| *existing != id);
        self.casters.push((id, Box::new(caster)));
        self
    }
}

// ── TypeGraph ──────────────────────────────────────────────────────────

/// Forest of `base → [derived]` edges between the types a world has seen.
///
/// ```text
/// children: { dyn Drawable: [dyn Tower, Label], dyn Tower: [Turret, Mortar] }
/// casters:  { (Turret, dyn Drawable): .., (Turret, dyn Tower): .., .. }
/// ```
///
/// Children are kept in the order they were first recorded.
#[derive(Default)]
pub struct TypeGraph {
    children: HashMap<TypeKey, Vec<TypeKey>>,
    /// Concrete types whose lineage has been recorded.
    seen: HashSet<TypeKey>,
    /// `(concrete, capability) → Box<dyn Caster<capability>>`
    casters: HashMap<(TypeId, TypeId), Box<dyn Any>>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `T` and its declared lineage. Only the first call per type does
    /// any work.
    pub fn record<T: Component>(&mut self) {
        let key = TypeKey::of::<T>();
        if !self.seen.insert(key) {
            return;
        }
        let mut lineage = Lineage::<T>::new();
        T::lineage(&mut lineage);
        for (capability, caster) in lineage.casters {
            self.casters.insert((key.id, capability), caster);
        }
        self.link(key, &lineage.ancestors);
        log::debug!(
            "type graph: recorded {} (bases: {:?})",
            key.short_name(),
            lineage.ancestors
        );
    }

    /// Add `concrete → ancestors[0] → ancestors[1] → ..` edges, stopping at
    /// the first base that was already in the graph.
    pub fn link(&mut self, concrete: TypeKey, ancestors: &[TypeKey]) {
        let mut child = concrete;
        for &parent in ancestors {
            let known = self.children.contains_key(&parent);
            let siblings = self.children.entry(parent).or_default();
            if !siblings.contains(&child) {
                siblings.push(child);
            }
            if known {
                break;
            }
            child = parent;
        }
    }

    pub fn is_recorded(&self, key: TypeKey) -> bool {
        self.seen.contains(&key)
    }

    /// Every type recorded below `key`, depth-first. Empty for leaves and
    /// unknown keys.
    pub fn descendants_of(&self, key: TypeKey) -> Vec<TypeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<TypeKey> = self
            .children
            .get(&key)
            .map(|kids| kids.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if next == key || out.contains(&next) {
                continue;
            }
            out.push(next);
            if let Some(kids) = self.children.get(&next) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn caster<C: ?Sized + 'static>(&self, concrete: TypeId) -> Option<&dyn Caster<C>> {
        self.casters
            .get(&(concrete, TypeId::of::<C>()))
            .and_then(|boxed| boxed.downcast_ref::<Box<dyn Caster<C>>>())
            .map(|caster| caster.as_ref())
    }
}
