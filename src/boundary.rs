//! Type-erased hashable keys identifying a scope of mutual exclusion.
//!
//! A boundary is any caller-defined value with equality and hashing — a
//! screen name, a feature flag, a session id. `LockState` and the strategy
//! registry need to store boundaries of many different concrete types behind
//! one map, so we erase the concrete type here while preserving its `Eq` and
//! `Hash` behavior. Two boundaries of different Rust types are never equal
//! even if their underlying bytes match: type identity is part of the key.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for values admissible as a boundary id.
///
/// Implemented automatically for any type that is `Debug + Clone + Eq + Hash
/// + Send + Sync + 'static`. Callers should not implement this by hand.
pub trait LockmanBoundaryId: fmt::Debug + Send + Sync + 'static {
    #[doc(hidden)]
    fn dyn_clone(&self) -> Box<dyn LockmanBoundaryId>;
    #[doc(hidden)]
    fn dyn_eq(&self, other: &dyn LockmanBoundaryId) -> bool;
    #[doc(hidden)]
    fn dyn_hash(&self, state: &mut dyn Hasher);
    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
}

impl<T> LockmanBoundaryId for T
where
    T: fmt::Debug + Clone + Eq + Hash + Send + Sync + 'static,
{
    fn dyn_clone(&self) -> Box<dyn LockmanBoundaryId> {
        Box::new(self.clone())
    }

    fn dyn_eq(&self, other: &dyn LockmanBoundaryId) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A boundary id with its concrete type erased.
///
/// Constructed once at the edge of the public API (`acquire`, the registry,
/// `LockState`) and threaded through the core as a single uniform key type.
pub struct AnyBoundaryId(Box<dyn LockmanBoundaryId>);

impl AnyBoundaryId {
    /// Erases the concrete type of `boundary`, cloning it into the container.
    pub fn new<B: LockmanBoundaryId + Clone>(boundary: &B) -> Self {
        AnyBoundaryId(Box::new(boundary.clone()))
    }
}

impl Clone for AnyBoundaryId {
    fn clone(&self) -> Self {
        AnyBoundaryId(self.0.dyn_clone())
    }
}

impl fmt::Debug for AnyBoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for AnyBoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl PartialEq for AnyBoundaryId {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl Eq for AnyBoundaryId {}

impl Hash for AnyBoundaryId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state)
    }
}
