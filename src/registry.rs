//! Process-wide table of registered strategy instances, resolved by id and
//! downcast to a caller's concrete `LockmanInfo` type at the point of use.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StrategyRegistrationError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;
use crate::strategy::LockmanStrategy;

struct RegistryEntry {
    /// `Arc<dyn LockmanStrategy<I>>` erased behind `Any`; downcast back to
    /// the caller's concrete `I` in `resolve`.
    strategy: Box<dyn Any + Send + Sync>,
    /// Closes over the same `Arc` to call `cleanup`/`cleanup_boundary`
    /// without knowing `I` — the one operation every `LockmanStrategy<I>`
    /// supports regardless of its lock info type.
    cleanup: Box<dyn Fn() + Send + Sync>,
    cleanup_boundary: Box<dyn Fn(&crate::boundary::AnyBoundaryId) + Send + Sync>,
    type_name: &'static str,
    registered_at: u64,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("type_name", &self.type_name)
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// A snapshot of one registered entry's identity, for introspection.
#[derive(Debug, Clone)]
pub struct RegisteredStrategyInfo {
    pub id: StrategyId,
    pub type_name: &'static str,
    pub registered_at: u64,
}

/// Holds every registered strategy behind one id-keyed table.
///
/// `registered_at` is a monotonic sequence counter local to this registry,
/// not a wall-clock timestamp — registration order is what downstream
/// introspection (and test assertions) actually care about.
#[derive(Debug)]
pub struct StrategyRegistry {
    entries: RwLock<HashMap<StrategyId, RegistryEntry>>,
    sequence: std::sync::atomic::AtomicU64,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()), sequence: std::sync::atomic::AtomicU64::new(0) }
    }

    /// Inserts `strategy` into an already-locked `entries` map. Caller is
    /// responsible for having checked the id isn't already occupied.
    fn insert_locked<I>(
        entries: &mut HashMap<StrategyId, RegistryEntry>,
        sequence: &std::sync::atomic::AtomicU64,
        strategy: Arc<dyn LockmanStrategy<I>>,
    ) where
        I: LockmanInfo,
    {
        let id = strategy.strategy_id();
        let registered_at = sequence.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let cleanup_handle = strategy.clone();
        let cleanup_boundary_handle = strategy.clone();
        entries.insert(
            id,
            RegistryEntry {
                strategy: Box::new(strategy),
                cleanup: Box::new(move || cleanup_handle.cleanup()),
                cleanup_boundary: Box::new(move |boundary| cleanup_boundary_handle.cleanup_boundary(boundary)),
                type_name: std::any::type_name::<I>(),
                registered_at,
            },
        );
    }

    /// Registers `strategy` under its own [`LockmanStrategy::strategy_id`].
    /// Fails if that id is already occupied.
    pub fn register<I>(&self, strategy: Arc<dyn LockmanStrategy<I>>) -> Result<(), StrategyRegistrationError>
    where
        I: LockmanInfo,
    {
        let id = strategy.strategy_id();
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return Err(StrategyRegistrationError::AlreadyRegistered(id));
        }
        Self::insert_locked(&mut entries, &self.sequence, strategy);
        Ok(())
    }

    /// Registers every strategy in `strategies`, atomically: if any id is
    /// already occupied, none of them are registered. Validation and
    /// insertion run under one held write guard so a concurrent registration
    /// can't claim a batch member's id partway through.
    pub fn register_all<I>(
        &self,
        strategies: impl IntoIterator<Item = Arc<dyn LockmanStrategy<I>>>,
    ) -> Result<(), StrategyRegistrationError>
    where
        I: LockmanInfo,
    {
        let strategies: Vec<_> = strategies.into_iter().collect();
        let mut entries = self.entries.write();
        for strategy in &strategies {
            let id = strategy.strategy_id();
            if entries.contains_key(&id) {
                return Err(StrategyRegistrationError::AlreadyRegistered(id));
            }
        }
        for strategy in strategies {
            Self::insert_locked(&mut entries, &self.sequence, strategy);
        }
        Ok(())
    }

    /// Resolves the strategy registered under `id`, downcast to `I`.
    pub fn resolve<I>(&self, id: &StrategyId) -> Result<Arc<dyn LockmanStrategy<I>>, StrategyRegistrationError>
    where
        I: LockmanInfo,
    {
        let entries = self.entries.read();
        let entry = entries.get(id).ok_or_else(|| StrategyRegistrationError::NotRegistered(id.clone()))?;
        entry
            .strategy
            .downcast_ref::<Arc<dyn LockmanStrategy<I>>>()
            .cloned()
            .ok_or_else(|| StrategyRegistrationError::TypeMismatch { id: id.clone() })
    }

    pub fn is_registered(&self, id: &StrategyId) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Every registered id, sorted by registration order.
    pub fn ids(&self) -> Vec<StrategyId> {
        let mut entries: Vec<_> = self.entries.read().iter().map(|(id, e)| (id.clone(), e.registered_at)).collect();
        entries.sort_by_key(|(_, registered_at)| *registered_at);
        entries.into_iter().map(|(id, _)| id).collect()
    }

    /// Snapshot of every registered entry's identity, sorted by registration order.
    pub fn info(&self) -> Vec<RegisteredStrategyInfo> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(id, e)| RegisteredStrategyInfo { id: id.clone(), type_name: e.type_name, registered_at: e.registered_at })
            .collect();
        entries.sort_by_key(|e| e.registered_at);
        entries
    }

    /// Removes the entry registered under `id`, invoking its `cleanup`
    /// before dropping it.
    pub fn unregister(&self, id: &StrategyId) -> Result<(), StrategyRegistrationError> {
        let removed =
            self.entries.write().remove(id).ok_or_else(|| StrategyRegistrationError::NotRegistered(id.clone()))?;
        (removed.cleanup)();
        Ok(())
    }

    /// Invokes `cleanup` on every registered entry, then clears the table.
    pub fn remove_all(&self) {
        let removed: Vec<_> = self.entries.write().drain().collect();
        for (_, entry) in removed {
            (entry.cleanup)();
        }
    }

    /// Calls `cleanup` on every registered strategy, regardless of its
    /// concrete `LockmanInfo` type.
    pub fn cleanup_all(&self) {
        for entry in self.entries.read().values() {
            (entry.cleanup)();
        }
    }

    /// Calls `cleanup_boundary` on every registered strategy for `boundary`.
    pub fn cleanup_boundary_all(&self, boundary: &crate::boundary::AnyBoundaryId) {
        for entry in self.entries.read().values() {
            (entry.cleanup_boundary)(boundary);
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
