//! Per-strategy, per-boundary ordered storage of active lock records.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::boundary::AnyBoundaryId;
use crate::info::LockmanInfo;

struct BoundaryEntry<I, K> {
    /// Authoritative insertion-ordered sequence of active records.
    order: Vec<I>,
    /// Auxiliary per-key index for O(1)-ish conflict checks. A record may
    /// appear under zero, one, or several keys (e.g. group membership).
    by_key: HashMap<K, Vec<I>>,
}

impl<I, K> Default for BoundaryEntry<I, K> {
    fn default() -> Self {
        Self { order: Vec::new(), by_key: HashMap::new() }
    }
}

/// The mapping a single strategy owns: `boundary -> ordered lock infos`, with
/// an auxiliary `(boundary, key) -> ordered lock infos` index.
///
/// All mutating access is serialized through one short-critical-section
/// mutex; snapshot methods return owned copies, never borrowed views, so
/// callers can inspect state without holding the lock.
pub struct LockState<I, K = ()>
where
    I: LockmanInfo,
    K: Eq + Hash + Clone,
{
    inner: Mutex<HashMap<AnyBoundaryId, BoundaryEntry<I, K>>>,
    key_of: fn(&I) -> Vec<K>,
}

impl<I> LockState<I, ()>
where
    I: LockmanInfo,
{
    /// Creates a `LockState` with no auxiliary key index — for strategies
    /// whose decisions don't need a fast per-key conflict check.
    pub fn unindexed() -> Self {
        Self::new(|_| Vec::new())
    }
}

impl<I, K> LockState<I, K>
where
    I: LockmanInfo,
    K: Eq + Hash + Clone,
{
    /// Creates a `LockState` whose auxiliary index is populated by projecting
    /// each record through `key_of` (e.g. `action_id`, or group membership).
    pub fn new(key_of: fn(&I) -> Vec<K>) -> Self {
        Self { inner: Mutex::new(HashMap::new()), key_of }
    }

    /// Appends `info` to the ordered sequence for `boundary`.
    pub fn add(&self, boundary: &AnyBoundaryId, info: I) {
        let keys = (self.key_of)(&info);
        let mut guard = self.inner.lock();
        let entry = guard.entry(boundary.clone()).or_default();
        entry.order.push(info.clone());
        for key in keys {
            entry.by_key.entry(key).or_default().push(info.clone());
        }
    }

    /// Removes the element whose `unique_id` matches `info.unique_id()`.
    /// No-op if absent. Prunes the boundary entry once it becomes empty.
    pub fn remove(&self, boundary: &AnyBoundaryId, info: &I) {
        let mut guard = self.inner.lock();
        let Some(entry) = guard.get_mut(boundary) else { return };
        let target = info.unique_id();
        entry.order.retain(|existing| existing.unique_id() != target);
        entry.by_key.retain(|_, bucket| {
            bucket.retain(|existing| existing.unique_id() != target);
            !bucket.is_empty()
        });
        if entry.order.is_empty() {
            guard.remove(boundary);
        }
    }

    /// Whether any record in `boundary` projects to `key`.
    pub fn contains(&self, boundary: &AnyBoundaryId, key: &K) -> bool {
        let guard = self.inner.lock();
        guard
            .get(boundary)
            .map(|entry| entry.by_key.get(key).is_some_and(|bucket| !bucket.is_empty()))
            .unwrap_or(false)
    }

    /// Snapshot of the ordered sequence for `boundary`.
    pub fn current(&self, boundary: &AnyBoundaryId) -> Vec<I> {
        self.inner.lock().get(boundary).map(|entry| entry.order.clone()).unwrap_or_default()
    }

    /// Snapshot filtered to records projecting to `key`.
    pub fn current_by_key(&self, boundary: &AnyBoundaryId, key: &K) -> Vec<I> {
        self.inner
            .lock()
            .get(boundary)
            .and_then(|entry| entry.by_key.get(key).cloned())
            .unwrap_or_default()
    }

    /// Bulk cleanup of every boundary.
    pub fn remove_all(&self) {
        self.inner.lock().clear();
    }

    /// Bulk cleanup of a single boundary.
    pub fn remove_all_boundary(&self, boundary: &AnyBoundaryId) {
        self.inner.lock().remove(boundary);
    }

    /// Snapshot of the whole map, for introspection.
    pub fn all_locks(&self) -> HashMap<AnyBoundaryId, Vec<I>> {
        self.inner
            .lock()
            .iter()
            .map(|(boundary, entry)| (boundary.clone(), entry.order.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestInfo {
        action_id: String,
        unique_id: uuid::Uuid,
    }

    impl LockmanInfo for TestInfo {
        fn strategy_id(&self) -> &crate::id::StrategyId {
            unimplemented!("not exercised by these tests")
        }
        fn action_id(&self) -> &str {
            &self.action_id
        }
        fn unique_id(&self) -> uuid::Uuid {
            self.unique_id
        }
        fn is_cancellation_target(&self) -> bool {
            true
        }
        fn debug_description(&self) -> String {
            self.action_id.clone()
        }
    }

    fn info(action_id: &str) -> TestInfo {
        TestInfo { action_id: action_id.to_string(), unique_id: uuid::Uuid::new_v4() }
    }

    fn boundary(name: &str) -> AnyBoundaryId {
        AnyBoundaryId::new(&name.to_string())
    }

    #[test]
    fn add_then_remove_restores_empty_state() {
        let state: LockState<TestInfo> = LockState::unindexed();
        let b = boundary("b");
        let i = info("a");
        state.add(&b, i.clone());
        assert_eq!(state.current(&b).len(), 1);
        state.remove(&b, &i);
        assert!(state.current(&b).is_empty());
    }

    #[test]
    fn remove_with_unknown_unique_id_is_noop() {
        let state: LockState<TestInfo> = LockState::unindexed();
        let b = boundary("b");
        let i = info("a");
        state.add(&b, i.clone());
        state.remove(&b, &info("a"));
        assert_eq!(state.current(&b).len(), 1);
    }

    #[test]
    fn preserves_insertion_order() {
        let state: LockState<TestInfo> = LockState::unindexed();
        let b = boundary("b");
        let i1 = info("first");
        let i2 = info("second");
        let i3 = info("third");
        state.add(&b, i1.clone());
        state.add(&b, i2.clone());
        state.add(&b, i3.clone());
        let order: Vec<_> = state.current(&b).iter().map(|i| i.action_id.clone()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn key_index_tracks_membership_and_prunes() {
        let state: LockState<TestInfo, String> =
            LockState::new(|info: &TestInfo| vec![info.action_id.clone()]);
        let b = boundary("b");
        let i = info("submit");
        state.add(&b, i.clone());
        assert!(state.contains(&b, &"submit".to_string()));
        state.remove(&b, &i);
        assert!(!state.contains(&b, &"submit".to_string()));
    }

    #[test]
    fn empty_boundary_entries_are_pruned() {
        let state: LockState<TestInfo> = LockState::unindexed();
        let b = boundary("b");
        let i = info("a");
        state.add(&b, i.clone());
        state.remove(&b, &i);
        assert!(state.all_locks().is_empty());
    }
}
