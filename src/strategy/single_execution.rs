//! Rejects duplicate in-flight executions of the same boundary or action.

use std::collections::HashMap;

use uuid::Uuid;

use crate::boundary::AnyBoundaryId;
use crate::error::SingleExecutionError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;
use crate::state::LockState;

use super::{CanLockResult, LockmanStrategy};

/// Scope a `SingleExecution` acquisition is exclusive over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleExecutionMode {
    /// No exclusivity at all; always succeeds. Exists so callers can attach
    /// a `LockmanInfo` to this strategy purely to participate in the debug
    /// table, without any locking behavior.
    None,
    /// At most one active lock per boundary, regardless of action id.
    Boundary,
    /// At most one active lock per `(boundary, action_id)`.
    Action,
}

/// Lock info for [`SingleExecutionStrategy`].
#[derive(Debug, Clone)]
pub struct SingleExecutionInfo {
    strategy_id: StrategyId,
    action_id: String,
    unique_id: Uuid,
    pub mode: SingleExecutionMode,
}

impl SingleExecutionInfo {
    pub fn new(strategy_id: StrategyId, action_id: impl Into<String>, mode: SingleExecutionMode) -> Self {
        Self { strategy_id, action_id: action_id.into(), unique_id: Uuid::new_v4(), mode }
    }
}

impl PartialEq for SingleExecutionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}
impl Eq for SingleExecutionInfo {}

impl LockmanInfo for SingleExecutionInfo {
    fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }
    fn action_id(&self) -> &str {
        &self.action_id
    }
    fn unique_id(&self) -> Uuid {
        self.unique_id
    }
    fn is_cancellation_target(&self) -> bool {
        true
    }
    fn debug_description(&self) -> String {
        format!("action={} mode={:?}", self.action_id, self.mode)
    }
}

/// `None` never conflicts, `Boundary` allows one active
/// lock per boundary, `Action` allows one active lock per `(boundary,
/// action_id)`.
///
/// `can_lock` and the subsequent `lock` are not atomic: two concurrent
/// callers can both observe `Success` and both proceed to `lock` before
/// either's record is visible to the other. This strategy does not recheck
/// in `lock` — it is a documented, accepted race, not a bug to be fixed here.
#[derive(Debug)]
pub struct SingleExecutionStrategy {
    id: StrategyId,
    state: LockState<SingleExecutionInfo, String>,
}

impl SingleExecutionStrategy {
    pub fn new() -> Self {
        Self {
            id: StrategyId::new(StrategyId::SINGLE_EXECUTION),
            state: LockState::new(|info| vec![info.action_id().to_string()]),
        }
    }
}

impl Default for SingleExecutionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LockmanStrategy<SingleExecutionInfo> for SingleExecutionStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn can_lock(&self, boundary: &AnyBoundaryId, info: &SingleExecutionInfo) -> CanLockResult {
        match info.mode {
            SingleExecutionMode::None => CanLockResult::Success,
            SingleExecutionMode::Boundary => {
                let existing = self.state.current(boundary);
                match existing.into_iter().next() {
                    Some(existing) => {
                        CanLockResult::Cancel(SingleExecutionError::BoundaryAlreadyLocked { existing }.into())
                    }
                    None => CanLockResult::Success,
                }
            }
            SingleExecutionMode::Action => {
                let existing = self.state.current_by_key(boundary, &info.action_id().to_string());
                match existing.into_iter().next() {
                    Some(existing) => {
                        CanLockResult::Cancel(SingleExecutionError::ActionAlreadyRunning { existing }.into())
                    }
                    None => CanLockResult::Success,
                }
            }
        }
    }

    fn lock(&self, boundary: &AnyBoundaryId, info: SingleExecutionInfo) {
        self.state.add(boundary, info);
    }

    fn unlock(&self, boundary: &AnyBoundaryId, info: &SingleExecutionInfo) {
        self.state.remove(boundary, info);
    }

    fn cleanup(&self) {
        self.state.remove_all();
    }

    fn cleanup_boundary(&self, boundary: &AnyBoundaryId) {
        self.state.remove_all_boundary(boundary);
    }

    fn current_locks(&self) -> HashMap<AnyBoundaryId, Vec<SingleExecutionInfo>> {
        self.state.all_locks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(name: &str) -> AnyBoundaryId {
        AnyBoundaryId::new(&name.to_string())
    }

    fn info(strategy: &SingleExecutionStrategy, action_id: &str, mode: SingleExecutionMode) -> SingleExecutionInfo {
        SingleExecutionInfo::new(strategy.strategy_id(), action_id, mode)
    }

    /// Rejects a second acquisition against the same boundary until the first releases.
    #[test]
    fn boundary_mode_rejects_duplicates_until_released() {
        let strategy = SingleExecutionStrategy::new();
        let b = boundary("screen.payment");

        let i1 = info(&strategy, "submit", SingleExecutionMode::Boundary);
        assert!(matches!(strategy.can_lock(&b, &i1), CanLockResult::Success));
        strategy.lock(&b, i1.clone());

        let i2 = info(&strategy, "submit", SingleExecutionMode::Boundary);
        assert!(matches!(strategy.can_lock(&b, &i2), CanLockResult::Cancel(_)));

        strategy.unlock(&b, &i1);
        assert!(matches!(strategy.can_lock(&b, &i2), CanLockResult::Success));
    }

    /// Different action ids at the same boundary proceed concurrently.
    #[test]
    fn action_mode_allows_different_actions_concurrently() {
        let strategy = SingleExecutionStrategy::new();
        let b = boundary("screen.payment");

        let a = info(&strategy, "a", SingleExecutionMode::Action);
        assert!(matches!(strategy.can_lock(&b, &a), CanLockResult::Success));
        strategy.lock(&b, a.clone());

        let bb = info(&strategy, "b", SingleExecutionMode::Action);
        assert!(matches!(strategy.can_lock(&b, &bb), CanLockResult::Success));
        strategy.lock(&b, bb);

        let a_again = info(&strategy, "a", SingleExecutionMode::Action);
        assert!(matches!(strategy.can_lock(&b, &a_again), CanLockResult::Cancel(_)));
    }

    #[test]
    fn none_mode_never_conflicts() {
        let strategy = SingleExecutionStrategy::new();
        let b = boundary("screen.payment");
        let i1 = info(&strategy, "x", SingleExecutionMode::None);
        strategy.lock(&b, i1.clone());
        let i2 = info(&strategy, "x", SingleExecutionMode::None);
        assert!(matches!(strategy.can_lock(&b, &i2), CanLockResult::Success));
    }

    #[test]
    fn unlock_with_unknown_unique_id_is_noop() {
        let strategy = SingleExecutionStrategy::new();
        let b = boundary("screen.payment");
        let held = info(&strategy, "a", SingleExecutionMode::Boundary);
        strategy.lock(&b, held.clone());
        let stray = info(&strategy, "a", SingleExecutionMode::Boundary);
        strategy.unlock(&b, &stray);
        assert_eq!(strategy.current_locks().get(&b).map(Vec::len), Some(1));
    }
}
