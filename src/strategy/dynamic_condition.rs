//! Acquisition gated by an arbitrary caller-supplied predicate over current state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::boundary::AnyBoundaryId;
use crate::error::DynamicConditionError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;
use crate::state::LockState;

use super::{CanLockResult, LockmanStrategy};

/// The predicate a [`DynamicConditionInfo`] evaluates against the locks
/// currently held at the target boundary.
///
/// Wrapped in `Arc` rather than `Box` so `DynamicConditionInfo` stays
/// `Clone`, as `LockmanInfo` requires.
pub type Condition = Arc<dyn Fn(&[DynamicConditionInfo]) -> Result<(), DynamicConditionError> + Send + Sync>;

/// Lock info for [`DynamicConditionStrategy`].
#[derive(Clone)]
pub struct DynamicConditionInfo {
    strategy_id: StrategyId,
    action_id: String,
    unique_id: Uuid,
    condition: Condition,
}

impl DynamicConditionInfo {
    pub fn new(strategy_id: StrategyId, action_id: impl Into<String>, condition: Condition) -> Self {
        Self { strategy_id, action_id: action_id.into(), unique_id: Uuid::new_v4(), condition }
    }
}

impl fmt::Debug for DynamicConditionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicConditionInfo")
            .field("action_id", &self.action_id)
            .field("unique_id", &self.unique_id)
            .field("condition", &"<closure>")
            .finish()
    }
}

impl PartialEq for DynamicConditionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}
impl Eq for DynamicConditionInfo {}

impl LockmanInfo for DynamicConditionInfo {
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
        format!("action={} condition=<closure>", self.action_id)
    }
}

/// Evaluates the acquisition's own condition closure
/// against the records already held at the target boundary. The closure
/// never sees locks from other boundaries.
#[derive(Debug)]
pub struct DynamicConditionStrategy {
    id: StrategyId,
    state: LockState<DynamicConditionInfo>,
}

impl DynamicConditionStrategy {
    pub fn new() -> Self {
        Self { id: StrategyId::new(StrategyId::DYNAMIC_CONDITION), state: LockState::unindexed() }
    }
}

impl Default for DynamicConditionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LockmanStrategy<DynamicConditionInfo> for DynamicConditionStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn can_lock(&self, boundary: &AnyBoundaryId, info: &DynamicConditionInfo) -> CanLockResult {
        let held = self.state.current(boundary);
        match (info.condition)(&held) {
            Ok(()) => CanLockResult::Success,
            Err(err) => CanLockResult::Cancel(err.into()),
        }
    }

    fn lock(&self, boundary: &AnyBoundaryId, info: DynamicConditionInfo) {
        self.state.add(boundary, info);
    }

    fn unlock(&self, boundary: &AnyBoundaryId, info: &DynamicConditionInfo) {
        self.state.remove(boundary, info);
    }

    fn cleanup(&self) {
        self.state.remove_all();
    }

    fn cleanup_boundary(&self, boundary: &AnyBoundaryId) {
        self.state.remove_all_boundary(boundary);
    }

    fn current_locks(&self) -> HashMap<AnyBoundaryId, Vec<DynamicConditionInfo>> {
        self.state.all_locks()
    }
}
