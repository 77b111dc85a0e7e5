//! Caps the number of simultaneously active locks sharing a concurrency id.

use std::collections::HashMap;

use uuid::Uuid;

use crate::boundary::AnyBoundaryId;
use crate::error::ConcurrencyLimitedError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;
use crate::state::LockState;

use super::{CanLockResult, LockmanStrategy};

/// How many concurrent locks a `concurrency_id` may have active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyLimit {
    Unlimited,
    Limited(u32),
}

/// Lock info for [`ConcurrencyLimitedStrategy`].
#[derive(Debug, Clone)]
pub struct ConcurrencyLimitedInfo {
    strategy_id: StrategyId,
    action_id: String,
    unique_id: Uuid,
    pub concurrency_id: String,
    pub limit: ConcurrencyLimit,
}

impl ConcurrencyLimitedInfo {
    pub fn new(
        strategy_id: StrategyId,
        action_id: impl Into<String>,
        concurrency_id: impl Into<String>,
        limit: ConcurrencyLimit,
    ) -> Self {
        Self {
            strategy_id,
            action_id: action_id.into(),
            unique_id: Uuid::new_v4(),
            concurrency_id: concurrency_id.into(),
            limit,
        }
    }
}

impl PartialEq for ConcurrencyLimitedInfo {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}
impl Eq for ConcurrencyLimitedInfo {}

impl LockmanInfo for ConcurrencyLimitedInfo {
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
        format!("action={} concurrency_id={} limit={:?}", self.action_id, self.concurrency_id, self.limit)
    }
}

/// Allows up to `limit` simultaneously active locks per
/// `(boundary, concurrency_id)`. `Unlimited` never refuses.
#[derive(Debug)]
pub struct ConcurrencyLimitedStrategy {
    id: StrategyId,
    state: LockState<ConcurrencyLimitedInfo, String>,
}

impl ConcurrencyLimitedStrategy {
    pub fn new() -> Self {
        Self {
            id: StrategyId::new(StrategyId::CONCURRENCY_LIMITED),
            state: LockState::new(|info| vec![info.concurrency_id.clone()]),
        }
    }
}

impl Default for ConcurrencyLimitedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LockmanStrategy<ConcurrencyLimitedInfo> for ConcurrencyLimitedStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn can_lock(&self, boundary: &AnyBoundaryId, info: &ConcurrencyLimitedInfo) -> CanLockResult {
        let ConcurrencyLimit::Limited(limit) = info.limit else {
            return CanLockResult::Success;
        };
        let existing = self.state.current_by_key(boundary, &info.concurrency_id);
        if (existing.len() as u32) < limit {
            CanLockResult::Success
        } else {
            CanLockResult::Cancel(
                ConcurrencyLimitedError::LimitReached {
                    concurrency_id: info.concurrency_id.clone(),
                    current: existing.len() as u32,
                    limit,
                    existing,
                }
                .into(),
            )
        }
    }

    fn lock(&self, boundary: &AnyBoundaryId, info: ConcurrencyLimitedInfo) {
        self.state.add(boundary, info);
    }

    fn unlock(&self, boundary: &AnyBoundaryId, info: &ConcurrencyLimitedInfo) {
        self.state.remove(boundary, info);
    }

    fn cleanup(&self) {
        self.state.remove_all();
    }

    fn cleanup_boundary(&self, boundary: &AnyBoundaryId) {
        self.state.remove_all_boundary(boundary);
    }

    fn current_locks(&self) -> HashMap<AnyBoundaryId, Vec<ConcurrencyLimitedInfo>> {
        self.state.all_locks()
    }
}
