//! Priority-ordered preemption: a higher-priority action can cancel a
//! lower-priority one that opted in to being replaceable.

use std::collections::HashMap;

use uuid::Uuid;

use crate::boundary::AnyBoundaryId;
use crate::error::PriorityBasedError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;
use crate::state::LockState;

use super::{CanLockResult, LockmanStrategy};

/// Whether a priority-carrying lock may be preempted by a strictly
/// higher-priority arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityBehavior {
    /// Runs to completion regardless of what arrives after it; a
    /// higher-priority arrival is blocked, not preempting.
    Exclusive,
    /// May be cancelled by a strictly higher-priority arrival.
    Replaceable,
}

/// Priority level of an acquisition attempt.
///
/// `None` carries no `PriorityBehavior` — there is nothing for it to apply
/// to, since a `None`-priority action never conflicts with anything and is
/// never itself preempted. Making this a type-level omission rather than a
/// runtime-ignored field keeps that invariant unrepresentable as a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    None,
    Low(PriorityBehavior),
    High(PriorityBehavior),
}

impl Priority {
    fn rank(self) -> u8 {
        match self {
            Priority::None => 0,
            Priority::Low(_) => 1,
            Priority::High(_) => 2,
        }
    }

    fn behavior(self) -> Option<PriorityBehavior> {
        match self {
            Priority::None => None,
            Priority::Low(b) | Priority::High(b) => Some(b),
        }
    }
}

/// Lock info for [`PriorityBasedStrategy`].
#[derive(Debug, Clone)]
pub struct PriorityBasedInfo {
    strategy_id: StrategyId,
    action_id: String,
    unique_id: Uuid,
    pub priority: Priority,
}

impl PriorityBasedInfo {
    pub fn new(strategy_id: StrategyId, action_id: impl Into<String>, priority: Priority) -> Self {
        Self { strategy_id, action_id: action_id.into(), unique_id: Uuid::new_v4(), priority }
    }
}

impl PartialEq for PriorityBasedInfo {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}
impl Eq for PriorityBasedInfo {}

impl LockmanInfo for PriorityBasedInfo {
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
        !matches!(self.priority, Priority::None)
    }
    fn debug_description(&self) -> String {
        format!("action={} priority={:?}", self.action_id, self.priority)
    }
}

/// Decision table below. At most one priority-carrying record
/// is active per boundary at a time; `Priority::None` records never
/// conflict and are excluded from the comparison entirely.
///
/// | existing vs new | existing.behavior | outcome |
/// |---|---|---|
/// | new < existing  | any         | `Cancel(BlockedByHigherPriority)` |
/// | new == existing | Exclusive   | `Cancel(SamePriorityConflict)` |
/// | new == existing | Replaceable | `SuccessWithPrecedingCancellation` |
/// | new > existing  | any         | `SuccessWithPrecedingCancellation` |
#[derive(Debug)]
pub struct PriorityBasedStrategy {
    id: StrategyId,
    state: LockState<PriorityBasedInfo>,
}

impl PriorityBasedStrategy {
    pub fn new() -> Self {
        Self { id: StrategyId::new(StrategyId::PRIORITY_BASED), state: LockState::unindexed() }
    }
}

impl Default for PriorityBasedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LockmanStrategy<PriorityBasedInfo> for PriorityBasedStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn can_lock(&self, boundary: &AnyBoundaryId, info: &PriorityBasedInfo) -> CanLockResult {
        if matches!(info.priority, Priority::None) {
            return CanLockResult::Success;
        }
        let existing = self
            .state
            .current(boundary)
            .into_iter()
            .find(|existing| !matches!(existing.priority, Priority::None));

        let Some(existing) = existing else {
            return CanLockResult::Success;
        };

        match info.priority.rank().cmp(&existing.priority.rank()) {
            std::cmp::Ordering::Less => {
                CanLockResult::Cancel(PriorityBasedError::BlockedByHigherPriority { existing }.into())
            }
            std::cmp::Ordering::Equal => match existing.priority.behavior() {
                Some(PriorityBehavior::Exclusive) => {
                    CanLockResult::Cancel(PriorityBasedError::SamePriorityConflict { existing }.into())
                }
                _ => CanLockResult::SuccessWithPrecedingCancellation(
                    PriorityBasedError::PrecedingActionCancelled { preempted: existing }.into(),
                ),
            },
            std::cmp::Ordering::Greater => CanLockResult::SuccessWithPrecedingCancellation(
                PriorityBasedError::PrecedingActionCancelled { preempted: existing }.into(),
            ),
        }
    }

    fn lock(&self, boundary: &AnyBoundaryId, info: PriorityBasedInfo) {
        self.state.add(boundary, info);
    }

    fn unlock(&self, boundary: &AnyBoundaryId, info: &PriorityBasedInfo) {
        self.state.remove(boundary, info);
    }

    fn cleanup(&self) {
        self.state.remove_all();
    }

    fn cleanup_boundary(&self, boundary: &AnyBoundaryId) {
        self.state.remove_all_boundary(boundary);
    }

    fn current_locks(&self) -> HashMap<AnyBoundaryId, Vec<PriorityBasedInfo>> {
        self.state.all_locks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(name: &str) -> AnyBoundaryId {
        AnyBoundaryId::new(&name.to_string())
    }

    fn info(strategy: &PriorityBasedStrategy, action_id: &str, priority: Priority) -> PriorityBasedInfo {
        PriorityBasedInfo::new(strategy.strategy_id(), action_id, priority)
    }

    /// Higher priority preempts a replaceable lower one.
    #[test]
    fn higher_priority_preempts_replaceable_lower() {
        let strategy = PriorityBasedStrategy::new();
        let b = boundary("screen.feed");

        let low = info(&strategy, "refresh", Priority::Low(PriorityBehavior::Replaceable));
        assert!(matches!(strategy.can_lock(&b, &low), CanLockResult::Success));
        strategy.lock(&b, low.clone());

        let high = info(&strategy, "urgent", Priority::High(PriorityBehavior::Exclusive));
        assert!(matches!(
            strategy.can_lock(&b, &high),
            CanLockResult::SuccessWithPrecedingCancellation(_)
        ));
    }

    /// A strictly higher-priority arrival preempts even an `Exclusive` lower
    /// one — `Exclusive` only protects against equal-or-lower priority.
    #[test]
    fn higher_priority_preempts_even_exclusive_lower() {
        let strategy = PriorityBasedStrategy::new();
        let b = boundary("screen.feed");

        let low = info(&strategy, "critical", Priority::Low(PriorityBehavior::Exclusive));
        strategy.lock(&b, low.clone());

        let high = info(&strategy, "urgent", Priority::High(PriorityBehavior::Replaceable));
        assert!(matches!(
            strategy.can_lock(&b, &high),
            CanLockResult::SuccessWithPrecedingCancellation(_)
        ));
    }

    #[test]
    fn equal_priority_exclusive_blocks() {
        let strategy = PriorityBasedStrategy::new();
        let b = boundary("screen.feed");

        let first = info(&strategy, "a", Priority::High(PriorityBehavior::Exclusive));
        strategy.lock(&b, first.clone());

        let second = info(&strategy, "b", Priority::High(PriorityBehavior::Replaceable));
        assert!(matches!(strategy.can_lock(&b, &second), CanLockResult::Cancel(_)));
    }

    #[test]
    fn equal_priority_replaceable_is_preempted() {
        let strategy = PriorityBasedStrategy::new();
        let b = boundary("screen.feed");

        let first = info(&strategy, "a", Priority::High(PriorityBehavior::Replaceable));
        strategy.lock(&b, first.clone());

        let second = info(&strategy, "b", Priority::High(PriorityBehavior::Replaceable));
        assert!(matches!(
            strategy.can_lock(&b, &second),
            CanLockResult::SuccessWithPrecedingCancellation(_)
        ));
    }

    #[test]
    fn none_priority_never_conflicts_or_blocks() {
        let strategy = PriorityBasedStrategy::new();
        let b = boundary("screen.feed");

        let high = info(&strategy, "urgent", Priority::High(PriorityBehavior::Exclusive));
        strategy.lock(&b, high.clone());

        let none = info(&strategy, "background", Priority::None);
        assert!(matches!(strategy.can_lock(&b, &none), CanLockResult::Success));
    }

    #[test]
    fn lower_priority_arrival_is_blocked_by_existing_higher() {
        let strategy = PriorityBasedStrategy::new();
        let b = boundary("screen.feed");

        let high = info(&strategy, "urgent", Priority::High(PriorityBehavior::Replaceable));
        strategy.lock(&b, high.clone());

        let low = info(&strategy, "refresh", Priority::Low(PriorityBehavior::Replaceable));
        assert!(matches!(strategy.can_lock(&b, &low), CanLockResult::Cancel(_)));
    }
}
