//! Error taxonomy: one concrete enum per strategy, unified under one
//! top-level type so callers matching on `LockmanError` don't need to know
//! which strategy produced it.

use thiserror::Error;

use crate::strategy::concurrency_limited::ConcurrencyLimitedInfo;
use crate::strategy::group_coordination::EntryPolicy;
use crate::strategy::priority_based::PriorityBasedInfo;
use crate::strategy::single_execution::SingleExecutionInfo;

/// Errors produced by [`SingleExecutionStrategy`](crate::strategy::single_execution::SingleExecutionStrategy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SingleExecutionError {
    #[error("boundary is already locked by {existing:?}")]
    BoundaryAlreadyLocked { existing: SingleExecutionInfo },
    #[error("action is already running: {existing:?}")]
    ActionAlreadyRunning { existing: SingleExecutionInfo },
}

/// Errors produced by [`PriorityBasedStrategy`](crate::strategy::priority_based::PriorityBasedStrategy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriorityBasedError {
    #[error("a strictly higher-priority action is already running: {existing:?}")]
    BlockedByHigherPriority { existing: PriorityBasedInfo },
    #[error("an equal-priority exclusive action is already running: {existing:?}")]
    SamePriorityConflict { existing: PriorityBasedInfo },
    #[error("preempts a lower-or-equal-priority action: {preempted:?}")]
    PrecedingActionCancelled { preempted: PriorityBasedInfo },
}

/// Errors produced by [`GroupCoordinationStrategy`](crate::strategy::group_coordination::GroupCoordinationStrategy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroupCoordinationError {
    #[error("leader cannot join non-empty group {group_id:?}")]
    LeaderCannotJoinNonEmptyGroup { group_id: String },
    #[error("member cannot join empty group {group_id:?}")]
    MemberCannotJoinEmptyGroup { group_id: String },
    #[error("action {action_id:?} is already present in group {group_id:?}")]
    ActionAlreadyInGroup { group_id: String, action_id: String },
    #[error("group {group_id:?} already has a leader holding it exclusively under {policy:?}")]
    BlockedByExclusiveLeader { group_id: String, policy: EntryPolicy },
}

/// Errors produced by [`ConcurrencyLimitedStrategy`](crate::strategy::concurrency_limited::ConcurrencyLimitedStrategy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConcurrencyLimitedError {
    #[error("concurrency limit reached for {concurrency_id:?}: {current}/{limit} active")]
    LimitReached { concurrency_id: String, current: u32, limit: u32, existing: Vec<ConcurrencyLimitedInfo> },
}

/// Errors produced by [`DynamicConditionStrategy`](crate::strategy::dynamic_condition::DynamicConditionStrategy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DynamicConditionError {
    #[error("dynamic condition refused acquisition: {reason}")]
    ConditionFailed { reason: String },
}

/// Errors produced by the strategy registry, never wrapped into
/// [`LockmanError`] — registration is a setup-time concern, distinct from the
/// per-acquisition decisions the other error types describe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyRegistrationError {
    #[error("a strategy is already registered under {0}")]
    AlreadyRegistered(crate::id::StrategyId),
    #[error("no strategy registered under {0}")]
    NotRegistered(crate::id::StrategyId),
    #[error("strategy registered under {id} does not accept lock info of this type")]
    TypeMismatch { id: crate::id::StrategyId },
}

/// The unified error type threaded through [`CanLockResult`](crate::strategy::CanLockResult)
/// and the acquisition protocol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LockmanError {
    #[error(transparent)]
    SingleExecution(#[from] SingleExecutionError),
    #[error(transparent)]
    PriorityBased(#[from] PriorityBasedError),
    #[error(transparent)]
    GroupCoordination(#[from] GroupCoordinationError),
    #[error(transparent)]
    ConcurrencyLimited(#[from] ConcurrencyLimitedError),
    #[error(transparent)]
    DynamicCondition(#[from] DynamicConditionError),

    /// Aggregates the errors of multiple preceding cancellations produced by
    /// a composite strategy, in the declaration order of its members.
    #[error("{0:?}")]
    Composite(Vec<LockmanError>),
}
