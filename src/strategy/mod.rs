//! Pluggable locking policies.
//!
//! A strategy decides, from current [`LockState`](crate::state::LockState),
//! whether an acquisition may proceed. Strategies never block: `can_lock` is
//! a pure function over a state snapshot, `lock`/`unlock` are short,
//! synchronous, mutex-guarded mutations.

pub mod composite;
pub mod concurrency_limited;
pub mod dynamic_condition;
pub mod group_coordination;
pub mod priority_based;
pub mod single_execution;

use std::collections::HashMap;
use std::fmt;

use crate::boundary::AnyBoundaryId;
use crate::error::LockmanError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;

/// Outcome of a `can_lock` check.
#[derive(Debug, Clone)]
pub enum CanLockResult {
    /// Acquisition may proceed without preempting anything.
    Success,
    /// Acquisition may proceed, but the caller must externally cancel the
    /// preceding action(s) identified by the carried error.
    SuccessWithPrecedingCancellation(LockmanError),
    /// Acquisition is refused; the action must not proceed.
    Cancel(LockmanError),
}

/// A policy object deciding whether acquisitions may proceed, and the
/// bookkeeping that tracks which are currently held.
///
/// Implementors must never block; `can_lock` must be pure over the current
/// snapshot of state.
pub trait LockmanStrategy<I: LockmanInfo>: fmt::Debug + Send + Sync {
    /// The id this strategy instance is registered under.
    fn strategy_id(&self) -> StrategyId;

    /// Pure decision over current state; does not mutate.
    ///
    /// Precondition for a subsequent `lock` call: the most recent `can_lock`
    /// for the same `(boundary, info.unique_id())` returned a non-`Cancel`
    /// result.
    fn can_lock(&self, boundary: &AnyBoundaryId, info: &I) -> CanLockResult;

    /// Records `info` as held in `boundary`.
    fn lock(&self, boundary: &AnyBoundaryId, info: I);

    /// Removes exactly the record with `info.unique_id()`.
    fn unlock(&self, boundary: &AnyBoundaryId, info: &I);

    /// Releases every record this strategy holds, across all boundaries.
    fn cleanup(&self);

    /// Releases every record this strategy holds within `boundary`.
    fn cleanup_boundary(&self, boundary: &AnyBoundaryId);

    /// Snapshot of everything currently held, for introspection.
    fn current_locks(&self) -> HashMap<AnyBoundaryId, Vec<I>>;
}
