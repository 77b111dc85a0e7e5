//! Per-acquisition lock records and the action trait that produces them.

use std::fmt;

use uuid::Uuid;

use crate::id::StrategyId;
use crate::unlock::UnlockOption;

/// A record describing one acquisition attempt.
///
/// Every strategy defines its own concrete type implementing `LockmanInfo`
/// (carrying whatever payload that strategy's decision needs); this trait is
/// the common surface the registry, the acquisition protocol, and the debug
/// introspection table operate on.
///
/// Two `LockmanInfo` values are equal iff their `unique_id`s are equal,
/// regardless of `action_id` or payload — implementors must honor this in
/// their `PartialEq`.
pub trait LockmanInfo: fmt::Debug + Clone + Send + Sync + 'static {
    /// Which strategy this record is meant to be passed to.
    fn strategy_id(&self) -> &StrategyId;

    /// Logical identity of the action; used for conflict detection by
    /// strategies that key on it (e.g. `SingleExecution::Action`).
    fn action_id(&self) -> &str;

    /// Freshly generated per acquisition; the primary key for unlock.
    fn unique_id(&self) -> Uuid;

    /// Whether this record participates in external cancellation.
    fn is_cancellation_target(&self) -> bool;

    /// Human-readable summary for the debug introspection table.
    fn debug_description(&self) -> String;
}

/// A caller-triggered action that can produce a `LockmanInfo` for acquisition.
pub trait LockmanAction<I: LockmanInfo> {
    /// Builds the lock info describing this action's acquisition attempt.
    fn lockman_info(&self) -> I;

    /// When the unlock token should actually release the lock, relative to
    /// external events in the caller's effect system. Defaults to immediate
    /// release.
    fn unlock_option(&self) -> UnlockOption {
        UnlockOption::Immediate
    }
}
