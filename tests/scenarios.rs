#![cfg(test)]

//! End-to-end acquisition scenarios, plus cross-cutting properties that
//! don't fit naturally inside a single strategy's own `#[cfg(test)]` module.

use std::sync::Arc;

use lockman::strategy::concurrency_limited::{ConcurrencyLimit, ConcurrencyLimitedInfo, ConcurrencyLimitedStrategy};
use lockman::strategy::group_coordination::{CoordinationRole, EntryPolicy, GroupCoordinationInfo, GroupCoordinationStrategy};
use lockman::strategy::priority_based::{Priority, PriorityBasedInfo, PriorityBasedStrategy, PriorityBehavior};
use lockman::strategy::single_execution::{SingleExecutionInfo, SingleExecutionMode, SingleExecutionStrategy};
use lockman::strategy::composite::{CompositeInfo2, CompositeStrategy2};
use lockman::{acquire, AcquireOutcome, LockmanStrategy, StrategyRegistry, UnlockOption};

fn registry() -> StrategyRegistry {
    StrategyRegistry::new()
}

/// SingleExecution/Boundary rejects duplicates.
#[test]
fn scenario_a_single_execution_boundary_rejects_duplicates() {
    let registry = registry();
    let strategy = Arc::new(SingleExecutionStrategy::new());
    let id = strategy.strategy_id();
    registry.register::<SingleExecutionInfo>(strategy).unwrap();

    let boundary = "screen.payment".to_string();
    let first = SingleExecutionInfo::new(id.clone(), "submit", SingleExecutionMode::Boundary);
    let AcquireOutcome::Acquired(token) = acquire(&registry, &boundary, first, UnlockOption::Immediate) else {
        panic!("expected first acquisition to succeed")
    };

    let second = SingleExecutionInfo::new(id, "submit", SingleExecutionMode::Boundary);
    assert!(matches!(acquire(&registry, &boundary, second, UnlockOption::Immediate), AcquireOutcome::Refused(_)));

    token.release();
}

/// SingleExecution/Action allows different actions.
#[test]
fn scenario_b_single_execution_action_allows_different_actions() {
    let registry = registry();
    let strategy = Arc::new(SingleExecutionStrategy::new());
    let id = strategy.strategy_id();
    registry.register::<SingleExecutionInfo>(strategy).unwrap();

    let boundary = "screen.payment".to_string();
    let a = SingleExecutionInfo::new(id.clone(), "a", SingleExecutionMode::Action);
    let b = SingleExecutionInfo::new(id, "b", SingleExecutionMode::Action);
    assert!(matches!(acquire(&registry, &boundary, a, UnlockOption::Immediate), AcquireOutcome::Acquired(_)));
    assert!(matches!(acquire(&registry, &boundary, b, UnlockOption::Immediate), AcquireOutcome::Acquired(_)));
}

/// PriorityBased preemption.
#[test]
fn scenario_c_priority_based_preemption() {
    let registry = registry();
    let strategy = Arc::new(PriorityBasedStrategy::new());
    let id = strategy.strategy_id();
    registry.register::<PriorityBasedInfo>(strategy).unwrap();

    let boundary = "screen.feed".to_string();
    let low = PriorityBasedInfo::new(id.clone(), "refresh", Priority::Low(PriorityBehavior::Replaceable));
    assert!(matches!(acquire(&registry, &boundary, low, UnlockOption::Immediate), AcquireOutcome::Acquired(_)));

    let high = PriorityBasedInfo::new(id, "urgent", Priority::High(PriorityBehavior::Exclusive));
    assert!(matches!(
        acquire(&registry, &boundary, high, UnlockOption::Immediate),
        AcquireOutcome::AcquiredPreempting(_, _)
    ));
}

/// GroupCoordination leader/member.
#[test]
fn scenario_d_group_coordination_leader_then_member() {
    let registry = registry();
    let strategy = Arc::new(GroupCoordinationStrategy::new());
    let id = strategy.strategy_id();
    registry.register::<GroupCoordinationInfo>(strategy).unwrap();

    let boundary = "session.42".to_string();
    let leader = GroupCoordinationInfo::new(
        id.clone(),
        "lead",
        ["checkout".into()],
        CoordinationRole::Leader(EntryPolicy::EmptyGroup),
    );
    assert!(matches!(acquire(&registry, &boundary, leader, UnlockOption::Immediate), AcquireOutcome::Acquired(_)));

    let member = GroupCoordinationInfo::new(id, "join", ["checkout".into()], CoordinationRole::Member);
    assert!(matches!(acquire(&registry, &boundary, member, UnlockOption::Immediate), AcquireOutcome::Acquired(_)));
}

/// ConcurrencyLimited refuses once the limit is reached.
#[test]
fn scenario_e_concurrency_limited() {
    let registry = registry();
    let strategy = Arc::new(ConcurrencyLimitedStrategy::new());
    let id = strategy.strategy_id();
    registry.register::<ConcurrencyLimitedInfo>(strategy).unwrap();

    let boundary = "screen.gallery".to_string();
    let limit = ConcurrencyLimit::Limited(1);
    let a = ConcurrencyLimitedInfo::new(id.clone(), "a", "downloads", limit);
    assert!(matches!(acquire(&registry, &boundary, a, UnlockOption::Immediate), AcquireOutcome::Acquired(_)));

    let b = ConcurrencyLimitedInfo::new(id, "b", "downloads", limit);
    assert!(matches!(acquire(&registry, &boundary, b, UnlockOption::Immediate), AcquireOutcome::Refused(_)));
}

/// Composite of SingleExecution(Boundary) and PriorityBased(High,Exclusive):
/// a refused composite leaves no member holding a new lock.
#[test]
fn scenario_f_composite_refusal_leaves_no_member_locked() {
    let single = Arc::new(SingleExecutionStrategy::new());
    let priority = Arc::new(PriorityBasedStrategy::new());
    let composite = CompositeStrategy2::new(single.clone(), priority.clone());
    let boundary = lockman::AnyBoundaryId::new(&"screen.checkout".to_string());

    let first = CompositeInfo2::new(
        "checkout",
        SingleExecutionInfo::new(single.strategy_id(), "checkout", SingleExecutionMode::Boundary),
        PriorityBasedInfo::new(priority.strategy_id(), "checkout", Priority::High(PriorityBehavior::Exclusive)),
    );
    assert!(matches!(composite.can_lock(&boundary, &first), lockman::CanLockResult::Success));
    composite.lock(&boundary, first);

    let second = CompositeInfo2::new(
        "checkout",
        SingleExecutionInfo::new(single.strategy_id(), "checkout", SingleExecutionMode::Boundary),
        PriorityBasedInfo::new(priority.strategy_id(), "checkout", Priority::High(PriorityBehavior::Exclusive)),
    );
    assert!(matches!(composite.can_lock(&boundary, &second), lockman::CanLockResult::Cancel(_)));

    assert_eq!(single.current_locks().get(&boundary).map(Vec::len), Some(1));
    assert_eq!(priority.current_locks().get(&boundary).map(Vec::len), Some(1));
}

/// Registry uniqueness: a second `register` under the same id fails and
/// leaves the originally registered instance resolvable and intact.
#[test]
fn registry_rejects_duplicate_registration_without_disturbing_original() {
    let registry = registry();
    let original = Arc::new(SingleExecutionStrategy::new());
    let id = original.strategy_id();
    registry.register::<SingleExecutionInfo>(original).unwrap();

    let duplicate = Arc::new(SingleExecutionStrategy::new());
    assert!(registry.register::<SingleExecutionInfo>(duplicate).is_err());

    let resolved = registry.resolve::<SingleExecutionInfo>(&id).unwrap();
    let boundary = "screen.payment".to_string();
    let info = SingleExecutionInfo::new(id, "submit", SingleExecutionMode::Boundary);
    resolved.lock(&lockman::AnyBoundaryId::new(&boundary), info);
    assert_eq!(resolved.current_locks().len(), 1);
}

/// Idempotent release: a token released twice unlocks exactly once.
#[test]
fn release_twice_unlocks_exactly_once() {
    let registry = registry();
    let strategy = Arc::new(SingleExecutionStrategy::new());
    let id = strategy.strategy_id();
    registry.register::<SingleExecutionInfo>(strategy.clone()).unwrap();

    let boundary = "screen.payment".to_string();
    let info = SingleExecutionInfo::new(id, "submit", SingleExecutionMode::Boundary);
    let AcquireOutcome::Acquired(token) = acquire(&registry, &boundary, info, UnlockOption::Immediate) else {
        panic!("expected Acquired")
    };

    token.release();
    assert!(strategy.current_locks().get(&lockman::AnyBoundaryId::new(&boundary)).is_none());
    token.release();
    assert!(strategy.current_locks().get(&lockman::AnyBoundaryId::new(&boundary)).is_none());
}
