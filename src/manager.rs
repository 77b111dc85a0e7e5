//! Process-wide facade over a [`StrategyRegistry`], with a scoped override
//! for tests that need an isolated registry instead of the shared default,
//! plus the small set of global defaults every strategy consults.

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

use crate::debug::{DebugFormat, DebugTable};
use crate::info::LockmanInfo;
use crate::unlock::UnlockOption;

/// The process-wide default registry, populated with the five built-in
/// strategies under their canonical ids on first access.
fn default_registry() -> &'static Arc<crate::registry::StrategyRegistry> {
    static REGISTRY: OnceLock<Arc<crate::registry::StrategyRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = crate::registry::StrategyRegistry::new();
        registry
            .register::<crate::strategy::single_execution::SingleExecutionInfo>(Arc::new(
                crate::strategy::single_execution::SingleExecutionStrategy::new(),
            ))
            .expect("canonical strategy ids do not collide at first initialization");
        registry
            .register::<crate::strategy::priority_based::PriorityBasedInfo>(Arc::new(
                crate::strategy::priority_based::PriorityBasedStrategy::new(),
            ))
            .expect("canonical strategy ids do not collide at first initialization");
        registry
            .register::<crate::strategy::group_coordination::GroupCoordinationInfo>(Arc::new(
                crate::strategy::group_coordination::GroupCoordinationStrategy::new(),
            ))
            .expect("canonical strategy ids do not collide at first initialization");
        registry
            .register::<crate::strategy::concurrency_limited::ConcurrencyLimitedInfo>(Arc::new(
                crate::strategy::concurrency_limited::ConcurrencyLimitedStrategy::new(),
            ))
            .expect("canonical strategy ids do not collide at first initialization");
        registry
            .register::<crate::strategy::dynamic_condition::DynamicConditionInfo>(Arc::new(
                crate::strategy::dynamic_condition::DynamicConditionStrategy::new(),
            ))
            .expect("canonical strategy ids do not collide at first initialization");
        Arc::new(registry)
    })
}

thread_local! {
    /// A stack of test-scoped registry overrides, innermost last. Empty in
    /// normal operation, in which case [`LockmanManager::container`] falls
    /// back to the process-wide default.
    static TEST_OVERRIDE: RefCell<Vec<Arc<crate::registry::StrategyRegistry>>> = const { RefCell::new(Vec::new()) };
}

/// Global defaults consulted by callers that don't pin their own choice —
/// not mutable configuration in the file/env sense (the core has neither),
/// just a `Default`-constructed value the host application may read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockmanConfig {
    /// `unlock_option` a caller gets if it doesn't specify its own.
    pub default_unlock_option: UnlockOption,
    /// Whether `acquire` emits a `tracing` span for every `can_lock` call.
    /// Disabling this only silences the span; refusals still log a warning.
    pub trace_can_lock: bool,
}

impl Default for LockmanConfig {
    fn default() -> Self {
        Self { default_unlock_option: UnlockOption::Immediate, trace_can_lock: true }
    }
}

/// Entry point applications use instead of constructing a [`StrategyRegistry`]
/// directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockmanManager;

impl LockmanManager {
    /// The registry in effect for the current thread: the innermost
    /// [`with_test_container`](Self::with_test_container) override if one is
    /// active, otherwise the shared process-wide default.
    pub fn container(&self) -> Arc<crate::registry::StrategyRegistry> {
        TEST_OVERRIDE.with(|stack| stack.borrow().last().cloned()).unwrap_or_else(|| default_registry().clone())
    }

    /// Global defaults. Always `LockmanConfig::default()` today — there is
    /// no mutation surface, since the core persists no configuration of its
    /// own across calls.
    pub fn config(&self) -> LockmanConfig {
        LockmanConfig::default()
    }

    /// Releases every lock held by every registered strategy, across every
    /// boundary. Intended for test teardown and process shutdown, not
    /// steady-state use.
    pub fn cleanup(&self) {
        tracing::debug!(count = self.container().count(), "cleaning up all registered strategies");
        self.container().cleanup_all();
    }

    /// Runs `body` with `registry` in effect for
    /// [`container`](Self::container) on this thread, for the duration of
    /// the call, then restores whatever was in effect before. Nested calls
    /// stack correctly.
    pub fn with_test_container<R>(&self, registry: Arc<crate::registry::StrategyRegistry>, body: impl FnOnce() -> R) -> R {
        TEST_OVERRIDE.with(|stack| stack.borrow_mut().push(registry));
        let result = body();
        TEST_OVERRIDE.with(|stack| {
            stack.borrow_mut().pop();
        });
        result
    }

    /// Renders held locks as a debug table, for logging or test assertions.
    /// `strategies` is the list of `(label, current_locks)` pairs the caller
    /// wants shown — the manager itself has no generic way to enumerate
    /// every registered strategy's locks, since each has its own concrete
    /// `LockmanInfo` type.
    pub fn debug<I: LockmanInfo>(
        &self,
        strategies: &[(&str, &std::collections::HashMap<crate::boundary::AnyBoundaryId, Vec<I>>)],
        format: DebugFormat,
    ) -> String {
        DebugTable::render(strategies, format)
    }
}
