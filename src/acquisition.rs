//! The acquire/release protocol: resolving a strategy, consulting it, and
//! handing back a token the caller releases when the guarded work finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::boundary::{AnyBoundaryId, LockmanBoundaryId};
use crate::error::{LockmanError, StrategyRegistrationError};
use crate::info::LockmanInfo;
use crate::registry::StrategyRegistry;
use crate::strategy::{CanLockResult, LockmanStrategy};
use crate::unlock::UnlockOption;

/// A held lock, returned by a successful `acquire`. Dropping this without
/// calling [`release`](UnlockToken::release) leaks the lock record until the
/// boundary is cleaned up wholesale — callers are expected to always release.
pub struct UnlockToken<I: LockmanInfo> {
    strategy: Arc<dyn LockmanStrategy<I>>,
    boundary: AnyBoundaryId,
    info: I,
    unlock_option: UnlockOption,
    released: AtomicBool,
}

impl<I: LockmanInfo> UnlockToken<I> {
    fn new(strategy: Arc<dyn LockmanStrategy<I>>, boundary: AnyBoundaryId, info: I, unlock_option: UnlockOption) -> Self {
        Self { strategy, boundary, info, unlock_option, released: AtomicBool::new(false) }
    }

    /// How the caller's effect system should time its call to `release`.
    /// The core only reports this preference; it does not schedule anything
    /// itself — `release` always unlocks synchronously the moment it's called.
    pub fn unlock_option(&self) -> UnlockOption {
        self.unlock_option
    }

    /// Releases the held lock. Idempotent: a second call is a no-op.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.strategy.unlock(&self.boundary, &self.info);
    }
}

impl<I: LockmanInfo + std::fmt::Debug> std::fmt::Debug for UnlockToken<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockToken")
            .field("boundary", &self.boundary)
            .field("info", &self.info)
            .field("unlock_option", &self.unlock_option)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish()
    }
}

/// Outcome of [`acquire`].
#[derive(Debug)]
pub enum AcquireOutcome<I: LockmanInfo> {
    /// Acquired cleanly; nothing else was cancelled.
    Acquired(UnlockToken<I>),
    /// Acquired, but a preceding action was cancelled to make room — the
    /// caller must externally cancel whatever the error identifies.
    AcquiredPreempting(UnlockToken<I>, LockmanError),
    /// Acquisition refused; the caller must not proceed with its action.
    Refused(LockmanError),
    /// The strategy `info.strategy_id()` names is not registered, or is
    /// registered for a different `LockmanInfo` type.
    Error(StrategyRegistrationError),
}

/// Resolves the strategy `info.strategy_id()` names in `registry`, asks it
/// whether `info` may lock `boundary`, and on success records the lock.
#[tracing::instrument(level = "debug", skip(registry, info), fields(action_id = info.action_id()))]
pub fn acquire<B, I>(
    registry: &StrategyRegistry,
    boundary: &B,
    info: I,
    unlock_option: UnlockOption,
) -> AcquireOutcome<I>
where
    B: LockmanBoundaryId + Clone,
    I: LockmanInfo,
{
    let any_boundary = AnyBoundaryId::new(boundary);
    let strategy = match registry.resolve::<I>(info.strategy_id()) {
        Ok(strategy) => strategy,
        Err(err) => {
            tracing::warn!(error = %err, "failed to resolve strategy for acquisition");
            return AcquireOutcome::Error(err);
        }
    };

    match strategy.can_lock(&any_boundary, &info) {
        CanLockResult::Success => {
            strategy.lock(&any_boundary, info.clone());
            AcquireOutcome::Acquired(UnlockToken::new(strategy, any_boundary, info, unlock_option))
        }
        CanLockResult::SuccessWithPrecedingCancellation(cancelled) => {
            strategy.lock(&any_boundary, info.clone());
            AcquireOutcome::AcquiredPreempting(UnlockToken::new(strategy, any_boundary, info, unlock_option), cancelled)
        }
        CanLockResult::Cancel(err) => {
            tracing::debug!(error = %err, "acquisition refused");
            AcquireOutcome::Refused(err)
        }
    }
}
