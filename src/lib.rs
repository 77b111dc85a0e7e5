#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//! Lockman enforces exclusive-execution locking policies for event-driven
//! applications.
//!
//! A *boundary* ([`boundary::AnyBoundaryId`]) names a scope of mutual
//! exclusion — a screen, a feature flag, a session. A *strategy*
//! ([`strategy::LockmanStrategy`]) is a pluggable policy deciding whether an
//! acquisition attempt against that boundary may proceed; this crate ships
//! five ([`strategy::single_execution`], [`strategy::priority_based`],
//! [`strategy::group_coordination`], [`strategy::concurrency_limited`],
//! [`strategy::dynamic_condition`]) plus a way to combine 2–5 of them into
//! one ([`strategy::composite`]). A [`registry::StrategyRegistry`] holds
//! registered strategy instances by id; [`acquisition::acquire`] resolves
//! one, consults it, and on success hands back an [`acquisition::UnlockToken`]
//! the caller releases when its guarded work finishes.
//!
//! Strategies never block. `can_lock` is a pure function over a state
//! snapshot; nothing in this crate spawns a thread, waits on a channel, or
//! owns an executor — timing decisions like *when* to call
//! `UnlockToken::release` belong to the host application's effect system,
//! which is why [`unlock::UnlockOption`] is a value the core reports rather
//! than a schedule it carries out.
//!
//! Calls into the acquisition protocol are instrumented with `tracing` at
//! `debug`/`warn` level; attach a subscriber (e.g. `tracing_subscriber`) in
//! the host application to observe them.

pub mod acquisition;
pub mod boundary;
pub mod debug;
pub mod error;
pub mod id;
pub mod info;
pub mod manager;
pub mod registry;
pub mod state;
pub mod strategy;
pub mod unlock;

pub use acquisition::{acquire, AcquireOutcome, UnlockToken};
pub use boundary::{AnyBoundaryId, LockmanBoundaryId};
pub use error::{
    ConcurrencyLimitedError, DynamicConditionError, GroupCoordinationError, LockmanError, PriorityBasedError,
    SingleExecutionError, StrategyRegistrationError,
};
pub use id::StrategyId;
pub use info::{LockmanAction, LockmanInfo};
pub use manager::{LockmanConfig, LockmanManager};
pub use registry::StrategyRegistry;
pub use strategy::{CanLockResult, LockmanStrategy};
pub use unlock::UnlockOption;
