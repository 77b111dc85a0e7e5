//! Timing control for when a released lock actually unlocks.

use std::time::Duration;

/// Controls when `UnlockToken::release` actually invokes the strategy's
/// `unlock`, relative to external events in the caller's effect system.
///
/// The core defines this enum and consults it at release time; it does not
/// itself own an executor. External collaborators (the host framework's
/// effect integration) supply whatever run loop, transition signal, or timer
/// is needed to honor anything other than `Immediate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnlockOption {
    /// Call `unlock` inline, synchronously, as soon as `release` is invoked.
    Immediate,
    /// Defer `unlock` until the caller's main run loop next turns.
    MainRunLoop,
    /// Defer `unlock` until the caller signals that a transition completed.
    Transition,
    /// Defer `unlock` until `duration` has elapsed.
    Delayed(Duration),
}

impl Default for UnlockOption {
    fn default() -> Self {
        UnlockOption::Immediate
    }
}
