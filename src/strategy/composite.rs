//! Combines 2 to 5 strategies into one, evaluated together against one
//! combined lock info.
//!
//! A `CompositeStrategyN` is itself a [`LockmanStrategy`]: its `can_lock`
//! walks its members in declaration order, short-circuiting on the first
//! `Cancel` and otherwise aggregating any `SuccessWithPrecedingCancellation`s
//! it collects along the way. `lock` runs in declaration order; `unlock`
//! runs in reverse, so a member that depends on an earlier one's side effect
//! tears down before its dependency does.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::boundary::AnyBoundaryId;
use crate::error::LockmanError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;

use super::{CanLockResult, LockmanStrategy};

fn fold_can_lock_results(results: Vec<CanLockResult>) -> CanLockResult {
    let mut cancellations = Vec::new();
    for result in results {
        match result {
            CanLockResult::Success => {}
            CanLockResult::SuccessWithPrecedingCancellation(err) => cancellations.push(err),
            CanLockResult::Cancel(err) => return CanLockResult::Cancel(err),
        }
    }
    match cancellations.len() {
        0 => CanLockResult::Success,
        1 => CanLockResult::SuccessWithPrecedingCancellation(cancellations.remove(0)),
        _ => CanLockResult::SuccessWithPrecedingCancellation(LockmanError::Composite(cancellations)),
    }
}

macro_rules! composite_strategy {
    ($strategy:ident, $info:ident, $arity:expr, [$($generic:ident : $field:ident),+ $(,)?]) => {
        #[doc = concat!("Combined lock info for [`", stringify!($strategy), "`].")]
        #[derive(Clone)]
        pub struct $info<$($generic: LockmanInfo),+> {
            strategy_id: StrategyId,
            action_id: String,
            unique_id: Uuid,
            $(pub $field: $generic),+
        }

        impl<$($generic: LockmanInfo),+> $info<$($generic),+> {
            pub fn new(action_id: impl Into<String>, $($field: $generic),+) -> Self {
                Self {
                    strategy_id: StrategyId::composite($arity),
                    action_id: action_id.into(),
                    unique_id: Uuid::new_v4(),
                    $($field),+
                }
            }
        }

        impl<$($generic: LockmanInfo),+> std::fmt::Debug for $info<$($generic),+> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($info))
                    .field("action_id", &self.action_id)
                    .field("unique_id", &self.unique_id)
                    $(.field(stringify!($field), &self.$field))+
                    .finish()
            }
        }

        impl<$($generic: LockmanInfo),+> PartialEq for $info<$($generic),+> {
            fn eq(&self, other: &Self) -> bool {
                self.unique_id == other.unique_id
            }
        }
        impl<$($generic: LockmanInfo),+> Eq for $info<$($generic),+> {}

        impl<$($generic: LockmanInfo),+> LockmanInfo for $info<$($generic),+> {
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
                $(self.$field.is_cancellation_target())||+
            }
            fn debug_description(&self) -> String {
                let mut parts = Vec::new();
                $(parts.push(self.$field.debug_description());)+
                format!("action={} members=[{}]", self.action_id, parts.join(", "))
            }
        }

        #[doc = concat!("Combines ", stringify!($arity), " strategies into one.")]
        #[derive(Debug)]
        pub struct $strategy<$($generic: LockmanInfo),+> {
            id: StrategyId,
            $($field: Arc<dyn LockmanStrategy<$generic>>),+
        }

        impl<$($generic: LockmanInfo),+> $strategy<$($generic),+> {
            pub fn new($($field: Arc<dyn LockmanStrategy<$generic>>),+) -> Self {
                Self { id: StrategyId::composite($arity), $($field),+ }
            }
        }

        impl<$($generic: LockmanInfo),+> LockmanStrategy<$info<$($generic),+>> for $strategy<$($generic),+> {
            fn strategy_id(&self) -> StrategyId {
                self.id.clone()
            }

            fn can_lock(&self, boundary: &AnyBoundaryId, info: &$info<$($generic),+>) -> CanLockResult {
                let results = vec![$(self.$field.can_lock(boundary, &info.$field)),+];
                fold_can_lock_results(results)
            }

            fn lock(&self, boundary: &AnyBoundaryId, info: $info<$($generic),+>) {
                let $info { $($field),+, .. } = info;
                $(self.$field.lock(boundary, $field);)+
            }

            fn unlock(&self, boundary: &AnyBoundaryId, info: &$info<$($generic),+>) {
                composite_strategy!(@unlock_rev self, boundary, info, [$($field),+]);
            }

            fn cleanup(&self) {
                $(self.$field.cleanup();)+
            }

            fn cleanup_boundary(&self, boundary: &AnyBoundaryId) {
                $(self.$field.cleanup_boundary(boundary);)+
            }

            fn current_locks(&self) -> HashMap<AnyBoundaryId, Vec<$info<$($generic),+>>> {
                // Members are always locked and unlocked together, so their
                // per-boundary lists stay the same length; zip positionally.
                let mut maps = vec![$(self.$field.current_locks()),+];
                let mut out: HashMap<AnyBoundaryId, Vec<$info<$($generic),+>>> = HashMap::new();
                if let Some(first) = maps.first() {
                    for boundary in first.keys() {
                        out.insert(boundary.clone(), Vec::new());
                    }
                }
                for boundary in out.keys().cloned().collect::<Vec<_>>() {
                    let lists: Vec<_> = maps.iter_mut().map(|m| m.remove(&boundary).unwrap_or_default()).collect();
                    let len = lists.iter().map(Vec::len).min().unwrap_or(0);
                    let mut combined = Vec::with_capacity(len);
                    let mut iters: Vec<_> = lists.into_iter().map(|v| v.into_iter()).collect();
                    for _ in 0..len {
                        let mut fields = iters.iter_mut().map(|it| it.next().unwrap());
                        combined.push($info {
                            strategy_id: self.id.clone(),
                            action_id: String::new(),
                            unique_id: Uuid::new_v4(),
                            $($field: fields.next().unwrap()),+
                        });
                    }
                    out.insert(boundary, combined);
                }
                out
            }
        }
    };

    (@unlock_rev $self:ident, $boundary:ident, $info:ident, [$first:ident $(, $rest:ident)*]) => {
        composite_strategy!(@unlock_rev $self, $boundary, $info, [$($rest),*]);
        $self.$first.unlock($boundary, &$info.$first);
    };
    (@unlock_rev $self:ident, $boundary:ident, $info:ident, []) => {};
}

composite_strategy!(CompositeStrategy2, CompositeInfo2, 2, [I1: i1, I2: i2]);
composite_strategy!(CompositeStrategy3, CompositeInfo3, 3, [I1: i1, I2: i2, I3: i3]);
composite_strategy!(CompositeStrategy4, CompositeInfo4, 4, [I1: i1, I2: i2, I3: i3, I4: i4]);
composite_strategy!(CompositeStrategy5, CompositeInfo5, 5, [I1: i1, I2: i2, I3: i3, I4: i4, I5: i5]);
