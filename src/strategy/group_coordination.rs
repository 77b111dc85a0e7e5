//! Leader/member coordination across one or more named groups.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::boundary::AnyBoundaryId;
use crate::error::GroupCoordinationError;
use crate::id::StrategyId;
use crate::info::LockmanInfo;
use crate::state::LockState;

use super::{CanLockResult, LockmanStrategy};

/// A named group within a boundary that members and a leader coordinate on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        GroupId(value.to_string())
    }
}

/// Precondition a [`CoordinationRole::Leader`] requires of a group before it
/// may enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPolicy {
    /// Group must have neither an existing leader nor any members.
    EmptyGroup,
    /// Group must have no members; an existing leader is replaced.
    WithoutMembers,
    /// Group must have no leader; existing members are adopted as-is.
    WithoutLeader,
}

/// Role an acquisition plays within the groups it requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationRole {
    /// Not part of group coordination; still subject to the action-id dedup
    /// check against every requested group.
    None,
    /// Joins every requested group; each must already have a participant.
    Member,
    /// Attempts to become leader of every requested group, each subject to
    /// its own `EntryPolicy`.
    Leader(EntryPolicy),
}

/// Lock info for [`GroupCoordinationStrategy`].
///
/// `group_ids` is expected to be non-empty; an acquisition names at least
/// one group to join.
#[derive(Debug, Clone)]
pub struct GroupCoordinationInfo {
    strategy_id: StrategyId,
    action_id: String,
    unique_id: Uuid,
    pub group_ids: Vec<GroupId>,
    pub role: CoordinationRole,
}

impl GroupCoordinationInfo {
    pub fn new(
        strategy_id: StrategyId,
        action_id: impl Into<String>,
        group_ids: impl IntoIterator<Item = GroupId>,
        role: CoordinationRole,
    ) -> Self {
        Self {
            strategy_id,
            action_id: action_id.into(),
            unique_id: Uuid::new_v4(),
            group_ids: group_ids.into_iter().collect(),
            role,
        }
    }
}

impl PartialEq for GroupCoordinationInfo {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}
impl Eq for GroupCoordinationInfo {}

impl LockmanInfo for GroupCoordinationInfo {
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
        !matches!(self.role, CoordinationRole::None)
    }
    fn debug_description(&self) -> String {
        let groups: Vec<_> = self.group_ids.iter().map(GroupId::to_string).collect();
        format!("action={} groups=[{}] role={:?}", self.action_id, groups.join(", "), self.role)
    }
}

/// A group's state is the set of currently-held records keyed by `group_id`:
/// at most one of them has `role == Leader(_)`, the rest have
/// `role == Member`. An acquisition's decision is evaluated independently
/// against every group it requests, failing at the first violating group.
#[derive(Debug)]
pub struct GroupCoordinationStrategy {
    id: StrategyId,
    state: LockState<GroupCoordinationInfo, GroupId>,
}

impl GroupCoordinationStrategy {
    pub fn new() -> Self {
        Self {
            id: StrategyId::new(StrategyId::GROUP_COORDINATION),
            state: LockState::new(|info| info.group_ids.clone()),
        }
    }

    fn participants(&self, boundary: &AnyBoundaryId, group_id: &GroupId) -> Vec<GroupCoordinationInfo> {
        self.state.current_by_key(boundary, group_id)
    }

    fn leader_of(&self, boundary: &AnyBoundaryId, group_id: &GroupId) -> Option<GroupCoordinationInfo> {
        self.participants(boundary, group_id).into_iter().find(|existing| matches!(existing.role, CoordinationRole::Leader(_)))
    }

    fn member_count(&self, boundary: &AnyBoundaryId, group_id: &GroupId) -> usize {
        self.participants(boundary, group_id)
            .into_iter()
            .filter(|existing| matches!(existing.role, CoordinationRole::Member))
            .count()
    }

    fn action_id_present(&self, boundary: &AnyBoundaryId, group_id: &GroupId, action_id: &str) -> bool {
        self.participants(boundary, group_id).iter().any(|existing| existing.action_id() == action_id)
    }

    /// Checks one group against a `Leader(policy)` request, returning the
    /// violation (if any) that group raises.
    fn leader_entry_violation(
        &self,
        boundary: &AnyBoundaryId,
        group_id: &GroupId,
        policy: EntryPolicy,
    ) -> Option<GroupCoordinationError> {
        let leader = self.leader_of(boundary, group_id);
        let members = self.member_count(boundary, group_id);
        match policy {
            EntryPolicy::EmptyGroup => {
                if let Some(existing) = leader {
                    let CoordinationRole::Leader(existing_policy) = existing.role else { unreachable!() };
                    Some(GroupCoordinationError::BlockedByExclusiveLeader {
                        group_id: group_id.to_string(),
                        policy: existing_policy,
                    })
                } else if members > 0 {
                    Some(GroupCoordinationError::LeaderCannotJoinNonEmptyGroup { group_id: group_id.to_string() })
                } else {
                    None
                }
            }
            EntryPolicy::WithoutMembers => {
                if members > 0 {
                    Some(GroupCoordinationError::LeaderCannotJoinNonEmptyGroup { group_id: group_id.to_string() })
                } else {
                    None
                }
            }
            EntryPolicy::WithoutLeader => leader.map(|existing| {
                let CoordinationRole::Leader(existing_policy) = existing.role else { unreachable!() };
                GroupCoordinationError::BlockedByExclusiveLeader { group_id: group_id.to_string(), policy: existing_policy }
            }),
        }
    }
}

impl Default for GroupCoordinationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LockmanStrategy<GroupCoordinationInfo> for GroupCoordinationStrategy {
    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }

    fn can_lock(&self, boundary: &AnyBoundaryId, info: &GroupCoordinationInfo) -> CanLockResult {
        match info.role {
            CoordinationRole::None => {
                for group_id in &info.group_ids {
                    if self.action_id_present(boundary, group_id, info.action_id()) {
                        return CanLockResult::Cancel(
                            GroupCoordinationError::ActionAlreadyInGroup {
                                group_id: group_id.to_string(),
                                action_id: info.action_id().to_string(),
                            }
                            .into(),
                        );
                    }
                }
                CanLockResult::Success
            }
            CoordinationRole::Member => {
                for group_id in &info.group_ids {
                    if self.participants(boundary, group_id).is_empty() {
                        return CanLockResult::Cancel(
                            GroupCoordinationError::MemberCannotJoinEmptyGroup { group_id: group_id.to_string() }
                                .into(),
                        );
                    }
                }
                for group_id in &info.group_ids {
                    if self.action_id_present(boundary, group_id, info.action_id()) {
                        return CanLockResult::Cancel(
                            GroupCoordinationError::ActionAlreadyInGroup {
                                group_id: group_id.to_string(),
                                action_id: info.action_id().to_string(),
                            }
                            .into(),
                        );
                    }
                }
                CanLockResult::Success
            }
            CoordinationRole::Leader(policy) => {
                for group_id in &info.group_ids {
                    if let Some(err) = self.leader_entry_violation(boundary, group_id, policy) {
                        return CanLockResult::Cancel(err.into());
                    }
                }
                CanLockResult::Success
            }
        }
    }

    fn lock(&self, boundary: &AnyBoundaryId, info: GroupCoordinationInfo) {
        self.state.add(boundary, info);
    }

    fn unlock(&self, boundary: &AnyBoundaryId, info: &GroupCoordinationInfo) {
        self.state.remove(boundary, info);
    }

    fn cleanup(&self) {
        self.state.remove_all();
    }

    fn cleanup_boundary(&self, boundary: &AnyBoundaryId) {
        self.state.remove_all_boundary(boundary);
    }

    fn current_locks(&self) -> HashMap<AnyBoundaryId, Vec<GroupCoordinationInfo>> {
        self.state.all_locks()
    }
}
