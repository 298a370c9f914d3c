//! Identity of a user listing worker models.

use super::GroupId;
use std::collections::BTreeSet;

/// User on whose behalf models are listed.
///
/// Administrators see every model; other users see the models owned by
/// their groups and by the shared infrastructure group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    username: String,
    admin: bool,
    groups: BTreeSet<GroupId>,
}

impl Requester {
    /// Creates a non-administrator requester belonging to `groups`.
    #[must_use]
    pub fn member(username: impl Into<String>, groups: impl IntoIterator<Item = GroupId>) -> Self {
        Self {
            username: username.into(),
            admin: false,
            groups: groups.into_iter().collect(),
        }
    }

    /// Creates an administrator requester.
    #[must_use]
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            admin: true,
            groups: BTreeSet::new(),
        }
    }

    /// Returns the requester's username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.admin
    }

    /// Returns the groups the requester belongs to.
    #[must_use]
    pub const fn groups(&self) -> &BTreeSet<GroupId> {
        &self.groups
    }
}
