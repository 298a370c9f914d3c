//! Access-scoped selection of worker models.

use super::{GroupId, StateLoadOption, WorkerModel};
use std::collections::BTreeSet;

/// Which owning groups a listing may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupScope {
    /// Every model, regardless of owner.
    All,
    /// Only models owned by one of these groups.
    Groups(BTreeSet<GroupId>),
}

impl GroupScope {
    /// Returns `true` when a model owned by `group_id` is in scope.
    #[must_use]
    pub fn includes(&self, group_id: GroupId) -> bool {
        match self {
            Self::All => true,
            Self::Groups(groups) => groups.contains(&group_id),
        }
    }
}

/// Selection criteria for listing worker models from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFilter {
    /// Owner scope.
    pub scope: GroupScope,
    /// Optional state predicate.
    pub state: Option<StateLoadOption>,
    /// Exclude disabled models.
    pub enabled_only: bool,
    /// Exclude restricted models.
    pub unrestricted_only: bool,
    /// Keep only models exposing this `binary` capability.
    pub binary: Option<String>,
    /// Group whose models count as official.
    pub shared_infra_group: GroupId,
}

impl ModelFilter {
    /// Creates a filter over `scope` with no other predicate.
    #[must_use]
    pub const fn new(scope: GroupScope, shared_infra_group: GroupId) -> Self {
        Self {
            scope,
            state: None,
            enabled_only: false,
            unrestricted_only: false,
            binary: None,
            shared_infra_group,
        }
    }

    /// Restricts the listing to models in the given state.
    #[must_use]
    pub const fn with_state(mut self, state: Option<StateLoadOption>) -> Self {
        self.state = state;
        self
    }

    /// Excludes disabled models.
    #[must_use]
    pub const fn enabled_only(mut self) -> Self {
        self.enabled_only = true;
        self
    }

    /// Excludes restricted models.
    #[must_use]
    pub const fn unrestricted_only(mut self) -> Self {
        self.unrestricted_only = true;
        self
    }

    /// Keeps only models exposing the given binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Evaluates every predicate except the capability one, which needs
    /// the model's capability rows.
    #[must_use]
    pub fn matches(&self, model: &WorkerModel) -> bool {
        let spec = model.spec();
        if !self.scope.includes(model.group_id()) {
            return false;
        }
        if self.enabled_only && spec.disabled {
            return false;
        }
        if self.unrestricted_only && spec.restricted {
            return false;
        }
        self.state.is_none_or(|state| match state {
            StateLoadOption::SpawnError => model.spawn_errors().count > 0,
            StateLoadOption::Disabled => spec.disabled,
            StateLoadOption::Register => model.needs_registration(),
            StateLoadOption::Deprecated => spec.is_deprecated,
            StateLoadOption::Active => !spec.is_deprecated,
            StateLoadOption::Official => model.group_id() == self.shared_infra_group,
        })
    }
}
