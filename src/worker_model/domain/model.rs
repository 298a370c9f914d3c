//! Worker model aggregate root.

use super::{
    Communication, GroupId, ModelId, ModelName, ModelType, PASSWORD_PLACEHOLDER, RecheckEpoch,
    RecordSpawnError, RegistryAccess, WorkerModelDomainError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// User-editable description of how workers are provisioned from a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Provisioning technology.
    pub model_type: ModelType,
    /// Image reference (container image, VM image or template name).
    pub image: String,
    /// Free-form description.
    pub description: String,
    /// Provider-specific template, if any.
    pub template: Option<String>,
    /// Channel workers use to reach the orchestrator.
    pub communication: Communication,
    /// Script executed when a worker boots.
    pub run_script: String,
    /// Number of workers to keep provisioned in advance.
    pub provision: i64,
    /// Restricted models may only be spawned by their owning group's
    /// hatcheries.
    pub restricted: bool,
    /// Disabled models are never spawned.
    pub disabled: bool,
    /// Deprecated models stay usable but are flagged to users.
    pub is_deprecated: bool,
    /// Registry access for private images.
    pub registry: RegistryAccess,
    /// Environment variables passed to spawned workers.
    pub envs: BTreeMap<String, String>,
}

impl ModelSpec {
    /// Creates a spec with the given type and image and default settings.
    #[must_use]
    pub fn new(model_type: ModelType, image: impl Into<String>) -> Self {
        Self {
            model_type,
            image: image.into(),
            description: String::new(),
            template: None,
            communication: Communication::default(),
            run_script: String::new(),
            provision: 0,
            restricted: false,
            disabled: false,
            is_deprecated: false,
            registry: RegistryAccess::default(),
            envs: BTreeMap::new(),
        }
    }

    /// Checks the spec is usable.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerModelDomainError::EmptyImage`] when the image is blank.
    pub fn validate(&self) -> Result<(), WorkerModelDomainError> {
        if self.image.trim().is_empty() {
            return Err(WorkerModelDomainError::EmptyImage);
        }
        Ok(())
    }
}

/// Registration bookkeeping of a worker model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationState {
    /// The model must be registered before spawning workers.
    pub need_registration: bool,
    /// Completion time of the last registration.
    pub last_registration: Option<DateTime<Utc>>,
    /// Operating system reported by the last registration.
    pub registered_os: Option<String>,
    /// Architecture reported by the last registration.
    pub registered_arch: Option<String>,
    /// Recheck epoch in effect when the model was last registered.
    pub registered_epoch: RecheckEpoch,
}

impl RegistrationState {
    /// State of a model registered at `at` under `epoch`.
    #[must_use]
    pub const fn registered(
        os: Option<String>,
        arch: Option<String>,
        epoch: RecheckEpoch,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            need_registration: false,
            last_registration: Some(at),
            registered_os: os,
            registered_arch: arch,
            registered_epoch: epoch,
        }
    }
}

/// Spawn failure bookkeeping of a worker model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnErrorState {
    /// Number of spawn failures since the last update or registration.
    pub count: u32,
    /// Message of the last spawn failure.
    pub last_error: Option<String>,
    /// Logs captured for the last spawn failure.
    pub last_logs: Option<Vec<u8>>,
    /// Time of the last spawn failure.
    pub last_date: Option<DateTime<Utc>>,
}

/// Worker model aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerModel {
    id: ModelId,
    name: ModelName,
    group_id: GroupId,
    spec: ModelSpec,
    password: Option<String>,
    registration: RegistrationState,
    spawn_errors: SpawnErrorState,
    user_last_modified: DateTime<Utc>,
    #[serde(default)]
    check_registration: bool,
}

/// Parameter object for reconstructing a persisted worker model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedModelData {
    /// Persisted model identifier.
    pub id: ModelId,
    /// Persisted model name.
    pub name: ModelName,
    /// Persisted owning group.
    pub group_id: GroupId,
    /// Persisted provisioning spec.
    pub spec: ModelSpec,
    /// Persisted password token (encrypted).
    pub password: Option<String>,
    /// Persisted registration bookkeeping.
    pub registration: RegistrationState,
    /// Persisted spawn failure bookkeeping.
    pub spawn_errors: SpawnErrorState,
    /// Persisted last user modification timestamp.
    pub user_last_modified: DateTime<Utc>,
}

/// A worker model that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkerModel {
    /// Unique model name.
    pub name: ModelName,
    /// Owning group.
    pub group_id: GroupId,
    /// Provisioning spec.
    pub spec: ModelSpec,
    /// Encrypted password token.
    pub password: Option<String>,
    /// Creation timestamp.
    pub user_last_modified: DateTime<Utc>,
}

impl NewWorkerModel {
    /// Creates a draft awaiting its first registration.
    #[must_use]
    pub fn new(
        name: ModelName,
        group_id: GroupId,
        spec: ModelSpec,
        password: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            name,
            group_id,
            spec,
            password,
            user_last_modified: clock.utc(),
        }
    }

    /// Turns the draft into a model once storage assigned its identifier.
    #[must_use]
    pub fn into_model(self, id: ModelId) -> WorkerModel {
        WorkerModel::from_persisted(PersistedModelData {
            id,
            name: self.name,
            group_id: self.group_id,
            spec: self.spec,
            password: self.password,
            registration: RegistrationState {
                need_registration: true,
                ..RegistrationState::default()
            },
            spawn_errors: SpawnErrorState::default(),
            user_last_modified: self.user_last_modified,
        })
    }
}

impl WorkerModel {
    /// Reconstructs a model from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedModelData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            group_id: data.group_id,
            spec: data.spec,
            password: data.password.filter(|value| !value.is_empty()),
            registration: data.registration,
            spawn_errors: data.spawn_errors,
            user_last_modified: data.user_last_modified,
            check_registration: false,
        }
    }

    /// Returns the model identifier.
    #[must_use]
    pub const fn id(&self) -> ModelId {
        self.id
    }

    /// Returns the model name.
    #[must_use]
    pub const fn name(&self) -> &ModelName {
        &self.name
    }

    /// Returns the owning group.
    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the provisioning spec.
    #[must_use]
    pub const fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Returns the password in whatever representation this copy carries:
    /// encrypted token, placeholder, or plaintext for privileged reads.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns the registration bookkeeping.
    #[must_use]
    pub const fn registration(&self) -> &RegistrationState {
        &self.registration
    }

    /// Returns the spawn failure bookkeeping.
    #[must_use]
    pub const fn spawn_errors(&self) -> &SpawnErrorState {
        &self.spawn_errors
    }

    /// Returns the last user modification timestamp.
    #[must_use]
    pub const fn user_last_modified(&self) -> DateTime<Utc> {
        self.user_last_modified
    }

    /// Returns `true` when the model must be registered before use.
    #[must_use]
    pub const fn needs_registration(&self) -> bool {
        self.registration.need_registration
    }

    /// Returns `true` when a fleet-wide recheck happened after the model's
    /// last registration.
    ///
    /// Only meaningful on copies served by the model view, which evaluates
    /// it against the current recheck epoch.
    #[must_use]
    pub const fn check_registration(&self) -> bool {
        self.check_registration
    }

    /// Evaluates [`Self::check_registration`] against the current epoch.
    pub fn observe_epoch(&mut self, current: RecheckEpoch) {
        self.check_registration = self.registration.registered_epoch.is_stale(current);
    }

    /// Replaces the password with the placeholder when one is set.
    ///
    /// Idempotent.
    pub fn redact_password(&mut self) {
        if self.password.is_some() {
            self.password = Some(PASSWORD_PLACEHOLDER.to_owned());
        }
    }

    /// Returns `true` when the password is currently the placeholder.
    #[must_use]
    pub fn is_password_redacted(&self) -> bool {
        self.password.as_deref() == Some(PASSWORD_PLACEHOLDER)
    }

    pub(crate) fn replace_password(&mut self, password: Option<String>) {
        self.password = password.filter(|value| !value.is_empty());
    }

    /// Applies a user update.
    ///
    /// Any update requires a new registration and forgets past spawn
    /// failures.
    pub fn apply_update(
        &mut self,
        name: ModelName,
        group_id: GroupId,
        spec: ModelSpec,
        clock: &impl Clock,
    ) {
        self.name = name;
        self.group_id = group_id;
        self.spec = spec;
        self.registration.need_registration = true;
        self.spawn_errors = SpawnErrorState::default();
        self.user_last_modified = clock.utc();
    }

    /// Applies a completed registration.
    ///
    /// Past spawn failures are forgotten; descriptive fields are untouched.
    pub fn complete_registration(&mut self, registration: RegistrationState) {
        self.registration = registration;
        self.spawn_errors = SpawnErrorState::default();
        self.check_registration = false;
    }

    /// Records a spawn failure without touching registration state.
    pub fn record_spawn_error(&mut self, report: &RecordSpawnError, at: DateTime<Utc>) {
        self.spawn_errors = SpawnErrorState {
            count: self.spawn_errors.count.saturating_add(1),
            last_error: Some(report.message().to_owned()),
            last_logs: report.logs().map(<[u8]>::to_vec),
            last_date: Some(at),
        };
    }
}

/// Unique key used for point lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelKey {
    /// Lookup by storage identifier.
    Id(ModelId),
    /// Lookup by unique name.
    Name(ModelName),
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name '{name}'"),
        }
    }
}
