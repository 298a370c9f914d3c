//! Command-side service for worker model lifecycle operations.

use super::{
    CredentialVault, LeaseError, RecheckSignal, RegistrationLease, VaultError, WorkerModelConfig,
    merge_default_envs,
};
use crate::worker_model::{
    domain::{
        CompleteRegistration, CreateModel, ModelId, ModelKey, ModelName, NewWorkerModel,
        RecordSpawnError, RegistrationState, Requirement, UpdateModel, WorkerModel,
        WorkerModelDomainError,
    },
    ports::{
        Cipher, CoordinationError, CoordinationStore, WorkerModelRepository,
        WorkerModelRepositoryError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for worker model lifecycle operations.
#[derive(Debug, Error)]
pub enum ModelLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WorkerModelDomainError),

    /// The model does not exist.
    #[error("worker model not found: {0}")]
    NotFound(ModelId),

    /// The model was edited after the registering worker was spawned from it.
    #[error("worker model {0} changed during registration")]
    StaleRegistration(ModelId),

    /// The password could not be sealed.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The registration booking could not be released.
    #[error(transparent)]
    Lease(#[from] LeaseError),

    /// The coordination store failed.
    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    /// The repository failed.
    #[error(transparent)]
    Repository(#[from] WorkerModelRepositoryError),
}

/// Result type for lifecycle operations.
pub type ModelLifecycleResult<T> = Result<T, ModelLifecycleError>;

/// Creates, updates, registers and deletes worker models.
#[derive(Debug)]
pub struct ModelLifecycleService<R, S, Ci, C>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
    Ci: Cipher,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    lease: RegistrationLease<S>,
    signal: RecheckSignal<S>,
    vault: CredentialVault<Ci>,
    clock: Arc<C>,
}

impl<R, S, Ci, C> Clone for ModelLifecycleService<R, S, Ci, C>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
    Ci: Cipher,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            lease: self.lease.clone(),
            signal: self.signal.clone(),
            vault: self.vault.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, S, Ci, C> ModelLifecycleService<R, S, Ci, C>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
    Ci: Cipher,
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        store: Arc<S>,
        vault: CredentialVault<Ci>,
        clock: Arc<C>,
        config: &WorkerModelConfig,
    ) -> Self {
        Self {
            repository,
            lease: RegistrationLease::new(Arc::clone(&store), config),
            signal: RecheckSignal::new(store),
            vault,
            clock,
        }
    }

    /// Creates a model awaiting its first registration.
    ///
    /// The password is encrypted and the default worker environment merged
    /// in. The returned model carries the placeholder instead of the token.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLifecycleError::Domain`] when the name or image is
    /// invalid or the placeholder is submitted as password, and
    /// [`ModelLifecycleError::Repository`] when the name is taken.
    pub async fn create(&self, command: CreateModel) -> ModelLifecycleResult<WorkerModel> {
        let CreateModel {
            name,
            group_id,
            mut spec,
            password,
        } = command;

        let model_name = ModelName::new(name)?;
        spec.validate()?;
        let token = self.seal(password.as_deref())?;
        merge_default_envs(&mut spec.envs);

        let draft = NewWorkerModel::new(model_name, group_id, spec, token, &*self.clock);
        let mut model = self.repository.insert(&draft).await?;
        info!(model_id = %model.id(), name = %model.name(), "worker model created");

        model.redact_password();
        Ok(model)
    }

    /// Applies a user update; the model must be registered again.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLifecycleError::NotFound`] when the model does not
    /// exist, [`ModelLifecycleError::Domain`] on invalid input, and
    /// [`ModelLifecycleError::Repository`] when persistence fails.
    pub async fn update(
        &self,
        id: ModelId,
        command: UpdateModel,
    ) -> ModelLifecycleResult<WorkerModel> {
        let UpdateModel {
            name,
            group_id,
            mut spec,
            password,
        } = command;

        let model_name = ModelName::new(name)?;
        spec.validate()?;
        let mut model = self.load(id).await?;
        let token = self
            .vault
            .apply_change(model.password(), &password)
            .map_err(Self::vault_error)?;
        merge_default_envs(&mut spec.envs);

        model.apply_update(model_name, group_id, spec, &*self.clock);
        model.replace_password(token);
        self.repository
            .update(&model)
            .await
            .map_err(Self::repository_error)?;
        info!(model_id = %id, "worker model updated, registration required");

        model.redact_password();
        Ok(model)
    }

    /// Records a successful registration and releases the booking.
    ///
    /// The model is stamped with the current recheck epoch and its
    /// capabilities are replaced by the discovered ones. Descriptive fields
    /// are left as stored. A registration tied to a revision the model has
    /// since moved past is discarded and the booking released, so the
    /// edited model stays pending.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLifecycleError::NotFound`] when the model does not
    /// exist, [`ModelLifecycleError::StaleRegistration`] when it was edited
    /// after the registered revision, or a store error when persistence or
    /// coordination fails.
    pub async fn complete_registration(
        &self,
        command: CompleteRegistration,
    ) -> ModelLifecycleResult<WorkerModel> {
        let CompleteRegistration {
            model_id,
            capabilities,
            os,
            arch,
            revision,
        } = command;

        let epoch = self.signal.current().await?;
        let registration = RegistrationState::registered(os, arch, epoch, self.clock.utc());
        let outcome = self
            .repository
            .complete_registration(model_id, revision, &registration, &capabilities)
            .await;
        if let Err(WorkerModelRepositoryError::StaleRegistration(_)) = outcome {
            self.lease.release(model_id).await?;
            warn!(model_id = %model_id, "worker model changed during registration, result discarded");
        }
        let mut model = outcome.map_err(Self::repository_error)?;
        self.lease.release(model_id).await?;
        info!(
            model_id = %model_id,
            epoch = %epoch,
            capabilities = capabilities.len(),
            "worker model registered"
        );

        model.redact_password();
        Ok(model)
    }

    /// Records a failed spawn attempt and releases the booking.
    ///
    /// Registration state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLifecycleError::NotFound`] when the model does not
    /// exist.
    pub async fn record_spawn_error(
        &self,
        id: ModelId,
        report: &RecordSpawnError,
    ) -> ModelLifecycleResult<()> {
        self.repository
            .record_spawn_error(id, report, self.clock.utc())
            .await
            .map_err(Self::repository_error)?;
        warn!(model_id = %id, error = report.message(), "worker model spawn failed");
        self.lease.release(id).await?;
        Ok(())
    }

    /// Deletes a model with its capabilities and booking.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLifecycleError::NotFound`] when nothing was deleted.
    pub async fn delete(&self, id: ModelId) -> ModelLifecycleResult<()> {
        self.repository
            .delete(id)
            .await
            .map_err(Self::repository_error)?;
        self.lease.release(id).await?;
        info!(model_id = %id, "worker model deleted");
        Ok(())
    }

    /// Returns a model's capabilities ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLifecycleError::Repository`] when persistence fails.
    pub async fn capabilities(&self, id: ModelId) -> ModelLifecycleResult<Vec<Requirement>> {
        Ok(self.repository.capabilities(id).await?)
    }

    async fn load(&self, id: ModelId) -> ModelLifecycleResult<WorkerModel> {
        self.repository
            .find(&ModelKey::Id(id))
            .await?
            .into_iter()
            .next()
            .ok_or(ModelLifecycleError::NotFound(id))
    }

    fn seal(&self, password: Option<&str>) -> ModelLifecycleResult<Option<String>> {
        self.vault.seal(password).map_err(Self::vault_error)
    }

    fn vault_error(err: VaultError) -> ModelLifecycleError {
        match err {
            VaultError::Domain(domain) => ModelLifecycleError::Domain(domain),
            other => ModelLifecycleError::Vault(other),
        }
    }

    fn repository_error(err: WorkerModelRepositoryError) -> ModelLifecycleError {
        match err {
            WorkerModelRepositoryError::NotFound(id) => ModelLifecycleError::NotFound(id),
            WorkerModelRepositoryError::StaleRegistration(id) => {
                ModelLifecycleError::StaleRegistration(id)
            }
            other => ModelLifecycleError::Repository(other),
        }
    }
}
