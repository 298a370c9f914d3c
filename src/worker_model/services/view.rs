//! Cached, access-scoped read projection of worker models.
//!
//! Listings are cached in the coordination store for a short time. Each
//! cached entry records the recheck epoch it was built under and is ignored
//! once the epoch moves, so a fleet-wide recheck shows up on the very next
//! read while other changes may lag by up to the cache lifetime.

use super::{CredentialAccess, CredentialVault, RecheckSignal, VaultError, WorkerModelConfig};
use crate::worker_model::{
    domain::{
        GroupId, GroupScope, ModelFilter, ModelId, ModelKey, ModelName, RecheckEpoch, Requester,
        StateLoadOption, WorkerModel,
    },
    ports::{
        Cipher, CoordinationError, CoordinationStore, WorkerModelRepository,
        WorkerModelRepositoryError,
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors returned by [`ModelView`].
#[derive(Debug, Error)]
pub enum ModelViewError {
    /// No model matches the key.
    #[error("worker model not found: {0}")]
    NotFound(ModelKey),

    /// More than one stored row matches a unique key.
    #[error("worker model {key} is not unique ({count} rows)")]
    Ambiguous {
        /// Lookup key.
        key: ModelKey,
        /// Number of matching rows.
        count: usize,
    },

    /// A listing could not be written to the cache.
    #[error("failed to encode cached listing '{key}': {source}")]
    Cache {
        /// Cache key.
        key: String,
        /// Serialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// Credentials could not be presented.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The repository failed.
    #[error(transparent)]
    Repository(#[from] WorkerModelRepositoryError),

    /// The coordination store failed.
    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

/// Result type for model view operations.
pub type ModelViewResult<T> = Result<T, ModelViewError>;

#[derive(Debug, Serialize, Deserialize)]
struct CachedListing {
    epoch: RecheckEpoch,
    models: Vec<WorkerModel>,
}

/// Returns the cache key of a user's listing.
#[must_use]
pub fn user_cache_key(username: &str, state: Option<StateLoadOption>) -> String {
    state.map_or_else(
        || format!("api:workermodels:{username}"),
        |option| format!("api:workermodels:{option}:{username}"),
    )
}

/// Returns the cache key of a group's usable-model listing.
#[must_use]
pub fn group_cache_key(group_id: GroupId) -> String {
    format!("api:workermodels:bygroup:{group_id}")
}

/// Read-side service for worker models.
#[derive(Debug)]
pub struct ModelView<R, S, Ci>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
    Ci: Cipher,
{
    repository: Arc<R>,
    store: Arc<S>,
    vault: CredentialVault<Ci>,
    signal: RecheckSignal<S>,
    config: WorkerModelConfig,
}

impl<R, S, Ci> Clone for ModelView<R, S, Ci>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
    Ci: Cipher,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            store: Arc::clone(&self.store),
            vault: self.vault.clone(),
            signal: self.signal.clone(),
            config: self.config,
        }
    }
}

impl<R, S, Ci> ModelView<R, S, Ci>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
    Ci: Cipher,
{
    /// Creates a model view.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        store: Arc<S>,
        vault: CredentialVault<Ci>,
        config: WorkerModelConfig,
    ) -> Self {
        let signal = RecheckSignal::new(Arc::clone(&store));
        Self {
            repository,
            store,
            vault,
            signal,
            config,
        }
    }

    /// Lists the models visible to `requester`, sorted by name, with
    /// passwords redacted.
    ///
    /// Administrators see every model; other users see models owned by one
    /// of their groups or by the shared-infrastructure group.
    ///
    /// # Errors
    ///
    /// Returns [`ModelViewError`] when the repository or the cache fails.
    pub async fn list_for_user(
        &self,
        requester: &Requester,
        state: Option<StateLoadOption>,
    ) -> ModelViewResult<Vec<WorkerModel>> {
        let epoch = self.signal.current().await?;
        let key = user_cache_key(requester.username(), state);
        if let Some(models) = self.cached(&key, epoch).await? {
            return Ok(models);
        }

        let filter = ModelFilter::new(self.scope_for(requester), self.config.shared_infra_group())
            .with_state(state);
        let mut models = self.load(&filter, epoch).await?;
        models.iter_mut().for_each(WorkerModel::redact_password);
        self.store_cached(&key, epoch, &models).await?;
        Ok(models)
    }

    /// Lists the visible models exposing the `binary` capability `binary`.
    ///
    /// Not cached.
    ///
    /// # Errors
    ///
    /// Returns [`ModelViewError`] when the repository fails.
    pub async fn list_for_user_with_binary(
        &self,
        requester: &Requester,
        binary: &str,
    ) -> ModelViewResult<Vec<WorkerModel>> {
        let epoch = self.signal.current().await?;
        let filter = ModelFilter::new(self.scope_for(requester), self.config.shared_infra_group())
            .with_binary(binary);
        let mut models = self.load(&filter, epoch).await?;
        models.iter_mut().for_each(WorkerModel::redact_password);
        Ok(models)
    }

    /// Lists the models a hatchery of `group_id` may spawn, sorted by name.
    ///
    /// The privileged group sees every enabled, unrestricted model; other
    /// groups see the enabled models they own. The cache holds stored
    /// tokens only; `access` picks the representation returned.
    ///
    /// # Errors
    ///
    /// Returns [`ModelViewError`] when the repository, the cache or
    /// decryption fails.
    pub async fn list_usable_by_group(
        &self,
        group_id: GroupId,
        privileged_group: GroupId,
        access: CredentialAccess,
    ) -> ModelViewResult<Vec<WorkerModel>> {
        let epoch = self.signal.current().await?;
        let key = group_cache_key(group_id);
        let mut models = if let Some(cached) = self.cached(&key, epoch).await? {
            cached
        } else {
            let shared_infra = self.config.shared_infra_group();
            let filter = if group_id == privileged_group {
                ModelFilter::new(GroupScope::All, shared_infra)
                    .enabled_only()
                    .unrestricted_only()
            } else {
                ModelFilter::new(GroupScope::Groups([group_id].into()), shared_infra).enabled_only()
            };
            let loaded = self.load(&filter, epoch).await?;
            self.store_cached(&key, epoch, &loaded).await?;
            loaded
        };

        for model in &mut models {
            self.vault.present(model, access)?;
        }
        Ok(models)
    }

    /// Returns the model named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelViewError::NotFound`] or [`ModelViewError::Ambiguous`]
    /// when the name does not match exactly one row.
    pub async fn get_by_name(
        &self,
        name: &ModelName,
        access: CredentialAccess,
    ) -> ModelViewResult<WorkerModel> {
        self.get(ModelKey::Name(name.clone()), access).await
    }

    /// Returns the model with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelViewError::NotFound`] or [`ModelViewError::Ambiguous`]
    /// when the identifier does not match exactly one row.
    pub async fn get_by_id(
        &self,
        id: ModelId,
        access: CredentialAccess,
    ) -> ModelViewResult<WorkerModel> {
        self.get(ModelKey::Id(id), access).await
    }

    async fn get(&self, key: ModelKey, access: CredentialAccess) -> ModelViewResult<WorkerModel> {
        let epoch = self.signal.current().await?;
        let mut rows = self.repository.find(&key).await?;
        if rows.len() > 1 {
            let count = rows.len();
            return Err(ModelViewError::Ambiguous { key, count });
        }
        let Some(mut model) = rows.pop() else {
            return Err(ModelViewError::NotFound(key));
        };
        model.observe_epoch(epoch);
        self.vault.present(&mut model, access)?;
        Ok(model)
    }

    fn scope_for(&self, requester: &Requester) -> GroupScope {
        if requester.is_admin() {
            return GroupScope::All;
        }
        let mut groups = requester.groups().clone();
        groups.insert(self.config.shared_infra_group());
        GroupScope::Groups(groups)
    }

    async fn load(
        &self,
        filter: &ModelFilter,
        epoch: RecheckEpoch,
    ) -> ModelViewResult<Vec<WorkerModel>> {
        let mut models = self.repository.list(filter).await?;
        for model in &mut models {
            model.observe_epoch(epoch);
        }
        models.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(models)
    }

    async fn cached(
        &self,
        key: &str,
        epoch: RecheckEpoch,
    ) -> ModelViewResult<Option<Vec<WorkerModel>>> {
        let Some(raw) = self.store.get(key).await? else {
            debug!(key, "worker model listing cache miss");
            return Ok(None);
        };
        match serde_json::from_str::<CachedListing>(&raw) {
            Ok(listing) if listing.epoch == epoch => {
                debug!(key, "worker model listing cache hit");
                Ok(Some(listing.models))
            }
            Ok(listing) => {
                debug!(key, cached = %listing.epoch, current = %epoch, "stale worker model listing ignored");
                Ok(None)
            }
            Err(err) => {
                debug!(key, error = %err, "undecodable worker model listing ignored");
                Ok(None)
            }
        }
    }

    async fn store_cached(
        &self,
        key: &str,
        epoch: RecheckEpoch,
        models: &[WorkerModel],
    ) -> ModelViewResult<()> {
        let listing = CachedListing {
            epoch,
            models: models.to_vec(),
        };
        let raw = serde_json::to_string(&listing).map_err(|source| ModelViewError::Cache {
            key: key.to_owned(),
            source,
        })?;
        self.store
            .set_with_ttl(key, &raw, self.config.cache_ttl())
            .await?;
        Ok(())
    }
}
