//! Repository port for worker model and capability persistence.

use crate::worker_model::domain::{
    ModelFilter, ModelId, ModelKey, ModelName, NewWorkerModel, RecordSpawnError, RegistrationState,
    Requirement, WorkerModel,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for worker model repository operations.
pub type WorkerModelRepositoryResult<T> = Result<T, WorkerModelRepositoryError>;

/// Worker model persistence contract.
///
/// Models and their capabilities are stored together: deleting a model
/// removes its capabilities in the same operation.
#[async_trait]
pub trait WorkerModelRepository: Send + Sync {
    /// Stores a new model and returns it with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerModelRepositoryError::DuplicateName`] when the name is
    /// already taken.
    async fn insert(&self, model: &NewWorkerModel) -> WorkerModelRepositoryResult<WorkerModel>;

    /// Persists changes to an existing model.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerModelRepositoryError::NotFound`] when the model does
    /// not exist or [`WorkerModelRepositoryError::DuplicateName`] when the
    /// new name belongs to another model.
    async fn update(&self, model: &WorkerModel) -> WorkerModelRepositoryResult<()>;

    /// Deletes a model and its capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerModelRepositoryError::NotFound`] when nothing was
    /// deleted.
    async fn delete(&self, id: ModelId) -> WorkerModelRepositoryResult<()>;

    /// Returns every stored row matching a unique key.
    ///
    /// An empty vector means no row matched; more than one row is a data
    /// integrity problem left for the caller to report.
    async fn find(&self, key: &ModelKey) -> WorkerModelRepositoryResult<Vec<WorkerModel>>;

    /// Returns the models selected by `filter`, in no particular order.
    async fn list(&self, filter: &ModelFilter) -> WorkerModelRepositoryResult<Vec<WorkerModel>>;

    /// Returns a model's capabilities ordered by name.
    async fn capabilities(&self, id: ModelId) -> WorkerModelRepositoryResult<Vec<Requirement>>;

    /// Stores a completed registration and replaces the model's
    /// capabilities in one atomic step, returning the model as stored.
    ///
    /// Only registration and spawn error state are written, so descriptive
    /// fields edited concurrently are kept. When `revision` is given, the
    /// write only happens if the model's last user modification still
    /// equals it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerModelRepositoryError::NotFound`] when the model does
    /// not exist and [`WorkerModelRepositoryError::StaleRegistration`] when
    /// the model changed since `revision`; nothing is written in either
    /// case.
    async fn complete_registration(
        &self,
        id: ModelId,
        revision: Option<DateTime<Utc>>,
        registration: &RegistrationState,
        capabilities: &[Requirement],
    ) -> WorkerModelRepositoryResult<WorkerModel>;

    /// Returns the distinct `binary` capabilities across all models.
    async fn binary_capabilities(&self) -> WorkerModelRepositoryResult<Vec<Requirement>>;

    /// Increments a model's spawn error counter and stores the last error.
    ///
    /// The increment happens in storage so concurrent reports are not lost.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerModelRepositoryError::NotFound`] when the model does
    /// not exist.
    async fn record_spawn_error(
        &self,
        id: ModelId,
        report: &RecordSpawnError,
        at: DateTime<Utc>,
    ) -> WorkerModelRepositoryResult<()>;
}

/// Errors returned by worker model repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkerModelRepositoryError {
    /// A model with the same name already exists.
    #[error("duplicate worker model name: {0}")]
    DuplicateName(ModelName),

    /// The model was not found.
    #[error("worker model not found: {0}")]
    NotFound(ModelId),

    /// The model was edited after the registering worker was spawned from it.
    #[error("worker model {0} changed during registration")]
    StaleRegistration(ModelId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkerModelRepositoryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
