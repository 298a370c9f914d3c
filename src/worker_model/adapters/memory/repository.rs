//! In-memory worker model repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::worker_model::{
    domain::{
        ModelFilter, ModelId, ModelKey, ModelName, NewWorkerModel, RecordSpawnError,
        RegistrationState, Requirement, RequirementType, WorkerModel,
    },
    ports::{WorkerModelRepository, WorkerModelRepositoryError, WorkerModelRepositoryResult},
};

/// Thread-safe in-memory worker model repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkerModelRepository {
    state: Arc<RwLock<InMemoryModelState>>,
}

#[derive(Debug, Default)]
struct InMemoryModelState {
    last_id: i64,
    models: BTreeMap<ModelId, WorkerModel>,
    name_index: HashMap<ModelName, ModelId>,
    capabilities: HashMap<ModelId, Vec<Requirement>>,
}

impl InMemoryWorkerModelRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> WorkerModelRepositoryResult<RwLockReadGuard<'_, InMemoryModelState>> {
        self.state.read().map_err(|err| {
            WorkerModelRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(
        &self,
    ) -> WorkerModelRepositoryResult<RwLockWriteGuard<'_, InMemoryModelState>> {
        self.state.write().map_err(|err| {
            WorkerModelRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl InMemoryModelState {
    fn exposes_binary(&self, id: ModelId, binary: &str) -> bool {
        self.capabilities.get(&id).is_some_and(|capabilities| {
            capabilities
                .iter()
                .any(|c| c.kind() == RequirementType::Binary && c.value() == binary)
        })
    }
}

#[async_trait]
impl WorkerModelRepository for InMemoryWorkerModelRepository {
    async fn insert(&self, model: &NewWorkerModel) -> WorkerModelRepositoryResult<WorkerModel> {
        let mut state = self.write_state()?;

        if state.name_index.contains_key(&model.name) {
            return Err(WorkerModelRepositoryError::DuplicateName(model.name.clone()));
        }

        state.last_id = state.last_id.saturating_add(1);
        let id = ModelId::new(state.last_id);
        let stored = model.clone().into_model(id);
        state.name_index.insert(stored.name().clone(), id);
        state.models.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, model: &WorkerModel) -> WorkerModelRepositoryResult<()> {
        let mut state = self.write_state()?;

        let old_name = state
            .models
            .get(&model.id())
            .ok_or(WorkerModelRepositoryError::NotFound(model.id()))?
            .name()
            .clone();

        if *model.name() != old_name {
            if let Some(&indexed_id) = state.name_index.get(model.name())
                && indexed_id != model.id()
            {
                return Err(WorkerModelRepositoryError::DuplicateName(
                    model.name().clone(),
                ));
            }
            state.name_index.remove(&old_name);
            state.name_index.insert(model.name().clone(), model.id());
        }

        state.models.insert(model.id(), model.clone());
        Ok(())
    }

    async fn delete(&self, id: ModelId) -> WorkerModelRepositoryResult<()> {
        let mut state = self.write_state()?;
        let removed = state
            .models
            .remove(&id)
            .ok_or(WorkerModelRepositoryError::NotFound(id))?;
        state.name_index.remove(removed.name());
        state.capabilities.remove(&id);
        Ok(())
    }

    async fn find(&self, key: &ModelKey) -> WorkerModelRepositoryResult<Vec<WorkerModel>> {
        let state = self.read_state()?;
        let id = match key {
            ModelKey::Id(id) => Some(*id),
            ModelKey::Name(name) => state.name_index.get(name).copied(),
        };
        Ok(id
            .and_then(|found| state.models.get(&found))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn list(&self, filter: &ModelFilter) -> WorkerModelRepositoryResult<Vec<WorkerModel>> {
        let state = self.read_state()?;
        let models = state
            .models
            .values()
            .filter(|model| filter.matches(model))
            .filter(|model| {
                filter
                    .binary
                    .as_deref()
                    .is_none_or(|binary| state.exposes_binary(model.id(), binary))
            })
            .cloned()
            .collect();
        Ok(models)
    }

    async fn capabilities(&self, id: ModelId) -> WorkerModelRepositoryResult<Vec<Requirement>> {
        let state = self.read_state()?;
        let mut capabilities = state.capabilities.get(&id).cloned().unwrap_or_default();
        capabilities.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(capabilities)
    }

    async fn complete_registration(
        &self,
        id: ModelId,
        revision: Option<DateTime<Utc>>,
        registration: &RegistrationState,
        capabilities: &[Requirement],
    ) -> WorkerModelRepositoryResult<WorkerModel> {
        let mut state = self.write_state()?;
        let model = state
            .models
            .get_mut(&id)
            .ok_or(WorkerModelRepositoryError::NotFound(id))?;
        if revision.is_some_and(|expected| expected != model.user_last_modified()) {
            return Err(WorkerModelRepositoryError::StaleRegistration(id));
        }
        model.complete_registration(registration.clone());
        let registered = model.clone();
        state.capabilities.insert(id, capabilities.to_vec());
        Ok(registered)
    }

    async fn binary_capabilities(&self) -> WorkerModelRepositoryResult<Vec<Requirement>> {
        let state = self.read_state()?;
        let binaries: BTreeSet<&str> = state
            .capabilities
            .values()
            .flatten()
            .filter(|capability| capability.kind() == RequirementType::Binary)
            .map(Requirement::value)
            .collect();
        Ok(binaries.into_iter().map(Requirement::binary).collect())
    }

    async fn record_spawn_error(
        &self,
        id: ModelId,
        report: &RecordSpawnError,
        at: DateTime<Utc>,
    ) -> WorkerModelRepositoryResult<()> {
        let mut state = self.write_state()?;
        let model = state
            .models
            .get_mut(&id)
            .ok_or(WorkerModelRepositoryError::NotFound(id))?;
        model.record_spawn_error(report, at);
        Ok(())
    }
}
