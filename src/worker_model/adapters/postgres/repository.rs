//! `PostgreSQL` repository implementation for worker models.

use super::{
    models::{CapabilityRow, NewWorkerModelRow, WorkerModelChangeset, WorkerModelRow},
    schema::{worker_capabilities, worker_models},
};
use crate::worker_model::{
    domain::{
        Communication, GroupId, GroupScope, ModelFilter, ModelId, ModelKey, ModelName, ModelSpec,
        ModelType, NewWorkerModel, PersistedModelData, RecheckEpoch, RecordSpawnError,
        RegistrationState, Requirement, RequirementType, SpawnErrorState, StateLoadOption,
        WorkerModel,
    },
    ports::{WorkerModelRepository, WorkerModelRepositoryError, WorkerModelRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by worker model adapters.
pub type WorkerModelPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed worker model repository.
#[derive(Debug, Clone)]
pub struct PostgresWorkerModelRepository {
    pool: WorkerModelPgPool,
}

impl PostgresWorkerModelRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: WorkerModelPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkerModelRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkerModelRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkerModelRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkerModelRepositoryError::persistence)?
    }
}

#[async_trait]
impl WorkerModelRepository for PostgresWorkerModelRepository {
    async fn insert(&self, model: &NewWorkerModel) -> WorkerModelRepositoryResult<WorkerModel> {
        let model_name = model.name.clone();
        let new_row = to_new_row(model)?;

        self.run_blocking(move |connection| {
            let row = diesel::insert_into(worker_models::table)
                .values(&new_row)
                .returning(WorkerModelRow::as_returning())
                .get_result::<WorkerModelRow>(connection)
                .map_err(|err| map_name_conflict(err, &model_name))?;
            row_to_model(row)
        })
        .await
    }

    async fn update(&self, model: &WorkerModel) -> WorkerModelRepositoryResult<()> {
        let model_id = model.id();
        let model_name = model.name().clone();
        let changeset = to_changeset(model)?;

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                worker_models::table.filter(worker_models::id.eq(model_id.into_inner())),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(|err| map_name_conflict(err, &model_name))?;

            if updated_count == 0 {
                return Err(WorkerModelRepositoryError::NotFound(model_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: ModelId) -> WorkerModelRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkerModelRepositoryError, _>(|tx| {
                diesel::delete(
                    worker_capabilities::table
                        .filter(worker_capabilities::worker_model_id.eq(id.into_inner())),
                )
                .execute(tx)
                .map_err(WorkerModelRepositoryError::persistence)?;

                let deleted =
                    diesel::delete(worker_models::table.filter(worker_models::id.eq(id.into_inner())))
                        .execute(tx)
                        .map_err(WorkerModelRepositoryError::persistence)?;

                if deleted == 0 {
                    return Err(WorkerModelRepositoryError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn find(&self, key: &ModelKey) -> WorkerModelRepositoryResult<Vec<WorkerModel>> {
        let lookup = key.clone();
        self.run_blocking(move |connection| {
            let query = worker_models::table.into_boxed();
            let filtered = match lookup {
                ModelKey::Id(id) => query.filter(worker_models::id.eq(id.into_inner())),
                ModelKey::Name(name) => query.filter(worker_models::name.eq(name.as_str().to_owned())),
            };
            let rows = filtered
                .select(WorkerModelRow::as_select())
                .load::<WorkerModelRow>(connection)
                .map_err(WorkerModelRepositoryError::persistence)?;
            rows.into_iter().map(row_to_model).collect()
        })
        .await
    }

    async fn list(&self, filter: &ModelFilter) -> WorkerModelRepositoryResult<Vec<WorkerModel>> {
        let selection = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = worker_models::table.into_boxed();

            if let GroupScope::Groups(groups) = &selection.scope {
                let group_ids: Vec<i64> = groups.iter().map(|group| group.into_inner()).collect();
                query = query.filter(worker_models::group_id.eq_any(group_ids));
            }
            if selection.enabled_only {
                query = query.filter(worker_models::disabled.eq(false));
            }
            if selection.unrestricted_only {
                query = query.filter(worker_models::restricted.eq(false));
            }
            if let Some(state) = selection.state {
                query = match state {
                    StateLoadOption::SpawnError => query.filter(worker_models::nb_spawn_err.gt(0)),
                    StateLoadOption::Disabled => query.filter(worker_models::disabled.eq(true)),
                    StateLoadOption::Register => {
                        query.filter(worker_models::need_registration.eq(true))
                    }
                    StateLoadOption::Deprecated => {
                        query.filter(worker_models::is_deprecated.eq(true))
                    }
                    StateLoadOption::Active => query.filter(worker_models::is_deprecated.eq(false)),
                    StateLoadOption::Official => query.filter(
                        worker_models::group_id.eq(selection.shared_infra_group.into_inner()),
                    ),
                };
            }
            if let Some(binary) = selection.binary.clone() {
                let exposing = worker_capabilities::table
                    .filter(
                        worker_capabilities::capability_type
                            .eq(RequirementType::Binary.as_str()),
                    )
                    .filter(worker_capabilities::argument.eq(binary))
                    .select(worker_capabilities::worker_model_id);
                query = query.filter(worker_models::id.eq_any(exposing));
            }

            let rows = query
                .select(WorkerModelRow::as_select())
                .load::<WorkerModelRow>(connection)
                .map_err(WorkerModelRepositoryError::persistence)?;
            rows.into_iter().map(row_to_model).collect()
        })
        .await
    }

    async fn capabilities(&self, id: ModelId) -> WorkerModelRepositoryResult<Vec<Requirement>> {
        self.run_blocking(move |connection| {
            let rows = worker_capabilities::table
                .filter(worker_capabilities::worker_model_id.eq(id.into_inner()))
                .order(worker_capabilities::name.asc())
                .select(CapabilityRow::as_select())
                .load::<CapabilityRow>(connection)
                .map_err(WorkerModelRepositoryError::persistence)?;
            rows.into_iter().map(row_to_requirement).collect()
        })
        .await
    }

    async fn complete_registration(
        &self,
        id: ModelId,
        revision: Option<DateTime<Utc>>,
        registration: &RegistrationState,
        capabilities: &[Requirement],
    ) -> WorkerModelRepositoryResult<WorkerModel> {
        let state = registration.clone();
        let epoch = i64::try_from(state.registered_epoch.value())
            .map_err(WorkerModelRepositoryError::persistence)?;
        let rows: Vec<CapabilityRow> = capabilities
            .iter()
            .map(|capability| to_capability_row(id, capability))
            .collect();

        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkerModelRepositoryError, _>(|tx| {
                let modified = worker_models::table
                    .filter(worker_models::id.eq(id.into_inner()))
                    .select(worker_models::user_last_modified)
                    .for_update()
                    .get_result::<DateTime<Utc>>(tx)
                    .optional()?
                    .ok_or(WorkerModelRepositoryError::NotFound(id))?;
                if revision.is_some_and(|expected| expected != modified) {
                    return Err(WorkerModelRepositoryError::StaleRegistration(id));
                }

                let updated = diesel::update(
                    worker_models::table.filter(worker_models::id.eq(id.into_inner())),
                )
                .set((
                    worker_models::need_registration.eq(state.need_registration),
                    worker_models::last_registration.eq(state.last_registration),
                    worker_models::registered_os.eq(state.registered_os),
                    worker_models::registered_arch.eq(state.registered_arch),
                    worker_models::registered_epoch.eq(epoch),
                    worker_models::nb_spawn_err.eq(0),
                    worker_models::last_spawn_err.eq(None::<String>),
                    worker_models::last_spawn_err_logs.eq(None::<Vec<u8>>),
                    worker_models::date_last_spawn_err.eq(None::<DateTime<Utc>>),
                ))
                .returning(WorkerModelRow::as_returning())
                .get_result::<WorkerModelRow>(tx)
                .optional()?
                .ok_or(WorkerModelRepositoryError::NotFound(id))?;

                diesel::delete(
                    worker_capabilities::table
                        .filter(worker_capabilities::worker_model_id.eq(id.into_inner())),
                )
                .execute(tx)?;
                if !rows.is_empty() {
                    diesel::insert_into(worker_capabilities::table)
                        .values(&rows)
                        .execute(tx)?;
                }
                row_to_model(updated)
            })
        })
        .await
    }

    async fn binary_capabilities(&self) -> WorkerModelRepositoryResult<Vec<Requirement>> {
        self.run_blocking(move |connection| {
            let binaries = worker_capabilities::table
                .filter(worker_capabilities::capability_type.eq(RequirementType::Binary.as_str()))
                .select(worker_capabilities::argument)
                .distinct()
                .order(worker_capabilities::argument.asc())
                .load::<String>(connection)
                .map_err(WorkerModelRepositoryError::persistence)?;
            Ok(binaries.into_iter().map(Requirement::binary).collect())
        })
        .await
    }

    async fn record_spawn_error(
        &self,
        id: ModelId,
        report: &RecordSpawnError,
        at: DateTime<Utc>,
    ) -> WorkerModelRepositoryResult<()> {
        let message = report.message().to_owned();
        let logs = report.logs().map(<[u8]>::to_vec);

        self.run_blocking(move |connection| {
            let updated_count =
                diesel::update(worker_models::table.filter(worker_models::id.eq(id.into_inner())))
                    .set((
                        worker_models::nb_spawn_err.eq(worker_models::nb_spawn_err + 1),
                        worker_models::last_spawn_err.eq(Some(message)),
                        worker_models::last_spawn_err_logs.eq(logs),
                        worker_models::date_last_spawn_err.eq(Some(at)),
                    ))
                    .execute(connection)
                    .map_err(WorkerModelRepositoryError::persistence)?;

            if updated_count == 0 {
                return Err(WorkerModelRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

impl From<DieselError> for WorkerModelRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

fn map_name_conflict(err: DieselError, name: &ModelName) -> WorkerModelRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if is_name_unique_violation(info.as_ref()) =>
        {
            WorkerModelRepositoryError::DuplicateName(name.clone())
        }
        _ => WorkerModelRepositoryError::persistence(err),
    }
}

fn is_name_unique_violation(info: &dyn diesel::result::DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_worker_models_name")
}

pub(super) fn to_new_row(model: &NewWorkerModel) -> WorkerModelRepositoryResult<NewWorkerModelRow> {
    let spec = &model.spec;
    Ok(NewWorkerModelRow {
        name: model.name.as_str().to_owned(),
        group_id: model.group_id.into_inner(),
        model_type: spec.model_type.as_str().to_owned(),
        image: spec.image.clone(),
        description: spec.description.clone(),
        template: spec.template.clone(),
        communication: spec.communication.as_str().to_owned(),
        run_script: spec.run_script.clone(),
        provision: spec.provision,
        restricted: spec.restricted,
        disabled: spec.disabled,
        is_deprecated: spec.is_deprecated,
        registry: serde_json::to_value(&spec.registry)
            .map_err(WorkerModelRepositoryError::persistence)?,
        envs: serde_json::to_value(&spec.envs).map_err(WorkerModelRepositoryError::persistence)?,
        password: model.password.clone(),
        need_registration: true,
        user_last_modified: model.user_last_modified,
    })
}

pub(super) fn to_changeset(model: &WorkerModel) -> WorkerModelRepositoryResult<WorkerModelChangeset> {
    let spec = model.spec();
    let registration = model.registration();
    let spawn_errors = model.spawn_errors();

    Ok(WorkerModelChangeset {
        name: model.name().as_str().to_owned(),
        group_id: model.group_id().into_inner(),
        model_type: spec.model_type.as_str().to_owned(),
        image: spec.image.clone(),
        description: spec.description.clone(),
        template: spec.template.clone(),
        communication: spec.communication.as_str().to_owned(),
        run_script: spec.run_script.clone(),
        provision: spec.provision,
        restricted: spec.restricted,
        disabled: spec.disabled,
        is_deprecated: spec.is_deprecated,
        registry: serde_json::to_value(&spec.registry)
            .map_err(WorkerModelRepositoryError::persistence)?,
        envs: serde_json::to_value(&spec.envs).map_err(WorkerModelRepositoryError::persistence)?,
        password: model.password().map(str::to_owned),
        need_registration: registration.need_registration,
        last_registration: registration.last_registration,
        registered_os: registration.registered_os.clone(),
        registered_arch: registration.registered_arch.clone(),
        registered_epoch: i64::try_from(registration.registered_epoch.value())
            .map_err(WorkerModelRepositoryError::persistence)?,
        nb_spawn_err: i32::try_from(spawn_errors.count)
            .map_err(WorkerModelRepositoryError::persistence)?,
        last_spawn_err: spawn_errors.last_error.clone(),
        last_spawn_err_logs: spawn_errors.last_logs.clone(),
        date_last_spawn_err: spawn_errors.last_date,
        user_last_modified: model.user_last_modified(),
    })
}

pub(super) fn row_to_model(row: WorkerModelRow) -> WorkerModelRepositoryResult<WorkerModel> {
    let WorkerModelRow {
        id,
        name,
        group_id,
        model_type,
        image,
        description,
        template,
        communication,
        run_script,
        provision,
        restricted,
        disabled,
        is_deprecated,
        registry,
        envs,
        password,
        need_registration,
        last_registration,
        registered_os,
        registered_arch,
        registered_epoch,
        nb_spawn_err,
        last_spawn_err,
        last_spawn_err_logs,
        date_last_spawn_err,
        user_last_modified,
    } = row;

    let spec = ModelSpec {
        model_type: ModelType::try_from(model_type.as_str())
            .map_err(WorkerModelRepositoryError::invalid_persisted_data)?,
        image,
        description,
        template,
        communication: Communication::try_from(communication.as_str())
            .map_err(WorkerModelRepositoryError::invalid_persisted_data)?,
        run_script,
        provision,
        restricted,
        disabled,
        is_deprecated,
        registry: serde_json::from_value(registry)
            .map_err(WorkerModelRepositoryError::invalid_persisted_data)?,
        envs: serde_json::from_value(envs)
            .map_err(WorkerModelRepositoryError::invalid_persisted_data)?,
    };

    let data = PersistedModelData {
        id: ModelId::new(id),
        name: ModelName::new(name).map_err(WorkerModelRepositoryError::invalid_persisted_data)?,
        group_id: GroupId::new(group_id),
        spec,
        password,
        registration: RegistrationState {
            need_registration,
            last_registration,
            registered_os,
            registered_arch,
            registered_epoch: RecheckEpoch::new(
                u64::try_from(registered_epoch)
                    .map_err(WorkerModelRepositoryError::invalid_persisted_data)?,
            ),
        },
        spawn_errors: SpawnErrorState {
            count: u32::try_from(nb_spawn_err)
                .map_err(WorkerModelRepositoryError::invalid_persisted_data)?,
            last_error: last_spawn_err,
            last_logs: last_spawn_err_logs,
            last_date: date_last_spawn_err,
        },
        user_last_modified,
    };
    Ok(WorkerModel::from_persisted(data))
}

fn to_capability_row(id: ModelId, capability: &Requirement) -> CapabilityRow {
    CapabilityRow {
        worker_model_id: id.into_inner(),
        name: capability.name().to_owned(),
        capability_type: capability.kind().as_str().to_owned(),
        argument: capability.value().to_owned(),
    }
}

fn row_to_requirement(row: CapabilityRow) -> WorkerModelRepositoryResult<Requirement> {
    let kind = RequirementType::try_from(row.capability_type.as_str())
        .map_err(WorkerModelRepositoryError::invalid_persisted_data)?;
    Ok(Requirement::new(row.name, kind, row.argument))
}
