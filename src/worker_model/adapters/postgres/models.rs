//! Diesel row models for worker model persistence.

use super::schema::{coordination_entries, worker_capabilities, worker_models};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for worker model records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = worker_models)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkerModelRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Unique model name.
    pub name: String,
    /// Owning group.
    pub group_id: i64,
    /// Provisioning technology.
    pub model_type: String,
    /// Image reference.
    pub image: String,
    /// Free-form description.
    pub description: String,
    /// Provider-specific template.
    pub template: Option<String>,
    /// Worker communication channel.
    pub communication: String,
    /// Worker boot script.
    pub run_script: String,
    /// Number of pre-provisioned workers.
    pub provision: i64,
    /// Restricted flag.
    pub restricted: bool,
    /// Disabled flag.
    pub disabled: bool,
    /// Deprecated flag.
    pub is_deprecated: bool,
    /// Registry access JSON payload.
    pub registry: Value,
    /// Environment variables JSON payload.
    pub envs: Value,
    /// Encrypted password token.
    pub password: Option<String>,
    /// Registration required before use.
    pub need_registration: bool,
    /// Last registration completion time.
    pub last_registration: Option<DateTime<Utc>>,
    /// Registered operating system.
    pub registered_os: Option<String>,
    /// Registered architecture.
    pub registered_arch: Option<String>,
    /// Recheck epoch stamped by the last registration.
    pub registered_epoch: i64,
    /// Spawn failure counter.
    pub nb_spawn_err: i32,
    /// Last spawn failure message.
    pub last_spawn_err: Option<String>,
    /// Last spawn failure logs.
    pub last_spawn_err_logs: Option<Vec<u8>>,
    /// Last spawn failure time.
    pub date_last_spawn_err: Option<DateTime<Utc>>,
    /// Last user modification time.
    pub user_last_modified: DateTime<Utc>,
}

/// Insert model for worker model records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = worker_models)]
pub struct NewWorkerModelRow {
    /// Unique model name.
    pub name: String,
    /// Owning group.
    pub group_id: i64,
    /// Provisioning technology.
    pub model_type: String,
    /// Image reference.
    pub image: String,
    /// Free-form description.
    pub description: String,
    /// Provider-specific template.
    pub template: Option<String>,
    /// Worker communication channel.
    pub communication: String,
    /// Worker boot script.
    pub run_script: String,
    /// Number of pre-provisioned workers.
    pub provision: i64,
    /// Restricted flag.
    pub restricted: bool,
    /// Disabled flag.
    pub disabled: bool,
    /// Deprecated flag.
    pub is_deprecated: bool,
    /// Registry access JSON payload.
    pub registry: Value,
    /// Environment variables JSON payload.
    pub envs: Value,
    /// Encrypted password token.
    pub password: Option<String>,
    /// Always `true` for new models.
    pub need_registration: bool,
    /// Creation time.
    pub user_last_modified: DateTime<Utc>,
}

/// Full-row changeset written on update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = worker_models)]
#[diesel(treat_none_as_null = true)]
pub struct WorkerModelChangeset {
    /// Unique model name.
    pub name: String,
    /// Owning group.
    pub group_id: i64,
    /// Provisioning technology.
    pub model_type: String,
    /// Image reference.
    pub image: String,
    /// Free-form description.
    pub description: String,
    /// Provider-specific template.
    pub template: Option<String>,
    /// Worker communication channel.
    pub communication: String,
    /// Worker boot script.
    pub run_script: String,
    /// Number of pre-provisioned workers.
    pub provision: i64,
    /// Restricted flag.
    pub restricted: bool,
    /// Disabled flag.
    pub disabled: bool,
    /// Deprecated flag.
    pub is_deprecated: bool,
    /// Registry access JSON payload.
    pub registry: Value,
    /// Environment variables JSON payload.
    pub envs: Value,
    /// Encrypted password token.
    pub password: Option<String>,
    /// Registration required before use.
    pub need_registration: bool,
    /// Last registration completion time.
    pub last_registration: Option<DateTime<Utc>>,
    /// Registered operating system.
    pub registered_os: Option<String>,
    /// Registered architecture.
    pub registered_arch: Option<String>,
    /// Recheck epoch stamped by the last registration.
    pub registered_epoch: i64,
    /// Spawn failure counter.
    pub nb_spawn_err: i32,
    /// Last spawn failure message.
    pub last_spawn_err: Option<String>,
    /// Last spawn failure logs.
    pub last_spawn_err_logs: Option<Vec<u8>>,
    /// Last spawn failure time.
    pub date_last_spawn_err: Option<DateTime<Utc>>,
    /// Last user modification time.
    pub user_last_modified: DateTime<Utc>,
}

/// Row for worker capability records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = worker_capabilities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CapabilityRow {
    /// Owning worker model.
    pub worker_model_id: i64,
    /// Capability name.
    pub name: String,
    /// Capability type.
    pub capability_type: String,
    /// Capability value.
    pub argument: String,
}

/// Row for coordination entries.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = coordination_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CoordinationEntryRow {
    /// Entry key.
    pub key: String,
    /// Opaque entry value.
    pub value: String,
    /// Expiry deadline.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result row of the counter increment statement.
#[derive(Debug, Clone, QueryableByName)]
pub struct CounterRow {
    /// New counter value.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub value: i64,
}
