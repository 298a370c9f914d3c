//! Shared helpers for `PostgreSQL` integration tests.

pub use crate::test_helpers::{ManualClock, SHARED_INFRA, TEAM, docker};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use hatchery::worker_model::adapters::postgres::{
    PostgresCoordinationStore, PostgresWorkerModelRepository, WorkerModelPgPool,
};
use pg_embedded_setup_unpriv::TestCluster;
pub use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Boxed error used by setup helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the worker model and coordination tables.
const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_worker_models/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "hatchery_test_template";

/// Creates a runtime whose blocking pool lets adapter calls overlap.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("schema setup failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)
}

/// Database cloned from the migrated template and dropped with the guard.
///
/// Declare it before any adapter built from its pool so the pool's
/// connections are closed by the time the database is dropped.
pub struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
}

impl TestDatabase {
    /// Creates a fresh database named after `prefix`.
    pub fn create(cluster: &'static TestCluster, prefix: &str) -> Result<Self, BoxError> {
        ensure_template(cluster)?;
        let name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .map_err(|e| Box::new(e) as BoxError)?;
        Ok(Self { cluster, name })
    }

    /// Builds a pool of at most `max_size` connections.
    pub fn pool(&self, max_size: u32) -> Result<WorkerModelPgPool, BoxError> {
        let url = self.cluster.connection().database_url(&self.name);
        Pool::builder()
            .max_size(max_size)
            .build(ConnectionManager::<PgConnection>::new(url))
            .map_err(|e| Box::new(e) as BoxError)
    }

    /// Builds a repository over a single-connection pool.
    pub fn repository(&self) -> PostgresWorkerModelRepository {
        PostgresWorkerModelRepository::new(self.pool(1).expect("repository pool"))
    }

    /// Builds a repository whose pool allows concurrent writers.
    pub fn shared_repository(&self, max_size: u32) -> PostgresWorkerModelRepository {
        PostgresWorkerModelRepository::new(self.pool(max_size).expect("repository pool"))
    }

    /// Builds a coordination store driven by `clock`.
    pub fn store(
        &self,
        clock: &Arc<ManualClock>,
        max_size: u32,
    ) -> PostgresCoordinationStore<ManualClock> {
        PostgresCoordinationStore::new(self.pool(max_size).expect("store pool"), Arc::clone(clock))
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.name);
        }
    }
}
