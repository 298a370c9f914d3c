//! `PostgreSQL`-backed coordination store.
//!
//! Entries live in `coordination_entries`. Expired rows are treated as
//! absent and overwritten by the next conditional write.

use super::{
    WorkerModelPgPool,
    models::{CoordinationEntryRow, CounterRow},
    schema::coordination_entries,
};
use crate::worker_model::ports::{CoordinationError, CoordinationResult, CoordinationStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_types::Varchar;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

const INCREMENT_SQL: &str = "INSERT INTO coordination_entries (key, value, expires_at) \
     VALUES ($1, '1', NULL) \
     ON CONFLICT (key) DO UPDATE \
     SET value = ((coordination_entries.value)::BIGINT + 1)::TEXT, expires_at = NULL \
     RETURNING value::BIGINT AS value";

/// Coordination store shared through a `PostgreSQL` table.
#[derive(Debug)]
pub struct PostgresCoordinationStore<C>
where
    C: Clock + Send + Sync,
{
    pool: WorkerModelPgPool,
    clock: Arc<C>,
}

impl<C> Clone for PostgresCoordinationStore<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> PostgresCoordinationStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a store over `pool`, computing deadlines from `clock`.
    #[must_use]
    pub const fn new(pool: WorkerModelPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    fn deadline(&self, ttl: Duration) -> CoordinationResult<DateTime<Utc>> {
        let delta = TimeDelta::from_std(ttl).map_err(CoordinationError::unavailable)?;
        Ok(self.clock.utc() + delta)
    }

    async fn run_blocking<F, T>(&self, f: F) -> CoordinationResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CoordinationResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(CoordinationError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(CoordinationError::unavailable)?
    }
}

impl From<DieselError> for CoordinationError {
    fn from(err: DieselError) -> Self {
        Self::unavailable(err)
    }
}

#[async_trait]
impl<C> CoordinationStore for PostgresCoordinationStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> CoordinationResult<Option<String>> {
        let now = self.clock.utc();
        let lookup = key.to_owned();
        self.run_blocking(move |connection| {
            let row = coordination_entries::table
                .filter(coordination_entries::key.eq(lookup))
                .select(CoordinationEntryRow::as_select())
                .first::<CoordinationEntryRow>(connection)
                .optional()?;
            Ok(row
                .filter(|entry| entry.expires_at.is_none_or(|deadline| now < deadline))
                .map(|entry| entry.value))
        })
        .await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CoordinationResult<()> {
        let entry = CoordinationEntryRow {
            key: key.to_owned(),
            value: value.to_owned(),
            expires_at: Some(self.deadline(ttl)?),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(coordination_entries::table)
                .values(&entry)
                .on_conflict(coordination_entries::key)
                .do_update()
                .set((
                    coordination_entries::value.eq(&entry.value),
                    coordination_entries::expires_at.eq(entry.expires_at),
                ))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CoordinationResult<bool> {
        let now = self.clock.utc();
        let entry = CoordinationEntryRow {
            key: key.to_owned(),
            value: value.to_owned(),
            expires_at: Some(self.deadline(ttl)?),
        };
        self.run_blocking(move |connection| {
            connection.transaction::<_, CoordinationError, _>(|tx| {
                diesel::delete(
                    coordination_entries::table
                        .filter(coordination_entries::key.eq(&entry.key))
                        .filter(coordination_entries::expires_at.le(now)),
                )
                .execute(tx)?;

                let inserted = diesel::insert_into(coordination_entries::table)
                    .values(&entry)
                    .on_conflict_do_nothing()
                    .execute(tx)?;
                Ok(inserted == 1)
            })
        })
        .await
    }

    async fn delete(&self, key: &str) -> CoordinationResult<()> {
        let target = key.to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(coordination_entries::table.filter(coordination_entries::key.eq(target)))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn increment(&self, key: &str) -> CoordinationResult<u64> {
        let counter = key.to_owned();
        self.run_blocking(move |connection| {
            let row = diesel::sql_query(INCREMENT_SQL)
                .bind::<Varchar, _>(&counter)
                .get_result::<CounterRow>(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(..) => {
                        CoordinationError::NotACounter(counter.clone())
                    }
                    other => CoordinationError::unavailable(other),
                })?;
            u64::try_from(row.value).map_err(|_| CoordinationError::NotACounter(counter.clone()))
        })
        .await
    }
}
