//! `PostgreSQL` adapters for worker model persistence and coordination.

mod coordination;
mod models;
mod repository;
mod schema;

pub use coordination::PostgresCoordinationStore;
pub use repository::{PostgresWorkerModelRepository, WorkerModelPgPool};
