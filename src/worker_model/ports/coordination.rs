//! Shared key-value coordination store port.
//!
//! Every hatchery and API node talks to the same coordination store. It
//! holds registration bookings, cached listings, and the recheck epoch
//! counter. Values are opaque strings; entries written with a TTL stop
//! being visible once it elapses.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for coordination store operations.
pub type CoordinationResult<T> = Result<T, CoordinationError>;

/// Key-value store shared by all hatcheries.
///
/// Implementations must never block waiting for a key to change; every
/// operation completes with an immediate answer.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Returns the value stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> CoordinationResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CoordinationResult<()>;

    /// Stores `value` under `key` only when no unexpired value exists.
    ///
    /// Returns `true` when this call created the entry. The check and the
    /// write are a single atomic operation: among concurrent callers for
    /// the same key, at most one observes `true`.
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CoordinationResult<bool>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> CoordinationResult<()>;

    /// Atomically increments the counter stored under `key` and returns
    /// the new value. Missing counters start from zero.
    async fn increment(&self, key: &str) -> CoordinationResult<u64>;
}

/// Errors returned by coordination store implementations.
#[derive(Debug, Clone, Error)]
pub enum CoordinationError {
    /// A counter key holds a value that is not an unsigned integer.
    #[error("coordination key '{0}' does not hold a counter")]
    NotACounter(String),

    /// The store could not be reached or rejected the operation.
    #[error("coordination store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl CoordinationError {
    /// Wraps a store failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
