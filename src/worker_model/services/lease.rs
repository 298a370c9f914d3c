//! Exclusive, time-bounded booking of a model for registration.

use super::WorkerModelConfig;
use crate::worker_model::{
    domain::{HatcheryIdentity, ModelId},
    ports::{CoordinationError, CoordinationStore},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by [`RegistrationLease`].
#[derive(Debug, Error)]
pub enum LeaseError {
    /// Another hatchery holds the booking.
    #[error("worker model {model_id} already booked{}", describe_holder(.holder.as_ref()))]
    AlreadyBooked {
        /// Booked model.
        model_id: ModelId,
        /// Current holder, unless the booking expired in the meantime.
        holder: Option<HatcheryIdentity>,
    },

    /// A booking entry could not be encoded or decoded.
    #[error("invalid booking for worker model {model_id}: {source}")]
    InvalidBooking {
        /// Booked model.
        model_id: ModelId,
        /// Serialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The coordination store failed.
    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

fn describe_holder(holder: Option<&HatcheryIdentity>) -> String {
    holder.map_or_else(String::new, |identity| format!(" by {identity}"))
}

/// Result type for lease operations.
pub type LeaseResult<T> = Result<T, LeaseError>;

/// Returns the coordination key of a model's booking.
#[must_use]
pub fn booking_key(model_id: ModelId) -> String {
    format!("book:workermodel:{model_id}")
}

/// Registration booking manager.
///
/// A booking is a single coordination entry written with an atomic
/// set-if-absent, so among hatcheries racing for the same model exactly one
/// wins until the booking is released or expires.
#[derive(Debug)]
pub struct RegistrationLease<S>
where
    S: CoordinationStore,
{
    store: Arc<S>,
    ttl: Duration,
}

impl<S> Clone for RegistrationLease<S>
where
    S: CoordinationStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
        }
    }
}

impl<S> RegistrationLease<S>
where
    S: CoordinationStore,
{
    /// Creates a lease manager using the configured booking lifetime.
    #[must_use]
    pub const fn new(store: Arc<S>, config: &WorkerModelConfig) -> Self {
        Self {
            store,
            ttl: config.lease_ttl(),
        }
    }

    /// Books `model_id` for registration by `holder`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::AlreadyBooked`] with the current holder when
    /// the model is already booked, or [`LeaseError::Coordination`] when the
    /// store fails.
    pub async fn acquire(&self, model_id: ModelId, holder: &HatcheryIdentity) -> LeaseResult<()> {
        let value = serde_json::to_string(holder)
            .map_err(|source| LeaseError::InvalidBooking { model_id, source })?;
        let key = booking_key(model_id);

        if self.store.set_if_absent_with_ttl(&key, &value, self.ttl).await? {
            info!(model_id = %model_id, holder = %holder, "worker model booked for registration");
            return Ok(());
        }

        let current = self.holder(model_id).await?;
        warn!(
            model_id = %model_id,
            requested_by = %holder,
            holder = %describe_holder(current.as_ref()),
            "worker model booking rejected"
        );
        Err(LeaseError::AlreadyBooked {
            model_id,
            holder: current,
        })
    }

    /// Releases the booking of `model_id`, whoever holds it.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::Coordination`] when the store fails.
    pub async fn release(&self, model_id: ModelId) -> LeaseResult<()> {
        self.store.delete(&booking_key(model_id)).await?;
        info!(model_id = %model_id, "worker model booking released");
        Ok(())
    }

    /// Returns the hatchery currently holding the booking of `model_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidBooking`] when the stored entry cannot be
    /// decoded, or [`LeaseError::Coordination`] when the store fails.
    pub async fn holder(&self, model_id: ModelId) -> LeaseResult<Option<HatcheryIdentity>> {
        let Some(raw) = self.store.get(&booking_key(model_id)).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| LeaseError::InvalidBooking { model_id, source })
    }
}
