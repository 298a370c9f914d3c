//! Fleet-wide recheck signal backed by a coordination counter.

use crate::worker_model::{
    domain::RecheckEpoch,
    ports::{CoordinationError, CoordinationResult, CoordinationStore},
};
use std::sync::Arc;
use tracing::debug;

/// Coordination key of the recheck epoch counter.
pub const RECHECK_EPOCH_KEY: &str = "workermodel:recheck:epoch";

/// Reads and raises the recheck epoch.
#[derive(Debug)]
pub struct RecheckSignal<S>
where
    S: CoordinationStore,
{
    store: Arc<S>,
}

impl<S> Clone for RecheckSignal<S>
where
    S: CoordinationStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> RecheckSignal<S>
where
    S: CoordinationStore,
{
    /// Creates a signal over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the current epoch; [`RecheckEpoch::INITIAL`] when no recheck
    /// was ever raised.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::NotACounter`] when the counter entry is
    /// corrupt, or [`CoordinationError::Unavailable`] when the store fails.
    pub async fn current(&self) -> CoordinationResult<RecheckEpoch> {
        match self.store.get(RECHECK_EPOCH_KEY).await? {
            None => Ok(RecheckEpoch::INITIAL),
            Some(raw) => raw
                .parse::<u64>()
                .map(RecheckEpoch::new)
                .map_err(|_| CoordinationError::NotACounter(RECHECK_EPOCH_KEY.to_owned())),
        }
    }

    /// Marks every model for recheck and returns the new epoch.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError`] when the store fails.
    pub async fn raise(&self) -> CoordinationResult<RecheckEpoch> {
        let epoch = RecheckEpoch::new(self.store.increment(RECHECK_EPOCH_KEY).await?);
        debug!(epoch = %epoch, "worker model recheck epoch raised");
        Ok(epoch)
    }
}
