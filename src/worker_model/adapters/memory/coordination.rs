//! In-memory coordination store with clock-driven expiry.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::worker_model::ports::{CoordinationError, CoordinationResult, CoordinationStore};

/// Thread-safe in-memory coordination store.
///
/// Expiry is passive: an entry whose deadline has passed according to the
/// injected clock is treated as absent and dropped on the next access.
#[derive(Debug)]
pub struct InMemoryCoordinationStore<C>
where
    C: Clock + Send + Sync,
{
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Arc<C>,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

impl<C> Clone for InMemoryCoordinationStore<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> InMemoryCoordinationStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store evaluating TTLs against `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    fn lock(&self) -> CoordinationResult<MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|err| CoordinationError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn deadline(&self, ttl: Duration) -> CoordinationResult<DateTime<Utc>> {
        let delta = TimeDelta::from_std(ttl).map_err(CoordinationError::unavailable)?;
        Ok(self.clock.utc() + delta)
    }

    fn live_value(
        entries: &mut HashMap<String, Entry>,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<String> {
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl<C> CoordinationStore for InMemoryCoordinationStore<C>
where
    C: Clock + Send + Sync,
{
    async fn get(&self, key: &str) -> CoordinationResult<Option<String>> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        Ok(Self::live_value(&mut entries, key, now))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CoordinationResult<()> {
        let expires_at = self.deadline(ttl)?;
        let mut entries = self.lock()?;
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CoordinationResult<bool> {
        let now = self.clock.utc();
        let expires_at = self.deadline(ttl)?;
        let mut entries = self.lock()?;
        if Self::live_value(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: Some(expires_at),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> CoordinationResult<()> {
        let mut entries = self.lock()?;
        entries.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str) -> CoordinationResult<u64> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        let current = match Self::live_value(&mut entries, key, now) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| CoordinationError::NotACounter(key.to_owned()))?,
            None => 0,
        };
        let next = current.saturating_add(1);
        entries.insert(
            key.to_owned(),
            Entry {
                value: next.to_string(),
                expires_at: None,
            },
        );
        Ok(next)
    }
}
