//! Tunables shared by the worker model services.

use crate::worker_model::domain::GroupId;
use std::time::Duration;

/// Default registration booking lifetime.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(360);

/// Default lifetime of cached model listings.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Default identifier of the shared-infrastructure group.
pub const DEFAULT_SHARED_INFRA_GROUP: GroupId = GroupId::new(1);

/// Worker model service configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerModelConfig {
    lease_ttl: Duration,
    cache_ttl: Duration,
    shared_infra_group: GroupId,
}

impl Default for WorkerModelConfig {
    fn default() -> Self {
        Self {
            lease_ttl: DEFAULT_LEASE_TTL,
            cache_ttl: DEFAULT_CACHE_TTL,
            shared_infra_group: DEFAULT_SHARED_INFRA_GROUP,
        }
    }
}

impl WorkerModelConfig {
    /// Overrides the registration booking lifetime.
    #[must_use]
    pub const fn with_lease_ttl(mut self, ttl: Duration) -> Self {
        self.lease_ttl = ttl;
        self
    }

    /// Overrides the cached listing lifetime.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Overrides the shared-infrastructure group.
    #[must_use]
    pub const fn with_shared_infra_group(mut self, group: GroupId) -> Self {
        self.shared_infra_group = group;
        self
    }

    /// Returns the registration booking lifetime.
    #[must_use]
    pub const fn lease_ttl(&self) -> Duration {
        self.lease_ttl
    }

    /// Returns the cached listing lifetime.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Returns the group whose models are visible to everyone.
    #[must_use]
    pub const fn shared_infra_group(&self) -> GroupId {
        self.shared_infra_group
    }
}
