//! Application services for worker model registration coordination.

mod config;
mod environment;
mod lease;
mod lifecycle;
mod recheck;
mod requirements;
mod vault;
mod view;

pub use config::{
    DEFAULT_CACHE_TTL, DEFAULT_LEASE_TTL, DEFAULT_SHARED_INFRA_GROUP, WorkerModelConfig,
};
pub use environment::{
    DEFAULT_WORKER_ENVS, EnvironmentRenderError, SpawnContext, merge_default_envs,
    render_environment,
};
pub use lease::{LeaseError, LeaseResult, RegistrationLease, booking_key};
pub use lifecycle::{ModelLifecycleError, ModelLifecycleResult, ModelLifecycleService};
pub use recheck::{RECHECK_EPOCH_KEY, RecheckSignal};
pub use requirements::{RequirementError, RequirementEvaluator, RequirementResult};
pub use vault::{CredentialAccess, CredentialVault, VaultError, VaultResult};
pub use view::{
    ModelView, ModelViewError, ModelViewResult, group_cache_key, user_cache_key,
};
