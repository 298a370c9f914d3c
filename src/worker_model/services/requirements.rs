//! Job requirement evaluation against the capabilities known to the fleet.

use super::RecheckSignal;
use crate::worker_model::{
    domain::{ExclusiveRequirement, Requirement, RequirementAssessment},
    ports::{CoordinationError, CoordinationStore, WorkerModelRepository, WorkerModelRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by [`RequirementEvaluator`].
#[derive(Debug, Error)]
pub enum RequirementError {
    /// A job declares an exclusive requirement more than once.
    #[error("conflicting requirements: {0} declared more than once")]
    ConflictingRequirement(ExclusiveRequirement),

    /// Known capabilities could not be loaded.
    #[error(transparent)]
    Repository(#[from] WorkerModelRepositoryError),

    /// The recheck signal could not be raised.
    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

/// Result type for requirement evaluation.
pub type RequirementResult<T> = Result<T, RequirementError>;

/// Decides whether a job's requirements force a fleet-wide recheck and
/// whether they are consistent.
#[derive(Debug)]
pub struct RequirementEvaluator<R, S>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
{
    repository: Arc<R>,
    signal: RecheckSignal<S>,
}

impl<R, S> Clone for RequirementEvaluator<R, S>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            signal: self.signal.clone(),
        }
    }
}

impl<R, S> RequirementEvaluator<R, S>
where
    R: WorkerModelRepository,
    S: CoordinationStore,
{
    /// Creates an evaluator.
    #[must_use]
    pub const fn new(repository: Arc<R>, signal: RecheckSignal<S>) -> Self {
        Self { repository, signal }
    }

    /// Diffs `requirements` against `known_binaries`.
    ///
    /// When a binary is unknown the recheck epoch is raised before the
    /// requirements are validated, so a single job may both trigger a
    /// recheck and be rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RequirementError::ConflictingRequirement`] for the first
    /// exclusive category declared more than once, in the order os-arch,
    /// model, hostname.
    pub async fn compute_registration_needs(
        &self,
        known_binaries: &[Requirement],
        requirements: &[Requirement],
    ) -> RequirementResult<RequirementAssessment> {
        let assessment = RequirementAssessment::assess(known_binaries, requirements);

        if let Some(binary) = assessment.unknown_binary() {
            let epoch = self.signal.raise().await?;
            info!(binary, epoch = %epoch, "unknown binary requested, worker models marked for recheck");
        }

        if let Some(category) = assessment.conflict() {
            warn!(category = %category, "job declares conflicting requirements");
            return Err(RequirementError::ConflictingRequirement(category));
        }

        Ok(assessment)
    }

    /// Evaluates `requirements` against every binary capability currently
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`RequirementError::Repository`] when capabilities cannot be
    /// loaded, otherwise as [`Self::compute_registration_needs`].
    pub async fn evaluate_job(
        &self,
        requirements: &[Requirement],
    ) -> RequirementResult<RequirementAssessment> {
        let known_binaries = self.repository.binary_capabilities().await?;
        self.compute_registration_needs(&known_binaries, requirements)
            .await
    }
}
