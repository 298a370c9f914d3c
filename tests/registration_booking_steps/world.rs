//! Shared world state for registration booking BDD scenarios.

use crate::test_helpers::Fleet;
use hatchery::worker_model::{
    domain::{RequirementAssessment, WorkerModel},
    services::{LeaseResult, RequirementResult},
};
use rstest::fixture;

/// Scenario world for registration booking behaviour tests.
pub struct BookingWorld {
    /// Services under test.
    pub fleet: Fleet,
    /// Model the scenario works on.
    pub model: Option<WorkerModel>,
    /// Result of the last booking attempt.
    pub last_booking: Option<LeaseResult<()>>,
    /// Result of the last job evaluation.
    pub last_assessment: Option<RequirementResult<RequirementAssessment>>,
}

impl BookingWorld {
    /// Creates a world with no model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fleet: Fleet::new(),
            model: None,
            last_booking: None,
            last_assessment: None,
        }
    }

    /// Returns the scenario model.
    ///
    /// # Errors
    ///
    /// Returns an error when no model was created yet.
    pub fn model(&self) -> Result<&WorkerModel, eyre::Report> {
        self.model
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no worker model in scenario world"))
    }
}

impl Default for BookingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BookingWorld {
    BookingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
