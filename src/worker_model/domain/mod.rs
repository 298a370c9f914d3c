//! Domain model for worker models and their registration state.
//!
//! The worker model domain covers the model aggregate, its capabilities
//! (requirements), read-time filters, and the intent-carrying commands used
//! to create, update, and register models. All infrastructure concerns are
//! kept outside the domain boundary.

mod commands;
mod credentials;
mod epoch;
mod error;
mod filter;
mod hatchery;
mod ids;
mod kind;
mod model;
mod name;
mod requester;
mod requirement;
mod state;

pub use commands::{CompleteRegistration, CreateModel, RecordSpawnError, UpdateModel};
pub use credentials::{PASSWORD_PLACEHOLDER, PasswordChange, RegistryAccess};
pub use epoch::RecheckEpoch;
pub use error::{
    ParseModelTypeError, ParseRequirementTypeError, ParseStateLoadOptionError,
    WorkerModelDomainError,
};
pub use filter::{GroupScope, ModelFilter};
pub use hatchery::HatcheryIdentity;
pub use ids::{GroupId, HatcheryId, ModelId};
pub use kind::{Communication, ModelType};
pub use model::{
    ModelKey, ModelSpec, NewWorkerModel, PersistedModelData, RegistrationState, SpawnErrorState,
    WorkerModel,
};
pub use name::ModelName;
pub use requester::Requester;
pub use requirement::{ExclusiveRequirement, Requirement, RequirementAssessment, RequirementType};
pub use state::StateLoadOption;
