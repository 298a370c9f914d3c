//! Port contracts for worker model coordination.
//!
//! Ports define infrastructure-agnostic interfaces used by the worker model
//! services: relational persistence of models and capabilities, the shared
//! coordination store used for bookings and caching, and the secret cipher.

pub mod cipher;
pub mod coordination;
pub mod repository;

pub use cipher::{Cipher, CipherError};
pub use coordination::{CoordinationError, CoordinationResult, CoordinationStore};
pub use repository::{
    WorkerModelRepository, WorkerModelRepositoryError, WorkerModelRepositoryResult,
};
