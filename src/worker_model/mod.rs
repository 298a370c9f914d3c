//! Worker model registration coordination.
//!
//! Worker models describe how hatcheries provision workers (image,
//! credentials, capabilities). Several hatcheries run concurrently, so the
//! module arbitrates who registers a model, tracks when the whole fleet
//! must be re-checked, and projects model rows for readers. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
