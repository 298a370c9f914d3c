//! Adapter implementations for worker model ports.
//!
//! - [`memory`]: in-process model store and coordination store for tests
//!   and single-node deployments
//! - [`postgres`]: `PostgreSQL` model store and coordination store
//! - [`cipher`]: AES-256-GCM secret cipher

pub mod cipher;
pub mod memory;
pub mod postgres;
