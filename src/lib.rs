//! Hatchery: worker model registration coordination.
//!
//! This crate provides the coordination core used by autonomous
//! provisioning agents ("hatcheries") that spawn CI/CD workers from shared
//! worker models. It decides when a model must be (re-)registered, makes
//! sure only one hatchery registers a model at a time, and serves
//! access-scoped, credential-sanitised model listings.
//!
//! # Architecture
//!
//! Hatchery follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, cache, cipher)
//!
//! # Modules
//!
//! - [`worker_model`]: Worker model registry, registration booking, and
//!   requirement evaluation

pub mod worker_model;
