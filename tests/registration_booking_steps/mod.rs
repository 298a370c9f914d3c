//! Step definitions for registration booking scenarios.

mod then;
mod when;
pub mod world;
