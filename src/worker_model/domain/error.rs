//! Error types for worker model domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing worker model domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerModelDomainError {
    /// The model name is empty after trimming.
    #[error("worker model name must not be empty")]
    EmptyModelName,

    /// The model name contains characters outside `[A-Za-z0-9._-]`.
    #[error(
        "worker model name '{0}' contains invalid characters (only alphanumeric, '.', '_' and '-' allowed)"
    )]
    InvalidModelName(String),

    /// The model name exceeds the 100-character storage limit.
    #[error("worker model name exceeds 100 character limit: {0}")]
    ModelNameTooLong(String),

    /// The model image is empty after trimming.
    #[error("worker model image must not be empty")]
    EmptyImage,

    /// The password placeholder was submitted as a real secret.
    #[error("the password placeholder cannot be used as a password")]
    InvalidCredential,
}

/// Error returned while parsing a requirement type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown requirement type: {0}")]
pub struct ParseRequirementTypeError(pub String);

/// Error returned while parsing a model state load option.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown worker model state filter: {0}")]
pub struct ParseStateLoadOptionError(pub String);

/// Error returned while parsing a model type or communication channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown worker model type: {0}")]
pub struct ParseModelTypeError(pub String);
