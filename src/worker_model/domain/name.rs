//! Validated worker model name type.

use super::WorkerModelDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a model name, matching the `VARCHAR(100)` column.
const MAX_NAME_LENGTH: usize = 100;

/// Unique, human-readable worker model name.
///
/// Names are case-sensitive and restricted to ASCII alphanumerics, `.`,
/// `_` and `-` (e.g. `debian-12`, `go_1.22`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    /// Creates a validated model name.
    ///
    /// The input is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerModelDomainError::EmptyModelName`] when the value is
    /// empty after trimming, [`WorkerModelDomainError::InvalidModelName`]
    /// when it contains characters outside `[A-Za-z0-9._-]`, or
    /// [`WorkerModelDomainError::ModelNameTooLong`] when it exceeds 100
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkerModelDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(WorkerModelDomainError::EmptyModelName);
        }

        if trimmed.len() > MAX_NAME_LENGTH {
            return Err(WorkerModelDomainError::ModelNameTooLong(raw));
        }

        let is_valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if !is_valid {
            return Err(WorkerModelDomainError::InvalidModelName(raw));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the model name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModelName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
