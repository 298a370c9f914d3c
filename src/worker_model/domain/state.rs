//! Read-time state filters for worker model listings.

use super::ParseStateLoadOptionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State predicate applied when listing worker models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLoadOption {
    /// Models with at least one recorded spawn error.
    #[serde(rename = "error")]
    SpawnError,
    /// Disabled models.
    Disabled,
    /// Models waiting for registration.
    Register,
    /// Deprecated models.
    Deprecated,
    /// Models that are not deprecated.
    Active,
    /// Models owned by the shared infrastructure group.
    Official,
}

impl StateLoadOption {
    /// Returns the canonical representation, also used in cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpawnError => "error",
            Self::Disabled => "disabled",
            Self::Register => "register",
            Self::Deprecated => "deprecated",
            Self::Active => "active",
            Self::Official => "official",
        }
    }
}

impl fmt::Display for StateLoadOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StateLoadOption {
    type Error = ParseStateLoadOptionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::SpawnError),
            "disabled" => Ok(Self::Disabled),
            "register" => Ok(Self::Register),
            "deprecated" => Ok(Self::Deprecated),
            "active" => Ok(Self::Active),
            "official" => Ok(Self::Official),
            _ => Err(ParseStateLoadOptionError(value.to_owned())),
        }
    }
}
