//! Identity of a hatchery holding a registration booking.

use super::HatcheryId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity a hatchery presents when booking a model for registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HatcheryIdentity {
    id: HatcheryId,
    name: String,
}

impl HatcheryIdentity {
    /// Creates a hatchery identity.
    #[must_use]
    pub fn new(id: HatcheryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the hatchery identifier.
    #[must_use]
    pub const fn id(&self) -> HatcheryId {
        self.id
    }

    /// Returns the hatchery display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for HatcheryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
