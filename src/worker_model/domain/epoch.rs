//! Fleet-wide recheck generation counter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation of the fleet-wide registration recheck signal.
///
/// Each time a job requires a binary no model is known to provide, the
/// epoch is bumped. A model whose registration was stamped with an older
/// epoch must be re-checked before use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecheckEpoch(u64);

impl RecheckEpoch {
    /// The epoch in effect before any recheck was ever raised.
    pub const INITIAL: Self = Self(0);

    /// Wraps a raw epoch value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw epoch value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns `true` when a registration stamped with `self` predates
    /// `current`.
    #[must_use]
    pub fn is_stale(self, current: Self) -> bool {
        self < current
    }
}

impl fmt::Display for RecheckEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
