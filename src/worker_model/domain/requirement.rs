//! Job requirements and worker model capabilities.
//!
//! The same shape is used for what a job asks for (a requirement) and for
//! what a registered model provides (a capability).

use super::ParseRequirementTypeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Category of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    /// A binary that must be on the worker's `PATH`.
    Binary,
    /// Operating system and architecture pair, e.g. `linux/amd64`.
    OsArch,
    /// A specific worker model.
    Model,
    /// A specific worker hostname.
    Hostname,
    /// A sidecar service started next to the worker.
    Service,
    /// Minimum worker memory.
    Memory,
    /// Volume mounted into the worker.
    Volume,
    /// Action plugin installed on the worker.
    Plugin,
}

impl RequirementType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::OsArch => "os-arch",
            Self::Model => "model",
            Self::Hostname => "hostname",
            Self::Service => "service",
            Self::Memory => "memory",
            Self::Volume => "volume",
            Self::Plugin => "plugin",
        }
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RequirementType {
    type Error = ParseRequirementTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            "os-arch" => Ok(Self::OsArch),
            "model" => Ok(Self::Model),
            "hostname" => Ok(Self::Hostname),
            "service" => Ok(Self::Service),
            "memory" => Ok(Self::Memory),
            "volume" => Ok(Self::Volume),
            "plugin" => Ok(Self::Plugin),
            _ => Err(ParseRequirementTypeError(value.to_owned())),
        }
    }
}

/// A named, typed requirement or capability value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    name: String,
    #[serde(rename = "type")]
    kind: RequirementType,
    value: String,
}

impl Requirement {
    /// Creates a requirement.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RequirementType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
        }
    }

    /// Creates a `binary` requirement named after the binary itself.
    #[must_use]
    pub fn binary(binary: impl Into<String>) -> Self {
        let value: String = binary.into();
        Self::new(value.clone(), RequirementType::Binary, value)
    }

    /// Returns the requirement name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the requirement category.
    #[must_use]
    pub const fn kind(&self) -> RequirementType {
        self.kind
    }

    /// Returns the requirement value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Requirement categories a job may declare at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusiveRequirement {
    /// Operating system and architecture.
    OsArch,
    /// Worker model.
    Model,
    /// Worker hostname.
    Hostname,
}

impl ExclusiveRequirement {
    /// Returns the matching requirement type.
    #[must_use]
    pub const fn requirement_type(self) -> RequirementType {
        match self {
            Self::OsArch => RequirementType::OsArch,
            Self::Model => RequirementType::Model,
            Self::Hostname => RequirementType::Hostname,
        }
    }
}

impl fmt::Display for ExclusiveRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.requirement_type().as_str())
    }
}

/// Outcome of diffing a job's requirements against known capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequirementAssessment {
    unknown_binary: Option<String>,
    conflict: Option<ExclusiveRequirement>,
}

impl RequirementAssessment {
    /// Diffs `requirements` against the binaries already known to the fleet.
    ///
    /// The first `binary` requirement whose value no model provides is
    /// recorded and no further binaries are looked up. Exclusive categories
    /// are counted over every requirement; the first over-declared one is
    /// reported, checked in the order os-arch, model, hostname.
    #[must_use]
    pub fn assess(known_binaries: &[Requirement], requirements: &[Requirement]) -> Self {
        let known: HashSet<&str> = known_binaries.iter().map(Requirement::value).collect();
        let mut unknown_binary = None;
        let mut os_arch = 0_usize;
        let mut model = 0_usize;
        let mut hostname = 0_usize;

        for requirement in requirements {
            match requirement.kind() {
                RequirementType::Binary => {
                    if unknown_binary.is_none() && !known.contains(requirement.value()) {
                        unknown_binary = Some(requirement.value().to_owned());
                    }
                }
                RequirementType::OsArch => os_arch += 1,
                RequirementType::Model => model += 1,
                RequirementType::Hostname => hostname += 1,
                RequirementType::Service
                | RequirementType::Memory
                | RequirementType::Volume
                | RequirementType::Plugin => {}
            }
        }

        let conflict = [
            (ExclusiveRequirement::OsArch, os_arch),
            (ExclusiveRequirement::Model, model),
            (ExclusiveRequirement::Hostname, hostname),
        ]
        .into_iter()
        .find(|&(_, count)| count > 1)
        .map(|(category, _)| category);

        Self {
            unknown_binary,
            conflict,
        }
    }

    /// Returns the first binary no model is known to provide.
    #[must_use]
    pub fn unknown_binary(&self) -> Option<&str> {
        self.unknown_binary.as_deref()
    }

    /// Returns `true` when the fleet must be re-checked.
    #[must_use]
    pub const fn requires_recheck(&self) -> bool {
        self.unknown_binary.is_some()
    }

    /// Returns the first exclusive category declared more than once.
    #[must_use]
    pub const fn conflict(&self) -> Option<ExclusiveRequirement> {
        self.conflict
    }
}
