//! Worker model type and worker communication channel.

use super::ParseModelTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisioning technology a worker model targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Container image run by a Docker or Swarm hatchery.
    Docker,
    /// Virtual machine image on an `OpenStack` tenant.
    Openstack,
    /// Virtual machine template on a vSphere cluster.
    Vsphere,
    /// Plain process on the hatchery host.
    Host,
}

impl ModelType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Openstack => "openstack",
            Self::Vsphere => "vsphere",
            Self::Host => "host",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ModelType {
    type Error = ParseModelTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "openstack" => Ok(Self::Openstack),
            "vsphere" => Ok(Self::Vsphere),
            "host" => Ok(Self::Host),
            _ => Err(ParseModelTypeError(value.to_owned())),
        }
    }
}

/// Channel used by spawned workers to talk to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Communication {
    /// Polling over HTTP.
    #[default]
    Http,
    /// Streaming over gRPC.
    Grpc,
}

impl Communication {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Grpc => "grpc",
        }
    }
}

impl fmt::Display for Communication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Communication {
    type Error = ParseModelTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "grpc" => Ok(Self::Grpc),
            _ => Err(ParseModelTypeError(value.to_owned())),
        }
    }
}
