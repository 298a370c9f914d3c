//! Intent-carrying commands for the worker model lifecycle.
//!
//! Creating, editing, and registering a model touch the registration flag
//! differently, so each intent has its own command type.

use super::{GroupId, ModelId, ModelSpec, PasswordChange, Requirement};
use chrono::{DateTime, Utc};

/// Creates a worker model awaiting its first registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateModel {
    /// Unique model name.
    pub name: String,
    /// Owning group.
    pub group_id: GroupId,
    /// Provisioning spec.
    pub spec: ModelSpec,
    /// Plaintext registry password, if any.
    pub password: Option<String>,
}

impl CreateModel {
    /// Creates a command without a password.
    #[must_use]
    pub fn new(name: impl Into<String>, group_id: GroupId, spec: ModelSpec) -> Self {
        Self {
            name: name.into(),
            group_id,
            spec,
            password: None,
        }
    }

    /// Sets the plaintext registry password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Edits a worker model and requests a new registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateModel {
    /// New unique model name.
    pub name: String,
    /// New owning group.
    pub group_id: GroupId,
    /// New provisioning spec.
    pub spec: ModelSpec,
    /// Requested password change.
    pub password: PasswordChange,
}

impl UpdateModel {
    /// Creates a command that keeps the stored password.
    #[must_use]
    pub fn new(name: impl Into<String>, group_id: GroupId, spec: ModelSpec) -> Self {
        Self {
            name: name.into(),
            group_id,
            spec,
            password: PasswordChange::Keep,
        }
    }

    /// Sets the requested password change.
    #[must_use]
    pub fn with_password(mut self, change: PasswordChange) -> Self {
        self.password = change;
        self
    }
}

/// Records the outcome of a successful registration.
///
/// Completing a registration clears the registration flag and spawn
/// errors, replaces the model's capabilities, and stamps the current
/// recheck epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteRegistration {
    /// Registered model.
    pub model_id: ModelId,
    /// Capabilities discovered by the registration.
    pub capabilities: Vec<Requirement>,
    /// Operating system reported by the worker.
    pub os: Option<String>,
    /// Architecture reported by the worker.
    pub arch: Option<String>,
    /// Last user modification of the model the worker was spawned from.
    ///
    /// When set and the model was edited since, the registration is
    /// discarded.
    pub revision: Option<DateTime<Utc>>,
}

impl CompleteRegistration {
    /// Creates a command for the given model with no capabilities.
    #[must_use]
    pub const fn new(model_id: ModelId) -> Self {
        Self {
            model_id,
            capabilities: Vec::new(),
            os: None,
            arch: None,
            revision: None,
        }
    }

    /// Sets the discovered capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Requirement>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Sets the reported operating system and architecture.
    #[must_use]
    pub fn with_platform(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self.arch = Some(arch.into());
        self
    }

    /// Ties the registration to the model version the worker was spawned from.
    #[must_use]
    pub const fn with_revision(mut self, user_last_modified: DateTime<Utc>) -> Self {
        self.revision = Some(user_last_modified);
        self
    }
}

/// Reports a failed attempt to spawn a worker from a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpawnError {
    message: String,
    logs: Option<Vec<u8>>,
}

impl RecordSpawnError {
    /// Creates a report.
    ///
    /// Container runtimes sometimes report a lone NUL character when a
    /// container fails early; such a message is stored as empty.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        let raw: String = message.into();
        let normalized = if raw == "\0" { String::new() } else { raw };
        Self {
            message: normalized,
            logs: None,
        }
    }

    /// Attaches captured logs.
    #[must_use]
    pub fn with_logs(mut self, logs: impl Into<Vec<u8>>) -> Self {
        self.logs = Some(logs.into());
        self
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the captured logs.
    #[must_use]
    pub fn logs(&self) -> Option<&[u8]> {
        self.logs.as_deref()
    }
}
