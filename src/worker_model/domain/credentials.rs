//! Registry credentials and the password placeholder convention.

use serde::{Deserialize, Serialize};

/// Value substituted for a stored password on every non-privileged read.
///
/// The placeholder contains characters outside the base64 alphabet, so it
/// can never collide with an encrypted password token.
pub const PASSWORD_PLACEHOLDER: &str = "**********";

/// Non-secret part of the credentials used to pull a model image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAccess {
    /// Whether the image lives in a private registry.
    pub private: bool,
    /// Registry address, when not the default one.
    pub registry: Option<String>,
    /// Registry username.
    pub username: Option<String>,
}

/// Requested change to a model password on update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PasswordChange {
    /// Leave the stored password untouched.
    #[default]
    Keep,
    /// Remove the stored password.
    Clear,
    /// Replace the stored password with a new plaintext secret.
    Set(String),
}

impl PasswordChange {
    /// Translates a password submitted by a client into an explicit change.
    ///
    /// Clients read models with the password replaced by
    /// [`PASSWORD_PLACEHOLDER`] and send it back untouched when they do not
    /// intend to change it. A missing field keeps the password as well; only
    /// an explicitly empty value clears it.
    #[must_use]
    pub fn from_submitted(value: Option<&str>) -> Self {
        match value {
            None | Some(PASSWORD_PLACEHOLDER) => Self::Keep,
            Some("") => Self::Clear,
            Some(secret) => Self::Set(secret.to_owned()),
        }
    }
}
