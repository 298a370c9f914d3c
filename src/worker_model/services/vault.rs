//! Credential vault: password encryption and the placeholder convention.

use crate::worker_model::{
    domain::{PASSWORD_PLACEHOLDER, PasswordChange, WorkerModel, WorkerModelDomainError},
    ports::{Cipher, CipherError},
};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`CredentialVault`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    /// The cipher failed to encrypt a secret.
    #[error("failed to encrypt secret: {0}")]
    Encryption(CipherError),

    /// The cipher rejected a stored token.
    #[error("failed to decrypt secret: {0}")]
    Decryption(CipherError),

    /// A stored token is not valid base64.
    #[error("failed to decode secret token: {0}")]
    Decoding(String),

    /// A decrypted password is not valid UTF-8.
    #[error("decrypted password is not text: {0}")]
    NotText(String),

    /// The submitted secret cannot be stored.
    #[error(transparent)]
    Domain(#[from] WorkerModelDomainError),
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Which representation of the password a read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialAccess {
    /// The password is replaced by [`PASSWORD_PLACEHOLDER`].
    #[default]
    Redacted,
    /// The password of a private-registry model is decrypted to
    /// plaintext; other passwords are redacted.
    Decrypted,
}

/// Encrypts and decrypts stored model secrets.
///
/// Tokens are the cipher output encoded as standard base64.
#[derive(Debug)]
pub struct CredentialVault<Ci>
where
    Ci: Cipher,
{
    cipher: Arc<Ci>,
}

impl<Ci> Clone for CredentialVault<Ci>
where
    Ci: Cipher,
{
    fn clone(&self) -> Self {
        Self {
            cipher: Arc::clone(&self.cipher),
        }
    }
}

impl<Ci> CredentialVault<Ci>
where
    Ci: Cipher,
{
    /// Creates a vault over `cipher`.
    #[must_use]
    pub const fn new(cipher: Arc<Ci>) -> Self {
        Self { cipher }
    }

    /// Encrypts plaintext bytes into a storable token.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Encryption`] when the cipher fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> VaultResult<String> {
        let sealed = self
            .cipher
            .encrypt(plaintext)
            .map_err(VaultError::Encryption)?;
        Ok(general_purpose::STANDARD.encode(sealed))
    }

    /// Decrypts a stored token back to its plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Decoding`] when the token is not base64 and
    /// [`VaultError::Decryption`] when the cipher rejects it.
    pub fn decrypt(&self, token: &str) -> VaultResult<Vec<u8>> {
        let sealed = general_purpose::STANDARD
            .decode(token)
            .map_err(|err| VaultError::Decoding(err.to_string()))?;
        self.cipher.decrypt(&sealed).map_err(VaultError::Decryption)
    }

    /// Replaces the password of `model` with the placeholder.
    ///
    /// Models without a password are left untouched; redacting twice is the
    /// same as redacting once.
    pub fn redact(model: &mut WorkerModel) {
        model.redact_password();
    }

    /// Replaces the stored token of `model` with its plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError`] when the token cannot be decrypted and
    /// [`VaultError::NotText`] when the plaintext is not UTF-8.
    pub fn reveal(&self, model: &mut WorkerModel) -> VaultResult<()> {
        let Some(token) = model.password() else {
            return Ok(());
        };
        let opened = self.decrypt(token)?;
        let plaintext =
            String::from_utf8(opened).map_err(|err| VaultError::NotText(err.to_string()))?;
        model.replace_password(Some(plaintext));
        Ok(())
    }

    /// Applies the requested credential representation to `model`.
    ///
    /// Only models pulling from a private registry have their password
    /// decrypted; any other stored password is redacted even on a
    /// privileged read, since no worker would use it.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError`] when decryption is requested and fails.
    pub fn present(&self, model: &mut WorkerModel, access: CredentialAccess) -> VaultResult<()> {
        match access {
            CredentialAccess::Decrypted if model.spec().registry.private => self.reveal(model),
            CredentialAccess::Redacted | CredentialAccess::Decrypted => {
                Self::redact(model);
                Ok(())
            }
        }
    }

    /// Encrypts a newly submitted password.
    ///
    /// Empty or absent secrets store no password.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Domain`] when the placeholder is submitted as
    /// a secret and [`VaultError::Encryption`] when the cipher fails.
    pub fn seal(&self, secret: Option<&str>) -> VaultResult<Option<String>> {
        match secret {
            Some(PASSWORD_PLACEHOLDER) => Err(WorkerModelDomainError::InvalidCredential.into()),
            Some(value) if !value.is_empty() => self.encrypt(value.as_bytes()).map(Some),
            _ => Ok(None),
        }
    }

    /// Resolves the token to store after a password change.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError`] when a new secret cannot be sealed.
    pub fn apply_change(
        &self,
        current: Option<&str>,
        change: &PasswordChange,
    ) -> VaultResult<Option<String>> {
        match change {
            PasswordChange::Keep => Ok(current.map(str::to_owned)),
            PasswordChange::Clear => Ok(None),
            PasswordChange::Set(secret) => self.seal(Some(secret)),
        }
    }
}
