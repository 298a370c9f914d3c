//! Secret cipher port.

use thiserror::Error;

/// Symmetric cipher used to protect stored secrets.
pub trait Cipher: Send + Sync {
    /// Encrypts `plaintext`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError`] when the cipher cannot encrypt.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypts bytes produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError`] for malformed or foreign ciphertext.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// Errors returned by cipher implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The cipher key is missing or malformed.
    #[error("invalid cipher key: {0}")]
    InvalidKey(String),

    /// The ciphertext is truncated or was not produced by this cipher.
    #[error("ciphertext rejected: {0}")]
    Rejected(String),

    /// Any other cipher failure.
    #[error("cipher failure: {0}")]
    Failure(String),
}
