//! AES-256-GCM implementation of the [`Cipher`] port.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose};
use rand::{Rng, thread_rng};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;

use crate::worker_model::ports::{Cipher, CipherError};

/// Environment variable holding the base64-encoded 32-byte cipher key.
pub const ENCRYPTION_KEY_ENV: &str = "WORKER_MODEL_ENCRYPTION_KEY";

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

/// AES-256-GCM cipher.
///
/// Each encryption draws a random 96-bit nonce which is prepended to the
/// ciphertext.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmCipher").finish_non_exhaustive()
    }
}

impl AesGcmCipher {
    /// Creates a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] unless the key is 32 bytes long.
    pub fn from_key(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LENGTH {
            return Err(CipherError::InvalidKey(format!(
                "key must be {KEY_LENGTH} bytes (256 bits), got {} bytes",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|err| CipherError::InvalidKey(err.to_string()))?;
        Ok(Self { cipher })
    }

    /// Creates a cipher from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] when the key is not valid base64
    /// or not 32 bytes long.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|err| CipherError::InvalidKey(format!("failed to decode key: {err}")))?;
        Self::from_key(&key)
    }

    /// Derives a 32-byte key from a passphrase with SHA-256.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] when the passphrase is empty.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CipherError> {
        if passphrase.is_empty() {
            return Err(CipherError::InvalidKey("passphrase must not be empty".to_owned()));
        }
        let digest = Sha256::digest(passphrase.as_bytes());
        Self::from_key(digest.as_slice())
    }

    /// Creates a cipher from the key in [`ENCRYPTION_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] when the variable is unset or
    /// holds an invalid key.
    pub fn from_env() -> Result<Self, CipherError> {
        let encoded = env::var(ENCRYPTION_KEY_ENV).map_err(|_| {
            CipherError::InvalidKey(format!("{ENCRYPTION_KEY_ENV} environment variable not set"))
        })?;
        Self::from_base64_key(&encoded)
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce_bytes = [0_u8; NONCE_LENGTH];
        thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|err| CipherError::Failure(err.to_string()))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.len() < NONCE_LENGTH {
            return Err(CipherError::Rejected("ciphertext too short".to_owned()));
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LENGTH);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, sealed)
            .map_err(|err| CipherError::Rejected(err.to_string()))
    }
}
