use crate::CryptoError;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use rand::RngCore;
use std::fmt;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// A 256-bit AES key.
///
/// `Debug` does not print the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generates a fresh random key from the OS-seeded thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parses a key from 64 hex characters (either case).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKey` for anything other than 32 hex-encoded bytes.
    pub fn parse(input: &str) -> Result<Self, CryptoError> {
        let trimmed = input.trim();
        if trimmed.len() != KEY_LEN * 2 {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} hex characters, got {}",
                KEY_LEN * 2,
                trimmed.len()
            )));
        }
        let decoded =
            hex::decode(trimmed).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Lower-case hex rendering, the form handed back to users.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Encrypts `plaintext` with AES-256-GCM under a random nonce.
///
/// Returns `nonce (12 bytes) || ciphertext (includes 16-byte GCM tag)`.
///
/// # Errors
///
/// Returns `CryptoError::Encrypt` if the AEAD rejects the input.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = key
        .cipher()
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Encrypt)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts a blob produced by [`encrypt`].
///
/// # Errors
///
/// - `CryptoError::TooShort` if the blob cannot hold a nonce and tag
/// - `CryptoError::Decrypt` on a wrong key or tampered data
pub fn decrypt(key: &EncryptionKey, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::TooShort(blob.len()));
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    key.cipher()
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}
