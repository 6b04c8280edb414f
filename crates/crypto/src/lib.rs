//! HashVault cryptography
//!
//! Thin wrappers over RustCrypto crates: SHA-256 fingerprints of file content and
//! AES-256-GCM encryption of file bytes before they leave the client.
//!
//! ## Encrypted blob format
//!
//! ```text
//! nonce (12 bytes) || ciphertext || GCM tag (16 bytes)
//! ```
//!
//! Keys are 256-bit and travel as 64 lower-case hex characters.

mod cipher;
mod hash;

pub use cipher::{decrypt, encrypt, EncryptionKey, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use hash::{sha256_hex, sha256_reader};
pub use hv_types::Sha256Hash;

/// Errors that can occur during hashing or encryption
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Key is not 64 hex characters
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// Encrypted input is shorter than a nonce plus tag
    #[error("Encrypted data too short ({0} bytes)")]
    TooShort(usize),

    /// AEAD failure while encrypting
    #[error("Encryption failed")]
    Encrypt,

    /// Tag mismatch while decrypting
    #[error("Decryption failed: Invalid key or corrupted data")]
    Decrypt,

    /// I/O error while reading input to hash
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
