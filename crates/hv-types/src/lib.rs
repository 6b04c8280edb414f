//! Validated value types shared across HashVault crates.
//!
//! Every type here guarantees its invariant once constructed, so callers further down the
//! stack (storage, chain calls, HTTP handlers) never need to re-check the format of a hash
//! or an address.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors produced when parsing a SHA-256 hex digest.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("SHA-256 hash must be 64 hex characters, got {0}")]
    Length(usize),
    #[error("SHA-256 hash contains non-hex characters")]
    NotHex,
}

/// Errors produced when parsing a wallet address.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("wallet address must start with 0x")]
    Prefix,
    #[error("wallet address must have 40 hex characters after 0x, got {0}")]
    Length(usize),
    #[error("wallet address contains non-hex characters")]
    NotHex,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Hex-encoded SHA-256 digest of a file's raw bytes.
///
/// Always stored as 64 lower-case hex characters without a `0x` prefix, so two hashes
/// compare equal regardless of how the caller cased or prefixed them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Parses a hex digest, accepting either case and an optional `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the digest is not exactly 64 hex characters.
    pub fn parse(input: &str) -> Result<Self, HashError> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 64 {
            return Err(HashError::Length(digits.len()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HashError::NotHex);
        }
        Ok(Self(digits.to_ascii_lowercase()))
    }

    /// Builds a hash from a raw 32-byte digest.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha256Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Sha256Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Sha256Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Sha256Hash::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// An EVM account address (`0x` + 40 hex characters).
///
/// The caller's casing is kept for display (it may carry an EIP-55 checksum), but equality
/// through [`WalletAddress::matches`] ignores case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// # Errors
    ///
    /// Returns [`AddressError`] if the input is not `0x` followed by 40 hex characters.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").ok_or(AddressError::Prefix)?;
        if digits.len() != 40 {
            return Err(AddressError::Length(digits.len()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::NotHex);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison of two addresses.
    pub fn matches(&self, other: &WalletAddress) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for WalletAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for WalletAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        WalletAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn test_non_empty_text_trims() {
        let text = NonEmptyText::new("  report.pdf \n").unwrap();
        assert_eq!(text.as_str(), "report.pdf");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn test_hash_normalises_case_and_prefix() {
        let upper = format!("0x{}", HASH.to_uppercase());
        let parsed = Sha256Hash::parse(&upper).unwrap();
        assert_eq!(parsed.as_str(), HASH);
        assert_eq!(parsed, Sha256Hash::parse(HASH).unwrap());
    }

    #[test]
    fn test_hash_rejects_wrong_length() {
        assert_eq!(Sha256Hash::parse("abc"), Err(HashError::Length(3)));
    }

    #[test]
    fn test_hash_rejects_non_hex() {
        let bad = format!("{}zz", &HASH[..62]);
        assert_eq!(Sha256Hash::parse(&bad), Err(HashError::NotHex));
    }

    #[test]
    fn test_hash_from_bytes() {
        let hash = Sha256Hash::from_bytes(&[0xab; 32]);
        assert_eq!(hash.as_str(), "ab".repeat(32));
    }

    #[test]
    fn test_address_keeps_casing_but_matches_case_insensitively() {
        let checksummed =
            WalletAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let lower = WalletAddress::parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();

        assert_eq!(
            checksummed.as_str(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert!(checksummed.matches(&lower));
        assert_ne!(checksummed, lower);
    }

    #[test]
    fn test_address_errors() {
        assert_eq!(
            WalletAddress::parse("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::Prefix)
        );
        assert_eq!(WalletAddress::parse("0x1234"), Err(AddressError::Length(4)));
        assert_eq!(
            WalletAddress::parse("0xgaaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::NotHex)
        );
    }

    #[test]
    fn test_serde_validates_on_deserialise() {
        let ok: Sha256Hash = serde_json::from_str(&format!("\"{}\"", HASH)).unwrap();
        assert_eq!(ok.as_str(), HASH);

        let err = serde_json::from_str::<WalletAddress>("\"not-an-address\"");
        assert!(err.is_err());
    }
}
