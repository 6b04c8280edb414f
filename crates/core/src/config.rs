//! Core runtime configuration.
//!
//! Resolved once at process startup and passed into [`crate::VaultService`]. Request handling
//! never reads process environment variables.

use crate::constants::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_DIR};
use crate::{VaultError, VaultResult};
use hv_chain::{ChainMode, ChainSettings, DEFAULT_RPC_URL};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    upload_dir: PathBuf,
    max_upload_bytes: u64,
    chain: ChainSettings,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        upload_dir: PathBuf,
        max_upload_bytes: u64,
        chain: ChainSettings,
    ) -> VaultResult<Self> {
        if upload_dir.as_os_str().is_empty() {
            return Err(VaultError::invalid("upload_dir cannot be empty"));
        }
        if max_upload_bytes == 0 {
            return Err(VaultError::invalid(
                "max_upload_bytes must be greater than zero",
            ));
        }

        Ok(Self {
            upload_dir,
            max_upload_bytes,
            chain,
        })
    }

    /// Reads `UPLOAD_DIR`, `MAX_UPLOAD_BYTES`, `CHAIN_MODE`, `BLOCKCHAIN_RPC`,
    /// `CONTRACT_ADDRESS` and `PRIVATE_KEY`.
    pub fn from_env() -> VaultResult<Self> {
        let var = |name: &str| std::env::var(name).ok();

        let chain = ChainSettings {
            mode: chain_mode_from_env_value(var("CHAIN_MODE"))?,
            rpc_url: rpc_url_from_env_value(var("BLOCKCHAIN_RPC")),
            contract_address: non_blank(var("CONTRACT_ADDRESS")),
            private_key: non_blank(var("PRIVATE_KEY")),
        };

        Self::new(
            upload_dir_from_env_value(var("UPLOAD_DIR")),
            max_upload_bytes_from_env_value(var("MAX_UPLOAD_BYTES"))?,
            chain,
        )
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn chain(&self) -> &ChainSettings {
        &self.chain
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Upload directory from an optional value, falling back to `uploads`.
pub fn upload_dir_from_env_value(value: Option<String>) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()))
}

/// Parse the upload size limit in bytes.
///
/// If `value` is `None` or empty/whitespace, returns the 100 MiB default.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> VaultResult<u64> {
    match non_blank(value) {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => match v.parse::<u64>() {
            Ok(0) | Err(_) => Err(VaultError::invalid(format!(
                "MAX_UPLOAD_BYTES must be a positive integer, got '{}'",
                v
            ))),
            Ok(n) => Ok(n),
        },
    }
}

/// Parse the chain back-end; unset means `evm`.
pub fn chain_mode_from_env_value(value: Option<String>) -> VaultResult<ChainMode> {
    non_blank(value)
        .map(|v| v.parse::<ChainMode>())
        .transpose()
        .map(Option::unwrap_or_default)
        .map_err(VaultError::from)
}

pub fn rpc_url_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_RPC_URL.to_string())
}
