//! # HashVault Chain
//!
//! Client side of the file-registry smart contract.
//!
//! The contract is external; this crate only issues calls against its fixed interface
//! (`uploadFile`, `verifyFile`, `grantAccess`, `revokeAccess`, `hasAccess`,
//! `getAccessList`, `getFileDetails`). Two back-ends implement the [`FileRegistry`] seam:
//!
//! - [`EvmRegistry`]: JSON-RPC over HTTP via alloy, signing with a local private key
//! - [`MemoryRegistry`]: an in-process stand-in for tests and node-less demos

#![warn(rust_2018_idioms)]

mod evm;
mod memory;

use async_trait::async_trait;
use hv_types::{Sha256Hash, WalletAddress};
use std::str::FromStr;
use std::sync::Arc;

pub use evm::EvmRegistry;
pub use memory::MemoryRegistry;

/// Default JSON-RPC endpoint (local Ganache).
pub const DEFAULT_RPC_URL: &str = "http://localhost:7545";

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("CONTRACT_ADDRESS and PRIVATE_KEY not configured in .env")]
    NotConfigured,
    #[error("invalid chain configuration: {0}")]
    InvalidConfig(String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("contract call failed: {0}")]
    Contract(String),
    #[error("file not registered on chain: {0}")]
    UnknownFile(String),
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Outcome of a mined state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TxReceipt {
    /// `0x`-prefixed transaction hash
    pub transaction_hash: String,
    pub block_number: Option<u64>,
}

/// On-chain record returned by `getFileDetails`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileRecord {
    pub hash: String,
    pub owner: WalletAddress,
    /// Unix seconds at which the hash was registered
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NetworkInfo {
    pub network: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub rpc_url: String,
}

/// The contract surface HashVault relies on.
///
/// Mutating calls wait for the transaction receipt before returning.
#[async_trait]
pub trait FileRegistry: Send + Sync {
    /// `uploadFile(hash, owner)`
    async fn store_hash(&self, hash: &Sha256Hash, owner: &WalletAddress)
        -> ChainResult<TxReceipt>;

    /// `verifyFile(hash)`
    async fn verify_hash(&self, hash: &Sha256Hash) -> ChainResult<bool>;

    /// `grantAccess(hash, user)`
    async fn grant_access(&self, hash: &Sha256Hash, user: &WalletAddress)
        -> ChainResult<TxReceipt>;

    /// `revokeAccess(hash, user)`
    async fn revoke_access(
        &self,
        hash: &Sha256Hash,
        user: &WalletAddress,
    ) -> ChainResult<TxReceipt>;

    /// `hasAccess(hash, user)`
    async fn has_access(&self, hash: &Sha256Hash, user: &WalletAddress) -> ChainResult<bool>;

    /// `getAccessList(hash)`
    async fn access_list(&self, hash: &Sha256Hash) -> ChainResult<Vec<WalletAddress>>;

    /// `getFileDetails(fileId)`
    async fn file_details(&self, file_id: u64) -> ChainResult<FileRecord>;

    /// Chain id, head block and endpoint of the connected network.
    async fn network_info(&self) -> ChainResult<NetworkInfo>;
}

/// Which [`FileRegistry`] back-end to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainMode {
    #[default]
    Evm,
    Memory,
}

impl FromStr for ChainMode {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" => Ok(ChainMode::Evm),
            "memory" => Ok(ChainMode::Memory),
            other => Err(ChainError::InvalidConfig(format!(
                "unknown chain mode '{}', expected 'evm' or 'memory'",
                other
            ))),
        }
    }
}

/// Connection settings resolved once at startup.
#[derive(Clone, Default)]
pub struct ChainSettings {
    pub mode: ChainMode,
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub private_key: Option<String>,
}

impl std::fmt::Debug for ChainSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSettings")
            .field("mode", &self.mode)
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Builds the registry selected by `settings.mode`.
///
/// # Errors
///
/// Returns `ChainError::InvalidConfig` if the RPC URL, contract address or private key cannot
/// be parsed. Missing contract address or key is *not* an error here; contract calls report
/// `ChainError::NotConfigured` instead, while `network_info` keeps working.
pub fn build_registry(settings: &ChainSettings) -> ChainResult<Arc<dyn FileRegistry>> {
    match settings.mode {
        ChainMode::Evm => Ok(Arc::new(EvmRegistry::new(settings)?)),
        ChainMode::Memory => Ok(Arc::new(MemoryRegistry::new())),
    }
}

/// Human-readable name for well-known chain ids.
pub fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        11155111 => "sepolia",
        17000 => "holesky",
        1337 | 5777 => "ganache",
        31337 => "anvil",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_mode_parse() {
        assert_eq!("evm".parse::<ChainMode>().unwrap(), ChainMode::Evm);
        assert_eq!(" Memory ".parse::<ChainMode>().unwrap(), ChainMode::Memory);
        assert!(matches!(
            "ipfs".parse::<ChainMode>(),
            Err(ChainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_network_name() {
        assert_eq!(network_name(11155111), "sepolia");
        assert_eq!(network_name(1337), "ganache");
        assert_eq!(network_name(424242), "unknown");
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let settings = ChainSettings {
            private_key: Some("0xdeadbeef".into()),
            ..Default::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_not_configured_message() {
        assert_eq!(
            ChainError::NotConfigured.to_string(),
            "CONTRACT_ADDRESS and PRIVATE_KEY not configured in .env"
        );
    }
}
