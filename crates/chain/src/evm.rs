//! alloy-backed registry talking to a deployed contract over HTTP JSON-RPC.

use crate::{
    network_name, ChainError, ChainResult, ChainSettings, FileRecord, FileRegistry, NetworkInfo,
    TxReceipt, DEFAULT_RPC_URL,
};
use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use hv_types::{Sha256Hash, WalletAddress};
use url::Url;

sol! {
    #[sol(rpc)]
    contract FileVault {
        struct FileRecord {
            string hash;
            address owner;
            uint256 timestamp;
        }

        function uploadFile(string memory hash, address owner) external;
        function verifyFile(string memory hash) external view returns (bool);
        function grantAccess(string memory hash, address user) external;
        function revokeAccess(string memory hash, address user) external;
        function hasAccess(string memory hash, address user) external view returns (bool);
        function getAccessList(string memory hash) external view returns (address[] memory);
        function getFileDetails(uint256 fileId) external view returns (FileRecord memory);
    }
}

/// Registry backed by a live EVM node.
///
/// Read-only provider calls (`network_info`) work with just an RPC URL. Contract calls need
/// both a contract address and a signing key; without them every contract call returns
/// [`ChainError::NotConfigured`].
pub struct EvmRegistry {
    provider: DynProvider,
    contract: Option<FileVault::FileVaultInstance<DynProvider>>,
    rpc_url: String,
}

impl std::fmt::Debug for EvmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmRegistry")
            .field("rpc_url", &self.rpc_url)
            .field("contract", &self.contract.as_ref().map(|c| *c.address()))
            .finish()
    }
}

impl EvmRegistry {
    /// Builds providers for `settings`. No network traffic happens here.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidConfig` if the URL, address or key is malformed.
    pub fn new(settings: &ChainSettings) -> ChainResult<Self> {
        let rpc_url = match settings.rpc_url.trim() {
            "" => DEFAULT_RPC_URL.to_string(),
            url => url.to_string(),
        };
        let url: Url = rpc_url.parse().map_err(|e| {
            ChainError::InvalidConfig(format!("invalid RPC URL '{}': {}", rpc_url, e))
        })?;

        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();

        let address = non_blank(settings.contract_address.as_deref());
        let key = non_blank(settings.private_key.as_deref());

        let contract = match (address, key) {
            (Some(address), Some(key)) => {
                let address: Address = address.parse().map_err(|e| {
                    ChainError::InvalidConfig(format!("invalid CONTRACT_ADDRESS: {}", e))
                })?;
                let signer: PrivateKeySigner = key
                    .parse()
                    .map_err(|e| ChainError::InvalidConfig(format!("invalid PRIVATE_KEY: {}", e)))?;

                tracing::info!(
                    contract = %address,
                    signer = %signer.address(),
                    "contract calls enabled"
                );

                let signing = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(url)
                    .erased();
                Some(FileVault::new(address, signing))
            }
            _ => {
                tracing::warn!("CONTRACT_ADDRESS or PRIVATE_KEY missing; contract calls disabled");
                None
            }
        };

        Ok(Self {
            provider,
            contract,
            rpc_url,
        })
    }

    fn contract(&self) -> ChainResult<&FileVault::FileVaultInstance<DynProvider>> {
        self.contract.as_ref().ok_or(ChainError::NotConfigured)
    }
}

#[async_trait]
impl FileRegistry for EvmRegistry {
    async fn store_hash(
        &self,
        hash: &Sha256Hash,
        owner: &WalletAddress,
    ) -> ChainResult<TxReceipt> {
        let receipt = self
            .contract()?
            .uploadFile(hash.to_string(), to_address(owner)?)
            .send()
            .await
            .map_err(contract_error)?
            .get_receipt()
            .await
            .map_err(rpc_error)?;
        finish(&receipt)
    }

    async fn verify_hash(&self, hash: &Sha256Hash) -> ChainResult<bool> {
        self.contract()?
            .verifyFile(hash.to_string())
            .call()
            .await
            .map_err(contract_error)
    }

    async fn grant_access(
        &self,
        hash: &Sha256Hash,
        user: &WalletAddress,
    ) -> ChainResult<TxReceipt> {
        let receipt = self
            .contract()?
            .grantAccess(hash.to_string(), to_address(user)?)
            .send()
            .await
            .map_err(contract_error)?
            .get_receipt()
            .await
            .map_err(rpc_error)?;
        finish(&receipt)
    }

    async fn revoke_access(
        &self,
        hash: &Sha256Hash,
        user: &WalletAddress,
    ) -> ChainResult<TxReceipt> {
        let receipt = self
            .contract()?
            .revokeAccess(hash.to_string(), to_address(user)?)
            .send()
            .await
            .map_err(contract_error)?
            .get_receipt()
            .await
            .map_err(rpc_error)?;
        finish(&receipt)
    }

    async fn has_access(&self, hash: &Sha256Hash, user: &WalletAddress) -> ChainResult<bool> {
        self.contract()?
            .hasAccess(hash.to_string(), to_address(user)?)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn access_list(&self, hash: &Sha256Hash) -> ChainResult<Vec<WalletAddress>> {
        let addresses = self
            .contract()?
            .getAccessList(hash.to_string())
            .call()
            .await
            .map_err(contract_error)?;
        addresses.into_iter().map(from_address).collect()
    }

    async fn file_details(&self, file_id: u64) -> ChainResult<FileRecord> {
        let record = self
            .contract()?
            .getFileDetails(U256::from(file_id))
            .call()
            .await
            .map_err(contract_error)?;

        let timestamp = u64::try_from(record.timestamp)
            .map_err(|_| ChainError::Contract("timestamp does not fit in u64".into()))?;

        Ok(FileRecord {
            hash: record.hash,
            owner: from_address(record.owner)?,
            timestamp,
        })
    }

    async fn network_info(&self) -> ChainResult<NetworkInfo> {
        let chain_id = self.provider.get_chain_id().await.map_err(rpc_error)?;
        let block_number = self.provider.get_block_number().await.map_err(rpc_error)?;

        Ok(NetworkInfo {
            network: network_name(chain_id).to_string(),
            chain_id,
            block_number,
            rpc_url: self.rpc_url.clone(),
        })
    }
}

fn finish<R: ReceiptResponse>(receipt: &R) -> ChainResult<TxReceipt> {
    let transaction_hash = receipt.transaction_hash().to_string();
    if !receipt.status() {
        return Err(ChainError::Contract(format!(
            "transaction {} reverted",
            transaction_hash
        )));
    }
    tracing::debug!(tx = %transaction_hash, block = ?receipt.block_number(), "transaction mined");
    Ok(TxReceipt {
        transaction_hash,
        block_number: receipt.block_number(),
    })
}

fn to_address(address: &WalletAddress) -> ChainResult<Address> {
    address
        .as_str()
        .parse()
        .map_err(|e| ChainError::InvalidConfig(format!("invalid address {}: {}", address, e)))
}

fn from_address(address: Address) -> ChainResult<WalletAddress> {
    WalletAddress::parse(&address.to_checksum(None))
        .map_err(|e| ChainError::Contract(format!("contract returned bad address: {}", e)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contract_error(e: alloy::contract::Error) -> ChainError {
    ChainError::Contract(e.to_string())
}

fn rpc_error(e: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChainMode;

    // Well-known development key and first deployment address of a fresh anvil node.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn settings(address: Option<&str>, key: Option<&str>) -> ChainSettings {
        ChainSettings {
            mode: ChainMode::Evm,
            rpc_url: "http://127.0.0.1:8545".into(),
            contract_address: address.map(String::from),
            private_key: key.map(String::from),
        }
    }

    #[test]
    fn test_builds_with_full_settings() {
        let registry = EvmRegistry::new(&settings(Some(DEV_CONTRACT), Some(DEV_KEY))).unwrap();
        assert!(registry.contract.is_some());
        assert_eq!(registry.rpc_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn test_blank_rpc_url_falls_back_to_default() {
        let mut s = settings(None, None);
        s.rpc_url = "   ".into();
        let registry = EvmRegistry::new(&s).unwrap();
        assert_eq!(registry.rpc_url, DEFAULT_RPC_URL);
    }

    #[test]
    fn test_rejects_bad_rpc_url() {
        let mut s = settings(None, None);
        s.rpc_url = "not a url".into();
        assert!(matches!(
            EvmRegistry::new(&s),
            Err(ChainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_private_key() {
        let result = EvmRegistry::new(&settings(Some(DEV_CONTRACT), Some("0x1234")));
        assert!(matches!(result, Err(ChainError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_contract_address() {
        let result = EvmRegistry::new(&settings(Some("0xnothex"), Some(DEV_KEY)));
        assert!(matches!(result, Err(ChainError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_contract_calls_need_configuration() {
        let registry = EvmRegistry::new(&settings(Some(DEV_CONTRACT), Some("  "))).unwrap();
        let hash = Sha256Hash::from_bytes(&[7u8; 32]);

        assert!(matches!(
            registry.verify_hash(&hash).await,
            Err(ChainError::NotConfigured)
        ));
        assert!(matches!(
            registry.file_details(1).await,
            Err(ChainError::NotConfigured)
        ));
    }

    #[test]
    fn test_address_conversion_is_checksummed() {
        let lower = WalletAddress::parse(&DEV_CONTRACT.to_lowercase()).unwrap();
        let address = to_address(&lower).unwrap();
        assert_eq!(from_address(address).unwrap().as_str(), DEV_CONTRACT);
    }
}
