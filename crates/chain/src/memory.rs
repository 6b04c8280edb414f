//! In-process registry with the contract's observable semantics.

use crate::{ChainError, ChainResult, FileRecord, FileRegistry, NetworkInfo, TxReceipt};
use async_trait::async_trait;
use hv_types::{Sha256Hash, WalletAddress};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Chain id reported by the in-memory registry (Ganache's default).
pub const MEMORY_CHAIN_ID: u64 = 1337;

#[derive(Debug)]
struct Entry {
    hash: Sha256Hash,
    owner: WalletAddress,
    timestamp: u64,
    grants: Vec<WalletAddress>,
}

#[derive(Debug, Default)]
struct Ledger {
    entries: Vec<Entry>,
    by_hash: HashMap<Sha256Hash, usize>,
    block_number: u64,
}

impl Ledger {
    fn entry_mut(&mut self, hash: &Sha256Hash) -> ChainResult<&mut Entry> {
        let index = *self
            .by_hash
            .get(hash)
            .ok_or_else(|| ChainError::UnknownFile(hash.to_string()))?;
        Ok(&mut self.entries[index])
    }

    fn entry(&self, hash: &Sha256Hash) -> Option<&Entry> {
        self.by_hash.get(hash).map(|&i| &self.entries[i])
    }

    /// Mines one block and returns a receipt for `action`.
    fn mine(&mut self, action: &str, hash: &Sha256Hash, who: &WalletAddress) -> TxReceipt {
        self.block_number += 1;
        let mut hasher = Sha256::new();
        hasher.update(self.block_number.to_be_bytes());
        hasher.update(action.as_bytes());
        hasher.update(hash.as_str().as_bytes());
        hasher.update(who.as_str().to_ascii_lowercase().as_bytes());

        TxReceipt {
            transaction_hash: format!("0x{}", hex::encode(hasher.finalize())),
            block_number: Some(self.block_number),
        }
    }
}

/// Registry kept entirely in memory.
///
/// - Registering an already registered hash fails like a contract revert
/// - File ids are 1-based in registration order
/// - The owner always has access; grants keep insertion order without duplicates
/// - Grant and revoke on an unregistered hash fail with [`ChainError::UnknownFile`]
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    ledger: Mutex<Ledger>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FileRegistry for MemoryRegistry {
    async fn store_hash(
        &self,
        hash: &Sha256Hash,
        owner: &WalletAddress,
    ) -> ChainResult<TxReceipt> {
        let mut ledger = self.ledger();
        if ledger.by_hash.contains_key(hash) {
            return Err(ChainError::Contract(format!(
                "hash {} already registered",
                hash
            )));
        }

        let index = ledger.entries.len();
        ledger.entries.push(Entry {
            hash: hash.clone(),
            owner: owner.clone(),
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
            grants: Vec::new(),
        });
        ledger.by_hash.insert(hash.clone(), index);

        Ok(ledger.mine("uploadFile", hash, owner))
    }

    async fn verify_hash(&self, hash: &Sha256Hash) -> ChainResult<bool> {
        Ok(self.ledger().by_hash.contains_key(hash))
    }

    async fn grant_access(
        &self,
        hash: &Sha256Hash,
        user: &WalletAddress,
    ) -> ChainResult<TxReceipt> {
        let mut ledger = self.ledger();
        let entry = ledger.entry_mut(hash)?;
        if !entry.grants.iter().any(|g| g.matches(user)) {
            entry.grants.push(user.clone());
        }
        Ok(ledger.mine("grantAccess", hash, user))
    }

    async fn revoke_access(
        &self,
        hash: &Sha256Hash,
        user: &WalletAddress,
    ) -> ChainResult<TxReceipt> {
        let mut ledger = self.ledger();
        ledger.entry_mut(hash)?.grants.retain(|g| !g.matches(user));
        Ok(ledger.mine("revokeAccess", hash, user))
    }

    async fn has_access(&self, hash: &Sha256Hash, user: &WalletAddress) -> ChainResult<bool> {
        let ledger = self.ledger();
        Ok(ledger.entry(hash).is_some_and(|entry| {
            entry.owner.matches(user) || entry.grants.iter().any(|g| g.matches(user))
        }))
    }

    async fn access_list(&self, hash: &Sha256Hash) -> ChainResult<Vec<WalletAddress>> {
        Ok(self
            .ledger()
            .entry(hash)
            .map(|entry| entry.grants.clone())
            .unwrap_or_default())
    }

    async fn file_details(&self, file_id: u64) -> ChainResult<FileRecord> {
        let ledger = self.ledger();
        let entry = file_id
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| ledger.entries.get(i))
            .ok_or_else(|| ChainError::UnknownFile(file_id.to_string()))?;

        Ok(FileRecord {
            hash: entry.hash.to_string(),
            owner: entry.owner.clone(),
            timestamp: entry.timestamp,
        })
    }

    async fn network_info(&self) -> ChainResult<NetworkInfo> {
        Ok(NetworkInfo {
            network: "memory".to_string(),
            chain_id: MEMORY_CHAIN_ID,
            block_number: self.ledger().block_number,
            rpc_url: "memory://".to_string(),
        })
    }
}
