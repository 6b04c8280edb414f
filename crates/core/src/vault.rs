use crate::{CoreConfig, VaultError, VaultResult};
use hv_chain::{FileRecord, FileRegistry, NetworkInfo, TxReceipt};
use hv_crypto::{sha256_hex, EncryptionKey};
use hv_files::{FileMetadata, FilesError, FilesService, NewUpload};
use hv_types::{NonEmptyText, Sha256Hash, WalletAddress};
use std::sync::Arc;

/// Fields of a multipart upload after extraction.
///
/// Everything except the bytes is optional here so that a missing form field and an empty one
/// are reported the same way.
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub owner: Option<String>,
    pub file_hash: Option<String>,
    pub encryption_key: Option<String>,
    pub mime_type: Option<String>,
}

/// Result of comparing a file's hash against a claimed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub is_valid: bool,
    pub calculated_hash: Sha256Hash,
    /// The hash exactly as the caller supplied it
    pub claimed_hash: String,
}

/// Upload store and contract registry behind one handle.
#[derive(Clone)]
pub struct VaultService {
    files: Arc<FilesService>,
    registry: Arc<dyn FileRegistry>,
}

impl std::fmt::Debug for VaultService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultService")
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl VaultService {
    pub fn new(files: FilesService, registry: Arc<dyn FileRegistry>) -> Self {
        Self {
            files: Arc::new(files),
            registry,
        }
    }

    /// Opens the upload directory and builds the registry selected by `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> VaultResult<Self> {
        let files =
            FilesService::new(cfg.upload_dir())?.with_max_upload_bytes(cfg.max_upload_bytes());
        let registry = hv_chain::build_registry(cfg.chain())?;
        Ok(Self::new(files, registry))
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.files.max_upload_bytes()
    }

    /// Stores an already encrypted upload.
    ///
    /// `file_hash` is the SHA-256 of the plaintext, computed by the client before encryption,
    /// so it is validated for shape only.
    ///
    /// # Errors
    ///
    /// - `InvalidInput("Missing required fields")` if any form field is missing or blank
    /// - `InvalidInput` if the owner, hash or key is malformed
    /// - `Files` for size limit and I/O failures
    pub fn upload(&self, request: UploadRequest) -> VaultResult<FileMetadata> {
        let (Some(file_name), Some(owner), Some(file_hash), Some(encryption_key)) = (
            text(request.file_name),
            text(request.owner),
            text(request.file_hash),
            text(request.encryption_key),
        ) else {
            return Err(VaultError::invalid("Missing required fields"));
        };

        let owner = parse_address(owner.as_str())?;
        let file_hash = parse_hash(file_hash.as_str())?;
        EncryptionKey::parse(encryption_key.as_str())
            .map_err(|e| VaultError::invalid(e.to_string()))?;

        let metadata = self.files.store(NewUpload {
            bytes: &request.bytes,
            original_name: file_name,
            owner,
            file_hash,
            encryption_key,
            mime_type: request.mime_type.filter(|m| !m.trim().is_empty()),
        })?;

        Ok(metadata)
    }

    /// Encrypted bytes of an upload, looked up by exact id.
    pub fn download(&self, file_id: &str) -> VaultResult<Vec<u8>> {
        self.files.read(file_id).map_err(|e| match e {
            FilesError::NotFound(_) => VaultError::NotFound("File not found".into()),
            other => other.into(),
        })
    }

    pub fn metadata(&self, file_id: &str) -> VaultResult<FileMetadata> {
        self.files.metadata(file_id).map_err(|e| match e {
            FilesError::NotFound(_) => VaultError::NotFound("Metadata not found".into()),
            other => other.into(),
        })
    }

    /// Metadata of every upload owned by `address`, oldest first.
    ///
    /// An address that cannot own anything yields an empty list.
    pub fn user_files(&self, address: &str) -> VaultResult<Vec<FileMetadata>> {
        match WalletAddress::parse(address.trim()) {
            Ok(owner) => Ok(self.files.list_by_owner(&owner)?),
            Err(e) => {
                tracing::debug!("no files for malformed address {:?}: {}", address, e);
                Ok(Vec::new())
            }
        }
    }

    /// Hashes `bytes` and compares against `claimed_hash`. Nothing is persisted.
    ///
    /// A claimed hash that is not a well-formed SHA-256 simply does not match.
    pub fn verify(
        &self,
        bytes: Option<&[u8]>,
        claimed_hash: Option<&str>,
    ) -> VaultResult<Verification> {
        let claimed_hash = claimed_hash.filter(|h| !h.trim().is_empty());
        let (Some(bytes), Some(claimed_hash)) = (bytes, claimed_hash) else {
            return Err(VaultError::invalid("Missing file or blockchain hash"));
        };

        let calculated_hash = sha256_hex(bytes);
        let is_valid =
            Sha256Hash::parse(claimed_hash).is_ok_and(|claimed| claimed == calculated_hash);

        Ok(Verification {
            is_valid,
            calculated_hash,
            claimed_hash: claimed_hash.to_string(),
        })
    }

    pub async fn store_hash(
        &self,
        file_hash: Option<&str>,
        user: Option<&str>,
    ) -> VaultResult<TxReceipt> {
        let (hash, owner) = hash_and_user(file_hash, user)?;
        let receipt = self.registry.store_hash(&hash, &owner).await?;
        tracing::info!(
            hash = %hash,
            owner = %owner,
            tx = %receipt.transaction_hash,
            "hash stored on chain"
        );
        Ok(receipt)
    }

    pub async fn verify_on_chain(&self, file_hash: &str) -> VaultResult<bool> {
        let hash = parse_hash(file_hash)?;
        Ok(self.registry.verify_hash(&hash).await?)
    }

    pub async fn grant_access(
        &self,
        file_hash: Option<&str>,
        user: Option<&str>,
    ) -> VaultResult<TxReceipt> {
        let (hash, user) = hash_and_user(file_hash, user)?;
        let receipt = self.registry.grant_access(&hash, &user).await?;
        tracing::info!(hash = %hash, user = %user, "access granted");
        Ok(receipt)
    }

    pub async fn revoke_access(
        &self,
        file_hash: Option<&str>,
        user: Option<&str>,
    ) -> VaultResult<TxReceipt> {
        let (hash, user) = hash_and_user(file_hash, user)?;
        let receipt = self.registry.revoke_access(&hash, &user).await?;
        tracing::info!(hash = %hash, user = %user, "access revoked");
        Ok(receipt)
    }

    pub async fn check_access(&self, file_hash: &str, user: &str) -> VaultResult<bool> {
        let hash = parse_hash(file_hash)?;
        let user = parse_address(user)?;
        Ok(self.registry.has_access(&hash, &user).await?)
    }

    pub async fn access_list(&self, file_hash: &str) -> VaultResult<Vec<WalletAddress>> {
        let hash = parse_hash(file_hash)?;
        Ok(self.registry.access_list(&hash).await?)
    }

    /// On-chain record by its 1-based registration id.
    pub async fn file_details(&self, file_id: u64) -> VaultResult<FileRecord> {
        Ok(self.registry.file_details(file_id).await?)
    }

    pub async fn network_info(&self) -> VaultResult<NetworkInfo> {
        Ok(self.registry.network_info().await?)
    }
}

fn text(value: Option<String>) -> Option<NonEmptyText> {
    value.and_then(|v| NonEmptyText::new(v).ok())
}

fn parse_hash(value: &str) -> VaultResult<Sha256Hash> {
    Sha256Hash::parse(value).map_err(|e| VaultError::invalid(format!("Invalid file hash: {}", e)))
}

fn parse_address(value: &str) -> VaultResult<WalletAddress> {
    WalletAddress::parse(value.trim())
        .map_err(|e| VaultError::invalid(format!("Invalid wallet address: {}", e)))
}

fn hash_and_user(
    file_hash: Option<&str>,
    user: Option<&str>,
) -> VaultResult<(Sha256Hash, WalletAddress)> {
    let present = |v: &&str| !v.trim().is_empty();
    match (file_hash.filter(present), user.filter(present)) {
        (Some(hash), Some(user)) => Ok((parse_hash(hash)?, parse_address(user)?)),
        _ => Err(VaultError::invalid("Missing fileHash or userAddress")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hv_chain::MemoryRegistry;
    use tempfile::TempDir;

    const OWNER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const FRIEND: &str = "0x00000000000000000000000000000000000000f1";

    fn vault(dir: &TempDir) -> VaultService {
        let files = FilesService::new(dir.path()).unwrap();
        VaultService::new(files, Arc::new(MemoryRegistry::new()))
    }

    fn request(bytes: &[u8], plaintext: &[u8]) -> UploadRequest {
        UploadRequest {
            bytes: bytes.to_vec(),
            file_name: Some("notes.txt".into()),
            owner: Some(OWNER.into()),
            file_hash: Some(sha256_hex(plaintext).to_string()),
            encryption_key: Some(EncryptionKey::generate().to_hex()),
            mime_type: Some("application/octet-stream".into()),
        }
    }

    #[test]
    fn test_upload_download_and_metadata() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        let meta = vault.upload(request(b"ciphertext", b"plaintext")).unwrap();

        assert_eq!(meta.original_name.as_str(), "notes.txt");
        assert_eq!(meta.file_hash, sha256_hex(b"plaintext"));
        assert_eq!(vault.download(&meta.id).unwrap(), b"ciphertext");
        assert_eq!(vault.metadata(&meta.id).unwrap(), meta);
    }

    #[test]
    fn test_upload_requires_every_field() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        for strip in 0..4 {
            let mut req = request(b"x", b"y");
            match strip {
                0 => req.file_name = None,
                1 => req.owner = Some("  ".into()),
                2 => req.file_hash = None,
                _ => req.encryption_key = Some(String::new()),
            }
            let err = vault.upload(req).unwrap_err();
            assert_eq!(err.to_string(), "Missing required fields");
        }
    }

    #[test]
    fn test_upload_rejects_malformed_fields() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        let mut bad_owner = request(b"x", b"y");
        bad_owner.owner = Some("alice".into());
        assert!(matches!(
            vault.upload(bad_owner),
            Err(VaultError::InvalidInput(_))
        ));

        let mut bad_hash = request(b"x", b"y");
        bad_hash.file_hash = Some("abc123".into());
        assert!(matches!(
            vault.upload(bad_hash),
            Err(VaultError::InvalidInput(_))
        ));

        let mut bad_key = request(b"x", b"y");
        bad_key.encryption_key = Some("hunter2".into());
        assert!(matches!(
            vault.upload(bad_key),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_files_report_not_found() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        let download = vault.download("1700000000000-abcdef-missing.bin").unwrap_err();
        assert!(matches!(&download, VaultError::NotFound(m) if m == "File not found"));

        let metadata = vault.metadata("1700000000000-abcdef-missing.bin").unwrap_err();
        assert!(matches!(&metadata, VaultError::NotFound(m) if m == "Metadata not found"));
    }

    #[test]
    fn test_user_files_match_owner_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        vault.upload(request(b"a", b"a")).unwrap();

        let mut other = request(b"b", b"b");
        other.owner = Some(FRIEND.into());
        vault.upload(other).unwrap();

        let mine = vault.user_files(&OWNER.to_lowercase()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner.as_str(), OWNER);

        assert!(vault.user_files("not-an-address").unwrap().is_empty());
    }

    #[test]
    fn test_verify() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        let expected = sha256_hex(b"hello");

        let upper = expected.as_str().to_uppercase();
        let ok = vault.verify(Some(&b"hello"[..]), Some(upper.as_str())).unwrap();
        assert!(ok.is_valid);
        assert_eq!(ok.calculated_hash, expected);

        let tampered = vault
            .verify(Some(&b"hellO"[..]), Some(expected.as_str()))
            .unwrap();
        assert!(!tampered.is_valid);

        let garbage = vault.verify(Some(&b"hello"[..]), Some("0xnope")).unwrap();
        assert!(!garbage.is_valid);
        assert_eq!(garbage.claimed_hash, "0xnope");

        let missing = vault.verify(None, Some(expected.as_str())).unwrap_err();
        assert_eq!(missing.to_string(), "Missing file or blockchain hash");
        assert!(vault.verify(Some(&b"hello"[..]), Some(" ")).is_err());
    }

    #[tokio::test]
    async fn test_chain_round_trip() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        let hash = sha256_hex(b"document").to_string();

        assert!(!vault.verify_on_chain(&hash).await.unwrap());
        vault.store_hash(Some(&hash), Some(OWNER)).await.unwrap();
        assert!(vault.verify_on_chain(&hash).await.unwrap());

        vault.grant_access(Some(&hash), Some(FRIEND)).await.unwrap();
        assert!(vault.check_access(&hash, FRIEND).await.unwrap());
        assert_eq!(vault.access_list(&hash).await.unwrap().len(), 1);

        vault.revoke_access(Some(&hash), Some(FRIEND)).await.unwrap();
        assert!(!vault.check_access(&hash, FRIEND).await.unwrap());

        let record = vault.file_details(1).await.unwrap();
        assert_eq!(record.hash, hash);
        assert_eq!(vault.network_info().await.unwrap().block_number, 3);
    }

    #[tokio::test]
    async fn test_chain_inputs_are_validated() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        let missing = vault.store_hash(None, Some(OWNER)).await.unwrap_err();
        assert_eq!(missing.to_string(), "Missing fileHash or userAddress");

        assert!(matches!(
            vault.grant_access(Some("short"), Some(OWNER)).await,
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            vault.file_details(42).await,
            Err(VaultError::Chain(_))
        ));
    }
}
