//! Wire types for the REST API.
//!
//! Field names are camelCase on the wire. Requests deserialise leniently (missing fields
//! become `None`) so handlers can answer with the same messages whether a field is absent or
//! blank.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataRes {
    pub id: String,
    pub original_name: String,
    pub storage_path: String,
    pub owner: String,
    /// SHA-256 of the plaintext, lower-case hex
    pub file_hash: String,
    pub encryption_key: String,
    /// Size of the stored ciphertext in bytes
    pub file_size: u64,
    /// RFC 3339 UTC timestamp
    pub uploaded_at: String,
    pub mime_type: Option<String>,
}

/// Multipart body of `POST /api/upload`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadForm {
    /// Encrypted file contents
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub file_name: String,
    /// Wallet address of the uploader
    pub owner: String,
    /// SHA-256 of the plaintext
    pub file_hash: String,
    /// Hex-encoded 256-bit AES key
    pub encryption_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadRes {
    pub message: String,
    pub file_id: String,
    pub metadata: FileMetadataRes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserFilesRes {
    pub user_address: String,
    pub file_count: usize,
    pub files: Vec<FileMetadataRes>,
}

/// Multipart body of `POST /api/verify`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyForm {
    /// File to hash
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Expected SHA-256
    pub blockchain_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRes {
    pub is_valid: bool,
    pub calculated_hash: String,
    pub blockchain_hash: String,
    pub message: String,
}

/// Body of `store-hash`, `grant-access` and `revoke-access`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HashUserReq {
    pub file_hash: Option<String>,
    pub user_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreHashRes {
    pub message: String,
    pub transaction_hash: String,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyChainRes {
    pub file_hash: String,
    pub is_valid: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantAccessRes {
    pub message: String,
    pub transaction_hash: String,
    pub granted_to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeAccessRes {
    pub message: String,
    pub transaction_hash: String,
    pub revoked_from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckAccessRes {
    pub file_hash: String,
    pub user_address: String,
    pub has_access: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessListRes {
    pub file_hash: String,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDetailsRes {
    pub file_id: u64,
    pub hash: String,
    pub owner: String,
    /// Unix seconds
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfoRes {
    pub network: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub rpc_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_user_req_tolerates_missing_fields() {
        let req: HashUserReq = serde_json::from_str(r#"{"fileHash":"abc"}"#).unwrap();
        assert_eq!(req.file_hash.as_deref(), Some("abc"));
        assert_eq!(req.user_address, None);

        let empty: HashUserReq = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, HashUserReq::default());
    }

    #[test]
    fn test_responses_use_camel_case() {
        let res = StoreHashRes {
            message: "Hash stored on blockchain".into(),
            transaction_hash: "0xabc".into(),
            block_number: Some(7),
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["transactionHash"], "0xabc");
        assert_eq!(json["blockNumber"], 7);
    }
}
