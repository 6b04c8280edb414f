//! Blocking HTTP client for the HashVault REST API.

use anyhow::{bail, Context, Result};
use api_shared::auth::API_KEY_HEADER;
use api_shared::{
    AccessListRes, CheckAccessRes, ErrorRes, FileMetadataRes, GrantAccessRes, HashUserReq,
    HealthRes, RevokeAccessRes, StoreHashRes, UploadRes, UserFilesRes, VerifyChainRes, VerifyRes,
};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub struct VaultClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

/// Fields sent alongside an encrypted upload.
pub struct UploadFields<'a> {
    pub file_name: &'a str,
    pub owner: &'a str,
    pub file_hash: &'a str,
    pub encryption_key: &'a str,
}

impl VaultClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key,
            http: Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn health(&self) -> Result<HealthRes> {
        self.send(self.http.get(self.url("/health")))
    }

    pub fn upload(&self, ciphertext: Vec<u8>, fields: UploadFields<'_>) -> Result<UploadRes> {
        let form = Form::new()
            .part(
                "file",
                Part::bytes(ciphertext)
                    .file_name(fields.file_name.to_string())
                    .mime_str("application/octet-stream")?,
            )
            .text("fileName", fields.file_name.to_string())
            .text("owner", fields.owner.to_string())
            .text("fileHash", fields.file_hash.to_string())
            .text("encryptionKey", fields.encryption_key.to_string());

        self.send(self.http.post(self.url("/api/upload")).multipart(form))
    }

    pub fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.url(&format!("/api/file/{}", file_id)))
            .send()
            .with_context(|| format!("request to {} failed", self.base_url))?;
        Ok(check(response)?.bytes()?.to_vec())
    }

    pub fn verify(&self, bytes: Vec<u8>, claimed_hash: &str) -> Result<VerifyRes> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name("verify"))
            .text("blockchainHash", claimed_hash.to_string());
        self.send(self.http.post(self.url("/api/verify")).multipart(form))
    }

    pub fn file_metadata(&self, file_id: &str) -> Result<FileMetadataRes> {
        let url = self.url(&format!("/api/file-metadata/{}", file_id));
        self.send(self.http.get(url))
    }

    pub fn user_files(&self, owner: &str) -> Result<UserFilesRes> {
        let url = self.url(&format!("/api/user-files/{}", owner));
        self.send(self.http.get(url))
    }

    pub fn store_hash(&self, file_hash: &str, owner: &str) -> Result<StoreHashRes> {
        self.send(self.hash_user_post("store-hash", file_hash, owner))
    }

    pub fn verify_on_chain(&self, file_hash: &str) -> Result<VerifyChainRes> {
        let url = self.url(&format!("/api/blockchain/verify-blockchain/{}", file_hash));
        self.send(self.http.get(url))
    }

    pub fn grant_access(&self, file_hash: &str, address: &str) -> Result<GrantAccessRes> {
        self.send(self.hash_user_post("grant-access", file_hash, address))
    }

    pub fn revoke_access(&self, file_hash: &str, address: &str) -> Result<RevokeAccessRes> {
        self.send(self.hash_user_post("revoke-access", file_hash, address))
    }

    pub fn check_access(&self, file_hash: &str, address: &str) -> Result<CheckAccessRes> {
        let url = self.url(&format!(
            "/api/blockchain/check-access/{}/{}",
            file_hash, address
        ));
        self.send(self.http.get(url))
    }

    pub fn access_list(&self, file_hash: &str) -> Result<AccessListRes> {
        let url = self.url(&format!("/api/blockchain/access-list/{}", file_hash));
        self.send(self.http.get(url))
    }

    /// POST to a gas-spending contract route, carrying the API key when one is set.
    fn hash_user_post(&self, route: &str, file_hash: &str, address: &str) -> RequestBuilder {
        let body = HashUserReq {
            file_hash: Some(file_hash.to_string()),
            user_address: Some(address.to_string()),
        };
        let request = self
            .http
            .post(self.url(&format!("/api/blockchain/{}", route)))
            .json(&body);
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .with_context(|| format!("request to {} failed", self.base_url))?;
        Ok(check(response)?.json()?)
    }
}

/// Turns a non-2xx response into an error carrying the server's message.
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorRes>()
        .map(|e| e.error)
        .unwrap_or_else(|_| status.to_string());
    bail!("server returned {}: {}", status.as_u16(), message)
}
