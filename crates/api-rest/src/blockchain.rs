//! Contract-backed endpoints under `/api/blockchain`.

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::auth::{validate_api_key, API_KEY_HEADER};
use api_shared::{
    AccessListRes, CheckAccessRes, FileDetailsRes, GrantAccessRes, HashUserReq, NetworkInfoRes,
    RevokeAccessRes, StoreHashRes, VerifyChainRes,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::{Json, Response};

/// Rejects requests without the configured `x-api-key` on routes that spend gas.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    validate_api_key(state.api_key.as_deref(), provided)?;
    Ok(next.run(request).await)
}

/// Unwraps a `fileHash`/`userAddress` body.
///
/// A request sent without a JSON content type carries no fields, so it falls through to the
/// usual "missing fields" error. Malformed JSON is rejected with the extractor's status.
fn hash_user_body(
    body: Result<Json<HashUserReq>, JsonRejection>,
) -> Result<HashUserReq, ApiError> {
    match body {
        Ok(Json(req)) => Ok(req),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(HashUserReq::default()),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    post,
    path = "/api/blockchain/store-hash",
    request_body = HashUserReq,
    responses(
        (status = 200, description = "Hash registered", body = StoreHashRes),
        (status = 400, description = "Missing fileHash or userAddress", body = api_shared::ErrorRes),
        (status = 422, description = "Body is not a valid request", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = api_shared::ErrorRes),
        (status = 500, description = "Contract call failed", body = api_shared::ErrorRes)
    ),
    security(("api_key" = []))
)]
/// Register a file hash on chain under an owner address
#[axum::debug_handler]
pub async fn store_hash(
    State(state): State<AppState>,
    body: Result<Json<HashUserReq>, JsonRejection>,
) -> Result<Json<StoreHashRes>, ApiError> {
    let req = hash_user_body(body)?;
    let receipt = state
        .vault
        .store_hash(req.file_hash.as_deref(), req.user_address.as_deref())
        .await?;

    Ok(Json(StoreHashRes {
        message: "Hash stored on blockchain".into(),
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
    }))
}

#[utoipa::path(
    get,
    path = "/api/blockchain/verify-blockchain/{file_hash}",
    params(("file_hash" = String, Path, description = "SHA-256 of the plaintext")),
    responses(
        (status = 200, description = "Whether the hash is registered", body = VerifyChainRes),
        (status = 400, description = "Malformed hash", body = api_shared::ErrorRes),
        (status = 500, description = "Contract call failed", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn verify_blockchain(
    State(state): State<AppState>,
    Path(file_hash): Path<String>,
) -> Result<Json<VerifyChainRes>, ApiError> {
    let is_valid = state.vault.verify_on_chain(&file_hash).await?;

    let message = if is_valid {
        "✅ Hash found on blockchain"
    } else {
        "❌ Hash not found on blockchain"
    };
    Ok(Json(VerifyChainRes {
        file_hash,
        is_valid,
        message: message.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/blockchain/grant-access",
    request_body = HashUserReq,
    responses(
        (status = 200, description = "Access granted", body = GrantAccessRes),
        (status = 400, description = "Missing fileHash or userAddress", body = api_shared::ErrorRes),
        (status = 422, description = "Body is not a valid request", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = api_shared::ErrorRes),
        (status = 404, description = "Hash not registered", body = api_shared::ErrorRes),
        (status = 500, description = "Contract call failed", body = api_shared::ErrorRes)
    ),
    security(("api_key" = []))
)]
#[axum::debug_handler]
pub async fn grant_access(
    State(state): State<AppState>,
    body: Result<Json<HashUserReq>, JsonRejection>,
) -> Result<Json<GrantAccessRes>, ApiError> {
    let req = hash_user_body(body)?;
    let receipt = state
        .vault
        .grant_access(req.file_hash.as_deref(), req.user_address.as_deref())
        .await?;

    Ok(Json(GrantAccessRes {
        message: "Access granted".into(),
        transaction_hash: receipt.transaction_hash,
        granted_to: req.user_address.unwrap_or_default(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/blockchain/revoke-access",
    request_body = HashUserReq,
    responses(
        (status = 200, description = "Access revoked", body = RevokeAccessRes),
        (status = 400, description = "Missing fileHash or userAddress", body = api_shared::ErrorRes),
        (status = 422, description = "Body is not a valid request", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = api_shared::ErrorRes),
        (status = 404, description = "Hash not registered", body = api_shared::ErrorRes),
        (status = 500, description = "Contract call failed", body = api_shared::ErrorRes)
    ),
    security(("api_key" = []))
)]
#[axum::debug_handler]
pub async fn revoke_access(
    State(state): State<AppState>,
    body: Result<Json<HashUserReq>, JsonRejection>,
) -> Result<Json<RevokeAccessRes>, ApiError> {
    let req = hash_user_body(body)?;
    let receipt = state
        .vault
        .revoke_access(req.file_hash.as_deref(), req.user_address.as_deref())
        .await?;

    Ok(Json(RevokeAccessRes {
        message: "Access revoked".into(),
        transaction_hash: receipt.transaction_hash,
        revoked_from: req.user_address.unwrap_or_default(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/blockchain/check-access/{file_hash}/{user_address}",
    params(
        ("file_hash" = String, Path, description = "SHA-256 of the plaintext"),
        ("user_address" = String, Path, description = "Wallet address to check")
    ),
    responses(
        (status = 200, description = "Whether the address may access the file", body = CheckAccessRes),
        (status = 400, description = "Malformed hash or address", body = api_shared::ErrorRes),
        (status = 500, description = "Contract call failed", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn check_access(
    State(state): State<AppState>,
    Path((file_hash, user_address)): Path<(String, String)>,
) -> Result<Json<CheckAccessRes>, ApiError> {
    let has_access = state.vault.check_access(&file_hash, &user_address).await?;

    let message = if has_access {
        "✅ User has access"
    } else {
        "❌ User does not have access"
    };
    Ok(Json(CheckAccessRes {
        file_hash,
        user_address,
        has_access,
        message: message.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/blockchain/access-list/{file_hash}",
    params(("file_hash" = String, Path, description = "SHA-256 of the plaintext")),
    responses(
        (status = 200, description = "Addresses granted access", body = AccessListRes),
        (status = 400, description = "Malformed hash", body = api_shared::ErrorRes),
        (status = 500, description = "Contract call failed", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn access_list(
    State(state): State<AppState>,
    Path(file_hash): Path<String>,
) -> Result<Json<AccessListRes>, ApiError> {
    let addresses = state.vault.access_list(&file_hash).await?;

    Ok(Json(AccessListRes {
        file_hash,
        addresses: addresses.into_iter().map(|a| a.to_string()).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/blockchain/file-details/{file_id}",
    params(("file_id" = u64, Path, description = "1-based on-chain record id")),
    responses(
        (status = 200, description = "On-chain record", body = FileDetailsRes),
        (status = 400, description = "Malformed id", body = api_shared::ErrorRes),
        (status = 404, description = "No record with this id", body = api_shared::ErrorRes),
        (status = 500, description = "Contract call failed", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn file_details(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileDetailsRes>, ApiError> {
    let file_id: u64 = file_id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid file id: {}", file_id)))?;
    let record = state.vault.file_details(file_id).await?;

    Ok(Json(FileDetailsRes {
        file_id,
        hash: record.hash,
        owner: record.owner.to_string(),
        timestamp: record.timestamp,
    }))
}

#[utoipa::path(
    get,
    path = "/api/blockchain/network-info",
    responses(
        (status = 200, description = "Connected network", body = NetworkInfoRes),
        (status = 500, description = "RPC call failed", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn network_info(
    State(state): State<AppState>,
) -> Result<Json<NetworkInfoRes>, ApiError> {
    let info = state.vault.network_info().await?;

    Ok(Json(NetworkInfoRes {
        network: info.network,
        chain_id: info.chain_id,
        block_number: info.block_number,
        rpc_url: info.rpc_url,
    }))
}
