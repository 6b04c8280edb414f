//! Upload, download, metadata and hash-verification endpoints.

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::{FileMetadataRes, UploadRes, UserFilesRes, VerifyRes};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use chrono::SecondsFormat;
use hv_core::{FileMetadata, UploadRequest};

/// A stream cut off by the body limit is reported against the upload limit.
fn multipart_error(e: MultipartError, limit: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::upload_too_large(limit)
    } else {
        e.into()
    }
}

/// Maps stored metadata onto its wire form.
pub(crate) fn metadata_res(metadata: FileMetadata) -> FileMetadataRes {
    FileMetadataRes {
        id: metadata.id,
        original_name: metadata.original_name.to_string(),
        storage_path: metadata.storage_path,
        owner: metadata.owner.to_string(),
        file_hash: metadata.file_hash.to_string(),
        encryption_key: metadata.encryption_key.to_string(),
        file_size: metadata.file_size,
        uploaded_at: metadata
            .uploaded_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        mime_type: metadata.mime_type,
    }
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = api_shared::UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadRes),
        (status = 400, description = "Missing or malformed field", body = api_shared::ErrorRes),
        (status = 413, description = "File exceeds the upload limit", body = api_shared::ErrorRes),
        (status = 500, description = "Internal server error", body = api_shared::ErrorRes)
    )
)]
/// Store an encrypted file and its metadata
///
/// The client hashes and encrypts the file before sending it; the server stores the ciphertext
/// as-is and records the plaintext hash and key alongside it.
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadRes>, ApiError> {
    let mut multipart = multipart?;
    let mut bytes = None;
    let mut request = UploadRequest::default();

    let read = async {
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "file" => {
                    request.mime_type = field.content_type().map(str::to_owned);
                    bytes = Some(field.bytes().await?);
                }
                "fileName" => request.file_name = Some(field.text().await?),
                "owner" => request.owner = Some(field.text().await?),
                "fileHash" => request.file_hash = Some(field.text().await?),
                "encryptionKey" => request.encryption_key = Some(field.text().await?),
                _ => {}
            }
        }
        Ok::<_, MultipartError>(())
    };
    read.await
        .map_err(|e| multipart_error(e, state.vault.max_upload_bytes()))?;

    let Some(bytes) = bytes else {
        return Err(ApiError::bad_request("No file provided"));
    };
    request.bytes = bytes.to_vec();

    let metadata = state.vault.upload(request)?;
    tracing::info!(id = %metadata.id, owner = %metadata.owner, "file uploaded");

    Ok(Json(UploadRes {
        message: "File uploaded successfully".into(),
        file_id: metadata.id.clone(),
        metadata: metadata_res(metadata),
    }))
}

#[utoipa::path(
    get,
    path = "/api/file/{file_id}",
    params(("file_id" = String, Path, description = "Storage id returned by upload")),
    responses(
        (status = 200, description = "Encrypted blob as an attachment"),
        (status = 400, description = "Malformed id", body = api_shared::ErrorRes),
        (status = 404, description = "File not found", body = api_shared::ErrorRes)
    )
)]
/// Download the encrypted blob
#[axum::debug_handler]
pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.vault.download(&file_id)?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_id),
        ),
    ];
    Ok((headers, bytes))
}

#[utoipa::path(
    get,
    path = "/api/file-metadata/{file_id}",
    params(("file_id" = String, Path, description = "Storage id returned by upload")),
    responses(
        (status = 200, description = "Stored metadata", body = FileMetadataRes),
        (status = 404, description = "Metadata not found", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn file_metadata(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileMetadataRes>, ApiError> {
    let metadata = state.vault.metadata(&file_id)?;
    Ok(Json(metadata_res(metadata)))
}

#[utoipa::path(
    get,
    path = "/api/user-files/{user_address}",
    params(("user_address" = String, Path, description = "Owner wallet address, any case")),
    responses(
        (status = 200, description = "Files owned by the address, none for a malformed one", body = UserFilesRes)
    )
)]
/// List every upload owned by a wallet address
#[axum::debug_handler]
pub async fn user_files(
    State(state): State<AppState>,
    Path(user_address): Path<String>,
) -> Result<Json<UserFilesRes>, ApiError> {
    let files = state.vault.user_files(&user_address)?;

    Ok(Json(UserFilesRes {
        user_address,
        file_count: files.len(),
        files: files.into_iter().map(metadata_res).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/verify",
    request_body(content = api_shared::VerifyForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Comparison result", body = VerifyRes),
        (status = 400, description = "Missing file or blockchain hash", body = api_shared::ErrorRes),
        (status = 413, description = "File exceeds the upload limit", body = api_shared::ErrorRes)
    )
)]
/// Hash an uploaded file and compare it with a claimed hash
///
/// The file is only hashed, never stored.
#[axum::debug_handler]
pub async fn verify(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyRes>, ApiError> {
    let mut multipart = multipart?;
    let mut bytes = None;
    let mut blockchain_hash = None;

    let read = async {
        while let Some(field) = multipart.next_field().await? {
            match field.name().map(str::to_owned).as_deref() {
                Some("file") => bytes = Some(field.bytes().await?),
                Some("blockchainHash") => blockchain_hash = Some(field.text().await?),
                _ => {}
            }
        }
        Ok::<_, MultipartError>(())
    };
    read.await
        .map_err(|e| multipart_error(e, state.vault.max_upload_bytes()))?;

    let verification = state
        .vault
        .verify(bytes.as_deref(), blockchain_hash.as_deref())?;

    let message = if verification.is_valid {
        "✅ File is authentic"
    } else {
        "⚠️ File has been tampered"
    };

    Ok(Json(VerifyRes {
        is_valid: verification.is_valid,
        calculated_hash: verification.calculated_hash.to_string(),
        blockchain_hash: verification.claimed_hash,
        message: message.into(),
    }))
}
