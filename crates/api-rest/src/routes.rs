use crate::blockchain::{self, require_api_key};
use crate::files;
use crate::state::AppState;
use api_shared::auth::API_KEY_HEADER;
use api_shared::{HealthRes, HealthService};
use axum::extract::{DefaultBodyLimit, State};
use axum::middleware;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and text fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        files::upload,
        files::download,
        files::file_metadata,
        files::user_files,
        files::verify,
        blockchain::store_hash,
        blockchain::verify_blockchain,
        blockchain::grant_access,
        blockchain::revoke_access,
        blockchain::check_access,
        blockchain::access_list,
        blockchain::file_details,
        blockchain::network_info,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::FileMetadataRes,
        api_shared::UploadForm,
        api_shared::UploadRes,
        api_shared::UserFilesRes,
        api_shared::VerifyForm,
        api_shared::VerifyRes,
        api_shared::HashUserReq,
        api_shared::StoreHashRes,
        api_shared::VerifyChainRes,
        api_shared::GrantAccessRes,
        api_shared::RevokeAccessRes,
        api_shared::CheckAccessRes,
        api_shared::AccessListRes,
        api_shared::FileDetailsRes,
        api_shared::NetworkInfoRes,
    )),
    modifiers(&ApiKeyScheme)
)]
pub struct ApiDoc;

struct ApiKeyScheme;

impl Modify for ApiKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

/// Builds the full application router.
///
/// - `/health`
/// - `/api/...` file endpoints
/// - `/api/blockchain/...` contract endpoints; `store-hash`, `grant-access` and
///   `revoke-access` sit behind [`require_api_key`]
/// - `/swagger-ui` and `/api-docs/openapi.json`
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .vault
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let gas_spending = Router::new()
        .route("/store-hash", post(blockchain::store_hash))
        .route("/grant-access", post(blockchain::grant_access))
        .route("/revoke-access", post(blockchain::revoke_access))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let chain = Router::new()
        .route(
            "/verify-blockchain/:file_hash",
            get(blockchain::verify_blockchain),
        )
        .route(
            "/check-access/:file_hash/:user_address",
            get(blockchain::check_access),
        )
        .route("/access-list/:file_hash", get(blockchain::access_list))
        .route("/file-details/:file_id", get(blockchain::file_details))
        .route("/network-info", get(blockchain::network_info))
        .merge(gas_spending);

    let api = Router::new()
        .route("/upload", post(files::upload))
        .route("/file/:file_id", get(files::download))
        .route("/file-metadata/:file_id", get(files::file_metadata))
        .route("/user-files/:user_address", get(files::user_files))
        .route("/verify", post(files::verify))
        .nest("/blockchain", chain);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/health",
            "/api/upload",
            "/api/file/{file_id}",
            "/api/verify",
            "/api/blockchain/store-hash",
            "/api/blockchain/check-access/{file_hash}/{user_address}",
            "/api/blockchain/network-info",
        ] {
            assert!(paths.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_openapi_declares_api_key_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
