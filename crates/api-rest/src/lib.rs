//! # API REST
//!
//! REST API implementation for HashVault.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart uploads, JSON errors, CORS, API key)
//!
//! Uses `api-shared` for wire types and `hv-core` for everything else.

#![warn(rust_2018_idioms)]

mod blockchain;
mod error;
mod files;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{build_router, ApiDoc};
pub use state::AppState;

/// Binds `addr` and serves the router until the process is stopped.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- REST API listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
