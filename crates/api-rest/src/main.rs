//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful during development when you want the REST server without the workspace's
//! `hashvault-run` entry point. Both read the same environment.

use api_rest::AppState;
use hv_core::constants::DEFAULT_REST_ADDR;
use hv_core::{CoreConfig, VaultService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the HashVault REST API server
///
/// # Environment Variables
/// - `HV_REST_ADDR`: Server address (default: "0.0.0.0:5000")
/// - `API_KEY`: Key required on gas-spending routes (optional)
/// - everything read by [`CoreConfig::from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the upload directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("hv_core=info".parse()?)
                .add_directive("hv_files=info".parse()?)
                .add_directive("hv_chain=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("HV_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    tracing::info!("-- Starting HashVault REST API on {}", addr);

    let cfg = CoreConfig::from_env()?;
    let vault = VaultService::from_config(&cfg)?;
    let state = AppState::new(vault, std::env::var("API_KEY").ok());

    api_rest::serve(&addr, state).await
}
