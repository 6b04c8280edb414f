use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use hv_core::constants::DEFAULT_REST_ADDR;
use hv_core::{CoreConfig, VaultService};

/// Main entry point for the HashVault server
///
/// Loads `.env`, resolves configuration once, opens the upload directory, connects the
/// contract registry and serves the REST API.
///
/// # Environment Variables
/// - `HV_REST_ADDR`: REST server address (default: "0.0.0.0:5000")
/// - `UPLOAD_DIR`: Directory for encrypted blobs and metadata (default: "uploads")
/// - `MAX_UPLOAD_BYTES`: Upload size limit (default: 100 MiB)
/// - `CHAIN_MODE`: `evm` (default) or `memory`
/// - `BLOCKCHAIN_RPC`: JSON-RPC endpoint (default: "http://localhost:7545")
/// - `CONTRACT_ADDRESS`, `PRIVATE_KEY`: Contract and signing key for chain calls
/// - `API_KEY`: Required `x-api-key` on gas-spending routes (optional)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hashvault_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("hv_core=info".parse()?)
                .add_directive("hv_files=info".parse()?)
                .add_directive("hv_chain=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("HV_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = CoreConfig::from_env()?;
    tracing::info!(
        upload_dir = %cfg.upload_dir().display(),
        max_upload_bytes = cfg.max_upload_bytes(),
        chain = ?cfg.chain(),
        "configuration loaded"
    );

    let vault = VaultService::from_config(&cfg)?;
    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.trim().is_empty());
    if api_key.is_none() {
        tracing::warn!("API_KEY not set; gas-spending routes are open");
    }

    tracing::info!("++ Starting HashVault REST on {}", rest_addr);
    api_rest::serve(&rest_addr, AppState::new(vault, api_key)).await
}
