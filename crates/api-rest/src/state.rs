use hv_core::VaultService;
use std::sync::Arc;

/// Application state for the REST API server
///
/// Shared by every request handler. Cloning is cheap: the vault keeps its file store and
/// registry behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub vault: VaultService,
    /// Key required on gas-spending routes; `None` leaves them open
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(vault: VaultService, api_key: Option<String>) -> Self {
        Self {
            vault,
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .map(Arc::from),
        }
    }
}
