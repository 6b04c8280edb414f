//! # HashVault Core
//!
//! Business logic shared by every HashVault front end.
//!
//! - [`CoreConfig`]: settings resolved once from the environment at startup
//! - [`VaultService`]: validates requests, stores encrypted uploads and forwards hash and
//!   access-control calls to the contract registry
//!
//! **No API concerns**: HTTP routing, authentication and wire formats belong in `api-rest`
//! and `api-shared`.

pub mod config;
pub mod constants;
mod error;
mod vault;

pub use config::CoreConfig;
pub use error::{VaultError, VaultResult};
pub use vault::{UploadRequest, Verification, VaultService};

pub use hv_chain::{ChainError, ChainMode, ChainSettings, FileRecord, NetworkInfo, TxReceipt};
pub use hv_files::{FileMetadata, FilesError};
pub use hv_types::{Sha256Hash, WalletAddress};
