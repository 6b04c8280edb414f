//! HashVault File Storage
//!
//! This crate stores encrypted uploads on the local filesystem, one flat directory per
//! deployment.
//!
//! ## Design Principles
//!
//! - The server only ever sees ciphertext; the plaintext hash travels alongside as metadata
//! - Every blob has exactly one side-car JSON record next to it
//! - Blobs are never overwritten; a new upload always gets a new identifier
//! - Identifiers are validated before they are turned into paths
//!
//! ## Layout
//!
//! ```text
//! <upload_dir>/
//! ├── 1718031234567-k3j9xq-report.pdf        # encrypted bytes
//! └── 1718031234567-k3j9xq-report.pdf.json   # FileMetadata
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use hv_files::FilesService;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = FilesService::new(Path::new("uploads"))?;
//! let bytes = service.read("1718031234567-k3j9xq-report.pdf")?;
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;

pub use constants::{DEFAULT_MAX_UPLOAD_BYTES, METADATA_EXTENSION};
pub use files::{FileMetadata, FilesService, NewUpload};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Upload directory path exists but is not a directory
    #[error("Invalid upload directory: {0}")]
    InvalidUploadDirectory(String),

    /// Identifier failed validation (potential directory traversal or unsafe path)
    #[error("Invalid file id: {0}")]
    InvalidFileId(String),

    /// No blob or metadata exists for the identifier
    #[error("File not found: {0}")]
    NotFound(String),

    /// A blob with the generated identifier is already on disk
    #[error("File {0} already exists in storage")]
    FileAlreadyExists(String),

    /// Upload exceeds the configured size limit
    #[error("File of {size} bytes exceeds the {limit} byte upload limit")]
    TooLarge { size: u64, limit: u64 },

    /// Metadata could not be encoded or decoded
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
