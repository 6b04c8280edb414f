//! Defaults used when the corresponding environment variable is unset.

/// Directory holding encrypted blobs and their metadata records.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Upload size limit applied when `MAX_UPLOAD_BYTES` is unset.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = hv_files::DEFAULT_MAX_UPLOAD_BYTES;

/// Address the REST server binds to.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5000";
