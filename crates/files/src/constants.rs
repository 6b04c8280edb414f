/// Extension of the side-car metadata record written next to each blob.
pub const METADATA_EXTENSION: &str = "json";

/// Largest accepted upload (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Length of the random component of a generated file id.
pub(crate) const RANDOM_SUFFIX_LEN: usize = 6;

/// Longest sanitised original name kept inside a file id.
pub(crate) const MAX_NAME_LEN: usize = 128;
