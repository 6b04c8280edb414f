use crate::constants::{
    DEFAULT_MAX_UPLOAD_BYTES, MAX_NAME_LEN, METADATA_EXTENSION, RANDOM_SUFFIX_LEN,
};
use crate::FilesError;
use chrono::{DateTime, Utc};
use hv_types::{NonEmptyText, Sha256Hash, WalletAddress};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Metadata for a stored upload
///
/// Persisted as pretty-printed JSON next to the encrypted blob. Field names are camelCase
/// on disk and over the wire.
///
/// `file_hash` is the SHA-256 of the *plaintext*, computed by the client before encryption;
/// it is what gets anchored on chain. `file_size` is the size of the stored ciphertext.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Storage identifier, also the blob's filename
    pub id: String,

    /// Filename supplied by the uploader
    pub original_name: NonEmptyText,

    /// Absolute path of the encrypted blob on the server
    pub storage_path: String,

    /// Wallet address of the uploader
    pub owner: WalletAddress,

    /// SHA-256 of the plaintext
    pub file_hash: Sha256Hash,

    /// Hex-encoded AES key the client used
    pub encryption_key: NonEmptyText,

    /// Size of the stored blob in bytes
    pub file_size: u64,

    /// UTC timestamp when the blob was written
    pub uploaded_at: DateTime<Utc>,

    /// Content type declared by the uploader, if any
    pub mime_type: Option<String>,
}

/// An upload that has passed field validation and is ready to be written.
#[derive(Debug)]
pub struct NewUpload<'a> {
    pub bytes: &'a [u8],
    pub original_name: NonEmptyText,
    pub owner: WalletAddress,
    pub file_hash: Sha256Hash,
    pub encryption_key: NonEmptyText,
    pub mime_type: Option<String>,
}

/// Service for managing uploads within one directory
///
/// # Design
///
/// - Flat: blobs and metadata live side by side in a single directory
/// - Immutable: a blob is created with `create_new` and never rewritten
/// - Defensive: identifiers are validated before any path is built from them
#[derive(Debug)]
pub struct FilesService {
    /// Canonicalised upload directory
    upload_dir: PathBuf,

    /// Largest accepted blob, in bytes
    max_upload_bytes: u64,
}

impl FilesService {
    /// Creates a new `FilesService` rooted at `upload_dir`
    ///
    /// The directory is created if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The path exists but is not a directory
    /// - The directory cannot be created or canonicalised (I/O)
    pub fn new(upload_dir: &Path) -> Result<Self, FilesError> {
        if upload_dir.exists() && !upload_dir.is_dir() {
            return Err(FilesError::InvalidUploadDirectory(format!(
                "Path is not a directory: {}",
                upload_dir.display()
            )));
        }

        fs::create_dir_all(upload_dir).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create upload directory {}: {}",
                    upload_dir.display(),
                    e
                ),
            ))
        })?;

        let upload_dir = upload_dir.canonicalize().map_err(|e| {
            FilesError::InvalidUploadDirectory(format!(
                "Cannot canonicalize path {}: {}",
                upload_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            upload_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        })
    }

    /// Overrides the upload size limit.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Writes an encrypted upload and its metadata record
    ///
    /// The blob is written first. If the metadata record then fails to write, the blob is
    /// removed again so no orphan is left behind.
    ///
    /// # Returns
    ///
    /// The `FileMetadata` that was persisted.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The upload exceeds the size limit
    /// - A blob with the generated id already exists
    /// - Writing the blob or the metadata fails (I/O, serialisation)
    pub fn store(&self, upload: NewUpload<'_>) -> Result<FileMetadata, FilesError> {
        let size = upload.bytes.len() as u64;
        if size > self.max_upload_bytes {
            return Err(FilesError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        let uploaded_at = Utc::now();
        let id = generate_file_id(upload.original_name.as_str(), uploaded_at);
        self.store_as(id, uploaded_at, upload)
    }

    /// Writes `upload` under an id that has already been generated.
    fn store_as(
        &self,
        id: String,
        uploaded_at: DateTime<Utc>,
        upload: NewUpload<'_>,
    ) -> Result<FileMetadata, FilesError> {
        let size = upload.bytes.len() as u64;
        let blob_path = self.blob_path(&id)?;

        write_new(&blob_path, upload.bytes).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                FilesError::FileAlreadyExists(id.clone())
            } else {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write file to {}: {}", blob_path.display(), e),
                ))
            }
        })?;

        let metadata = FileMetadata {
            id: id.clone(),
            original_name: upload.original_name,
            storage_path: blob_path.to_string_lossy().into_owned(),
            owner: upload.owner,
            file_hash: upload.file_hash,
            encryption_key: upload.encryption_key,
            file_size: size,
            uploaded_at,
            mime_type: upload.mime_type,
        };

        if let Err(e) = self.write_metadata(&metadata) {
            if let Err(cleanup) = fs::remove_file(&blob_path) {
                tracing::warn!(
                    "failed to remove blob {} after metadata error: {}",
                    blob_path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::info!(file_id = %id, owner = %metadata.owner, size, "stored upload");
        Ok(metadata)
    }

    /// Reads the encrypted bytes of a stored upload
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `file_id` fails validation
    /// - No blob exists for `file_id`
    /// - The blob cannot be read (I/O)
    pub fn read(&self, file_id: &str) -> Result<Vec<u8>, FilesError> {
        let blob_path = self.blob_path(file_id)?;
        if !blob_path.is_file() {
            return Err(FilesError::NotFound(file_id.to_string()));
        }

        fs::read(&blob_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read file from {}: {}", blob_path.display(), e),
            ))
        })
    }

    /// Loads the metadata record for a stored upload
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if `file_id` is invalid, no record exists, or the record cannot be
    /// read or parsed.
    pub fn metadata(&self, file_id: &str) -> Result<FileMetadata, FilesError> {
        let path = self.metadata_path(file_id)?;
        if !path.is_file() {
            return Err(FilesError::NotFound(file_id.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Lists every upload owned by `owner`, oldest first
    ///
    /// Owner comparison ignores case. Records that fail to parse are skipped with a warning
    /// rather than failing the whole listing.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the upload directory cannot be listed.
    pub fn list_by_owner(&self, owner: &WalletAddress) -> Result<Vec<FileMetadata>, FilesError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.upload_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(METADATA_EXTENSION) {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(FilesError::from)
                .and_then(|s| serde_json::from_str::<FileMetadata>(&s).map_err(FilesError::from));

            match parsed {
                Ok(metadata) if metadata.owner.matches(owner) => files.push(metadata),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("failed to parse metadata {}: {}", path.display(), e);
                }
            }
        }

        files.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        Ok(files)
    }

    fn write_metadata(&self, metadata: &FileMetadata) -> Result<(), FilesError> {
        let path = self.metadata_path(&metadata.id)?;
        let json = serde_json::to_string_pretty(metadata)?;
        write_new(&path, json.as_bytes()).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write metadata to {}: {}", path.display(), e),
            ))
        })
    }

    /// Returns `<upload_dir>/<file_id>` after validating the id
    fn blob_path(&self, file_id: &str) -> Result<PathBuf, FilesError> {
        validate_file_id(file_id)?;
        Ok(self.upload_dir.join(file_id))
    }

    /// Returns `<upload_dir>/<file_id>.json` after validating the id
    fn metadata_path(&self, file_id: &str) -> Result<PathBuf, FilesError> {
        validate_file_id(file_id)?;
        Ok(self
            .upload_dir
            .join(format!("{}.{}", file_id, METADATA_EXTENSION)))
    }
}

/// Builds `<unix-millis>-<random>-<sanitised name>`.
fn generate_file_id(original_name: &str, at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!(
        "{}-{}-{}",
        at.timestamp_millis(),
        suffix,
        sanitise_name(original_name)
    )
}

/// Keeps `[A-Za-z0-9._-]`, replaces everything else with `_`.
///
/// The result is never empty, never starts with a dot, never contains `..` and never ends in
/// the metadata extension, so every generated id passes [`validate_file_id`].
fn sanitise_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    while out.contains("..") {
        out = out.replace("..", "_.");
    }
    if out.starts_with('.') {
        out.replace_range(0..1, "_");
    }
    let metadata_suffix = format!(".{}", METADATA_EXTENSION);
    if out.to_ascii_lowercase().ends_with(&metadata_suffix) {
        let dot = out.len() - metadata_suffix.len();
        out.replace_range(dot..dot + 1, "_");
    }
    if out.is_empty() {
        out.push_str("file");
    }
    out
}

fn validate_file_id(file_id: &str) -> Result<(), FilesError> {
    let valid = !file_id.is_empty()
        && !file_id.starts_with('.')
        && !file_id.contains("..")
        && !file_id
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", METADATA_EXTENSION))
        && file_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(FilesError::InvalidFileId(file_id.to_string()))
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const OWNER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn upload<'a>(bytes: &'a [u8], name: &str, owner: &str) -> NewUpload<'a> {
        NewUpload {
            bytes,
            original_name: NonEmptyText::new(name).unwrap(),
            owner: WalletAddress::parse(owner).unwrap(),
            file_hash: Sha256Hash::parse(HASH).unwrap(),
            encryption_key: NonEmptyText::new("ab".repeat(32)).unwrap(),
            mime_type: Some("application/octet-stream".into()),
        }
    }

    #[test]
    fn test_new_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("uploads");

        let service = FilesService::new(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(service.upload_dir().ends_with("uploads"));
    }

    #[test]
    fn test_new_rejects_file_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("uploads");
        fs::write(&path, "not a directory").unwrap();

        let result = FilesService::new(&path);

        assert!(matches!(result, Err(FilesError::InvalidUploadDirectory(_))));
    }

    #[test]
    fn test_store_writes_blob_and_metadata() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();

        let metadata = service
            .store(upload(b"ciphertext bytes", "report.pdf", OWNER))
            .unwrap();

        assert!(metadata.id.ends_with("-report.pdf"));
        assert_eq!(metadata.original_name.as_str(), "report.pdf");
        assert_eq!(metadata.file_size, 16);
        assert_eq!(metadata.file_hash.as_str(), HASH);

        let blob = temp.path().join(&metadata.id);
        assert_eq!(fs::read(&blob).unwrap(), b"ciphertext bytes");
        assert!(temp.path().join(format!("{}.json", metadata.id)).is_file());
    }

    #[test]
    fn test_metadata_json_uses_camel_case() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();
        let metadata = service.store(upload(b"x", "a.txt", OWNER)).unwrap();

        let raw =
            fs::read_to_string(temp.path().join(format!("{}.json", metadata.id))).unwrap();

        assert!(raw.contains("\"originalName\""));
        assert!(raw.contains("\"encryptionKey\""));
        assert!(raw.contains("\"uploadedAt\""));
    }

    #[test]
    fn test_read_and_metadata_round_trip() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();
        let stored = service.store(upload(b"payload", "notes.txt", OWNER)).unwrap();

        assert_eq!(service.read(&stored.id).unwrap(), b"payload");
        assert_eq!(service.metadata(&stored.id).unwrap(), stored);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();

        assert!(matches!(
            service.read("1700000000000-abcdef-missing.txt"),
            Err(FilesError::NotFound(_))
        ));
        assert!(matches!(
            service.metadata("1700000000000-abcdef-missing.txt"),
            Err(FilesError::NotFound(_))
        ));
    }

    #[test]
    fn test_rejects_unsafe_ids() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();

        for id in ["", "../etc/passwd", "a/b", ".hidden", "x..y", "abc.json", "a b"] {
            assert!(
                matches!(service.read(id), Err(FilesError::InvalidFileId(_))),
                "id {:?} should be rejected",
                id
            );
        }
    }

    #[test]
    fn test_too_large_is_rejected_before_writing() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path())
            .unwrap()
            .with_max_upload_bytes(4);

        let result = service.store(upload(b"12345", "big.bin", OWNER));

        assert!(matches!(
            result,
            Err(FilesError::TooLarge { size: 5, limit: 4 })
        ));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_list_by_owner_ignores_case_and_other_owners() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();

        let first = service.store(upload(b"1", "one.txt", OWNER)).unwrap();
        let second = service
            .store(upload(b"2", "two.txt", &OWNER.to_lowercase()))
            .unwrap();
        service
            .store(upload(
                b"3",
                "three.txt",
                "0x0000000000000000000000000000000000000001",
            ))
            .unwrap();

        let owner = WalletAddress::parse(&OWNER.to_uppercase().replace("0X", "0x")).unwrap();
        let files = service.list_by_owner(&owner).unwrap();

        let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id.as_str()));
        assert!(ids.contains(&second.id.as_str()));
    }

    #[test]
    fn test_list_by_owner_skips_corrupt_metadata() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();
        service.store(upload(b"1", "one.txt", OWNER)).unwrap();
        fs::write(temp.path().join("garbage.json"), "{not json").unwrap();

        let owner = WalletAddress::parse(OWNER).unwrap();
        assert_eq!(service.list_by_owner(&owner).unwrap().len(), 1);
    }

    #[test]
    fn test_list_by_owner_is_oldest_first() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();
        let at = |millis| DateTime::from_timestamp_millis(millis).unwrap();

        for (id, millis) in [("b-mid", 2_000), ("c-new", 3_000), ("a-old", 1_000)] {
            service
                .store_as(id.into(), at(millis), upload(b"x", "x.txt", OWNER))
                .unwrap();
        }

        let owner = WalletAddress::parse(OWNER).unwrap();
        let ids: Vec<_> = service
            .list_by_owner(&owner)
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, ["a-old", "b-mid", "c-new"]);
    }

    #[test]
    fn test_id_collision_keeps_existing_blob() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();
        let id = "1700000000000-abcdef-taken.txt";
        fs::write(temp.path().join(id), b"first").unwrap();

        let result =
            service.store_as(id.into(), Utc::now(), upload(b"second", "taken.txt", OWNER));

        assert!(matches!(result, Err(FilesError::FileAlreadyExists(ref taken)) if taken == id));
        assert_eq!(fs::read(temp.path().join(id)).unwrap(), b"first");
        assert!(!temp.path().join(format!("{}.json", id)).exists());
    }

    #[test]
    fn test_metadata_failure_removes_blob() {
        let temp = TempDir::new().unwrap();
        let service = FilesService::new(temp.path()).unwrap();
        let id = "1700000000000-abcdef-orphan.txt";
        let record = temp.path().join(format!("{}.json", id));
        fs::write(&record, "{}").unwrap();

        let result =
            service.store_as(id.into(), Utc::now(), upload(b"bytes", "orphan.txt", OWNER));

        assert!(matches!(result, Err(FilesError::Io(_))));
        assert!(!temp.path().join(id).exists());
        assert_eq!(fs::read_to_string(&record).unwrap(), "{}");
    }

    #[test]
    fn test_sanitise_name() {
        assert_eq!(sanitise_name("report.pdf"), "report.pdf");
        assert_eq!(sanitise_name("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitise_name("../../etc/passwd"), "_.__._etc_passwd");
        assert_eq!(sanitise_name(".env"), "_env");
        assert_eq!(sanitise_name("data.JSON"), "data_JSON");
        assert_eq!(sanitise_name(""), "file");
        assert_eq!(sanitise_name(&"a".repeat(500)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let at = Utc::now();
        let a = generate_file_id("../weird name.txt", at);
        let b = generate_file_id("../weird name.txt", at);

        assert_ne!(a, b);
        assert!(validate_file_id(&a).is_ok());
        assert!(a.starts_with(&at.timestamp_millis().to_string()));
    }
}
