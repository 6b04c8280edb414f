mod client;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client::{UploadFields, VaultClient};
use hv_crypto::{decrypt, encrypt, sha256_hex, sha256_reader, EncryptionKey, Sha256Hash};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hv")]
#[command(about = "HashVault client: hash and encrypt locally, store and verify remotely")]
struct Cli {
    /// HashVault server base URL
    #[arg(
        long,
        global = true,
        env = "HV_SERVER_URL",
        default_value = "http://localhost:5000"
    )]
    server: String,

    /// API key for routes that spend the server wallet's gas
    #[arg(long, global = true, env = "HV_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is up
    Health,
    /// Print the SHA-256 of a file
    Hash { path: PathBuf },
    /// Encrypt a file with AES-256-GCM
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        /// Hex key to use (generated if omitted)
        #[arg(long)]
        key: Option<String>,
    },
    /// Decrypt a file produced by `encrypt` or `download`
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        key: String,
    },
    /// Hash, encrypt and upload a file
    Upload {
        path: PathBuf,
        /// Owner wallet address
        #[arg(long)]
        owner: String,
        /// Name recorded on the server (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Also register the hash on chain
        #[arg(long)]
        store_on_chain: bool,
    },
    /// Compare a file's hash with an expected one
    Verify {
        path: PathBuf,
        #[arg(long)]
        hash: String,
        /// Decrypt the file with this key before hashing
        #[arg(long)]
        key: Option<String>,
        /// Ask the server to do the comparison too
        #[arg(long)]
        remote: bool,
    },
    /// Download an encrypted file, decrypting it if a key is given
    Download {
        file_id: String,
        output: PathBuf,
        #[arg(long)]
        key: Option<String>,
    },
    /// Show the server's metadata record for an upload
    Metadata { file_id: String },
    /// List the uploads owned by a wallet address
    Files {
        #[arg(long)]
        owner: String,
    },
    /// Ask the contract whether a hash is registered
    CheckChain { hash: String },
    /// Allow an address to access a registered file
    GrantAccess { hash: String, address: String },
    /// Withdraw an address's access to a registered file
    RevokeAccess { hash: String, address: String },
    /// Ask the contract whether an address may access a file
    CheckAccess { hash: String, address: String },
    /// List the addresses granted access to a file
    AccessList { hash: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = VaultClient::new(&cli.server, cli.api_key);

    match cli.command {
        Some(Commands::Health) => {
            let health = client.health()?;
            println!("{}", health.message);
        }
        Some(Commands::Hash { path }) => {
            println!("{}", hash_file(&path)?);
        }
        Some(Commands::Encrypt { input, output, key }) => {
            let key = match key {
                Some(hex) => EncryptionKey::parse(&hex)?,
                None => EncryptionKey::generate(),
            };
            encrypt_file(&input, &output, &key)?;
            println!("Encrypted {} -> {}", input.display(), output.display());
            println!("Key: {}", key.to_hex());
        }
        Some(Commands::Decrypt { input, output, key }) => {
            decrypt_file(&input, &output, &EncryptionKey::parse(&key)?)?;
            println!("Decrypted {} -> {}", input.display(), output.display());
        }
        Some(Commands::Upload {
            path,
            owner,
            name,
            store_on_chain,
        }) => {
            let plaintext = read(&path)?;
            let file_hash = sha256_hex(&plaintext);
            let key = EncryptionKey::generate();
            let ciphertext = encrypt(&key, &plaintext)?;
            let file_name = match name {
                Some(name) => name,
                None => display_name(&path)?,
            };

            let key_hex = key.to_hex();
            let uploaded = client.upload(
                ciphertext,
                UploadFields {
                    file_name: &file_name,
                    owner: &owner,
                    file_hash: file_hash.as_str(),
                    encryption_key: &key_hex,
                },
            )?;
            println!("File id: {}", uploaded.file_id);
            println!("Hash:    {}", file_hash);
            println!("Key:     {}", key_hex);

            if store_on_chain {
                let stored = client.store_hash(file_hash.as_str(), &owner)?;
                println!("Transaction: {}", stored.transaction_hash);
            }
        }
        Some(Commands::Verify {
            path,
            hash,
            key,
            remote,
        }) => {
            let mut bytes = read(&path)?;
            if let Some(key) = key {
                bytes = decrypt(&EncryptionKey::parse(&key)?, &bytes)?;
            }

            let local = verify_bytes(&bytes, &hash);
            println!("Calculated: {}", sha256_hex(&bytes));
            println!(
                "{}",
                if local {
                    "File is authentic"
                } else {
                    "File has been tampered"
                }
            );

            if remote {
                let res = client.verify(bytes, &hash)?;
                println!("Server: {}", res.message);
            }
            if !local {
                std::process::exit(1);
            }
        }
        Some(Commands::Download {
            file_id,
            output,
            key,
        }) => {
            let mut bytes = client.download(&file_id)?;
            if let Some(key) = key {
                bytes = decrypt(&EncryptionKey::parse(&key)?, &bytes)?;
            }
            fs::write(&output, &bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), output.display());
        }
        Some(Commands::Metadata { file_id }) => {
            let meta = client.file_metadata(&file_id)?;
            println!("Name:     {}", meta.original_name);
            println!("Owner:    {}", meta.owner);
            println!("Hash:     {}", meta.file_hash);
            println!("Size:     {} bytes", meta.file_size);
            println!("Uploaded: {}", meta.uploaded_at);
        }
        Some(Commands::Files { owner }) => {
            let listing = client.user_files(&owner)?;
            println!("{} file(s) owned by {}", listing.file_count, listing.user_address);
            for file in listing.files {
                println!("{}  {}  {}", file.uploaded_at, file.id, file.file_hash);
            }
        }
        Some(Commands::CheckChain { hash }) => {
            let res = client.verify_on_chain(&hash)?;
            println!("{}", res.message);
        }
        Some(Commands::GrantAccess { hash, address }) => {
            let res = client.grant_access(&hash, &address)?;
            println!("{} to {}", res.message, res.granted_to);
            println!("Transaction: {}", res.transaction_hash);
        }
        Some(Commands::RevokeAccess { hash, address }) => {
            let res = client.revoke_access(&hash, &address)?;
            println!("{} from {}", res.message, res.revoked_from);
            println!("Transaction: {}", res.transaction_hash);
        }
        Some(Commands::CheckAccess { hash, address }) => {
            let res = client.check_access(&hash, &address)?;
            println!("{}", res.message);
            if !res.has_access {
                std::process::exit(1);
            }
        }
        Some(Commands::AccessList { hash }) => {
            let res = client.access_list(&hash)?;
            if res.addresses.is_empty() {
                println!("No addresses have been granted access");
            }
            for address in res.addresses {
                println!("{}", address);
            }
        }
        None => {
            println!("Use 'hv --help' for commands");
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn hash_file(path: &Path) -> Result<Sha256Hash> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(sha256_reader(file)?)
}

fn encrypt_file(input: &Path, output: &Path, key: &EncryptionKey) -> Result<()> {
    let blob = encrypt(key, &read(input)?)?;
    fs::write(output, blob).with_context(|| format!("failed to write {}", output.display()))
}

fn decrypt_file(input: &Path, output: &Path, key: &EncryptionKey) -> Result<()> {
    let plaintext = decrypt(key, &read(input)?)?;
    fs::write(output, plaintext)
        .with_context(|| format!("failed to write {}", output.display()))
}

/// Case-insensitive comparison; a malformed expected hash never matches.
fn verify_bytes(bytes: &[u8], expected: &str) -> bool {
    Sha256Hash::parse(expected).is_ok_and(|expected| expected == sha256_hex(bytes))
}

fn display_name(path: &Path) -> Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        _ => bail!("cannot derive a file name from {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let cli = Cli::try_parse_from([
            "hv",
            "--server",
            "http://vault:5000",
            "upload",
            "report.pdf",
            "--owner",
            "0x00000000000000000000000000000000000000a1",
            "--store-on-chain",
        ])
        .unwrap();

        assert_eq!(cli.server, "http://vault:5000");
        match cli.command {
            Some(Commands::Upload {
                path,
                store_on_chain,
                name,
                ..
            }) => {
                assert_eq!(path, PathBuf::from("report.pdf"));
                assert!(store_on_chain);
                assert!(name.is_none());
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_parse_access_commands() {
        const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
        const FRIEND: &str = "0x00000000000000000000000000000000000000f1";

        let cli = Cli::try_parse_from(["hv", "--api-key", "k", "grant-access", HASH, FRIEND])
            .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        assert!(matches!(
            cli.command,
            Some(Commands::GrantAccess { ref hash, ref address }) if hash == HASH && address == FRIEND
        ));

        let cli = Cli::try_parse_from(["hv", "revoke-access", HASH, FRIEND]).unwrap();
        assert!(matches!(cli.command, Some(Commands::RevokeAccess { .. })));

        let cli = Cli::try_parse_from(["hv", "check-access", HASH, FRIEND]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckAccess { .. })));

        let cli = Cli::try_parse_from(["hv", "access-list", HASH]).unwrap();
        assert!(matches!(cli.command, Some(Commands::AccessList { ref hash }) if hash == HASH));

        assert!(Cli::try_parse_from(["hv", "grant-access", HASH]).is_err());
    }

    #[test]
    fn test_parse_listing_commands() {
        let cli = Cli::try_parse_from(["hv", "files", "--owner", "0xabc"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Files { ref owner }) if owner == "0xabc"));
        assert!(Cli::try_parse_from(["hv", "files"]).is_err());

        let cli = Cli::try_parse_from(["hv", "metadata", "1700000000000-abcdef-a.txt"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Metadata { ref file_id }) if file_id == "1700000000000-abcdef-a.txt"
        ));
    }

    #[test]
    fn test_decrypt_requires_key() {
        assert!(Cli::try_parse_from(["hv", "decrypt", "in", "out"]).is_err());
    }

    #[test]
    fn test_encrypt_decrypt_files() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain.txt");
        let sealed = dir.path().join("plain.txt.enc");
        let opened = dir.path().join("opened.txt");
        fs::write(&plain, b"meeting at noon").unwrap();
        let key = EncryptionKey::generate();

        encrypt_file(&plain, &sealed, &key).unwrap();
        assert_ne!(fs::read(&sealed).unwrap(), b"meeting at noon");

        decrypt_file(&sealed, &opened, &key).unwrap();
        assert_eq!(fs::read(&opened).unwrap(), b"meeting at noon");

        let wrong = EncryptionKey::generate();
        assert!(decrypt_file(&sealed, &opened, &wrong).is_err());
    }

    #[test]
    fn test_hash_file_matches_in_memory_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, vec![7u8; 200_000]).unwrap();

        assert_eq!(hash_file(&path).unwrap(), sha256_hex(&vec![7u8; 200_000]));
        assert!(hash_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_verify_bytes() {
        let hash = sha256_hex(b"abc").to_string();
        assert!(verify_bytes(b"abc", &hash));
        assert!(verify_bytes(b"abc", &format!("0x{}", hash.to_uppercase())));
        assert!(!verify_bytes(b"abd", &hash));
        assert!(!verify_bytes(b"abc", "not-a-hash"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name(Path::new("/tmp/report.pdf")).unwrap(),
            "report.pdf"
        );
        assert!(display_name(Path::new("/")).is_err());
    }
}
