use crate::CryptoError;
use hv_types::Sha256Hash;
use sha2::{Digest, Sha256};
use std::io::Read;

const READ_CHUNK: usize = 64 * 1024;

/// Computes the SHA-256 fingerprint of an in-memory buffer.
pub fn sha256_hex(bytes: &[u8]) -> Sha256Hash {
    let digest: [u8; 32] = Sha256::digest(bytes).into();
    Sha256Hash::from_bytes(&digest)
}

/// Computes the SHA-256 fingerprint of everything readable from `reader`.
///
/// Reads in fixed-size chunks so large files are never held in memory.
///
/// # Errors
///
/// Returns `CryptoError::Io` if reading fails.
pub fn sha256_reader<R: Read>(mut reader: R) -> Result<Sha256Hash, CryptoError> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    let digest: [u8; 32] = hasher.finalize().into();
    Ok(Sha256Hash::from_bytes(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            sha256_hex(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            sha256_hex(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_reader_matches_buffer_across_chunks() {
        let data: Vec<u8> = (0..(READ_CHUNK * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = sha256_reader(Cursor::new(&data)).unwrap();
        assert_eq!(streamed, sha256_hex(&data));
    }

    #[test]
    fn test_reader_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"abc").unwrap();
        let file = std::fs::File::open(temp.path()).unwrap();
        assert_eq!(sha256_reader(file).unwrap(), sha256_hex(b"abc"));
    }
}
