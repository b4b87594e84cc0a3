// Hashing module using BLAKE3

use std::fs::File;
use std::io::Read;
use std::path::Path;
use crate::constants::HASH_CHUNK_SIZE;
use crate::error::{ArchiveError, Result};

/// Format a finished hasher the way every stored hash is written.
pub fn format_hash(hash: &blake3::Hash) -> String {
    format!("blake3:full:{}", hash.to_hex())
}

/// Compute full BLAKE3 hash of entire file
pub fn compute_full_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .map_err(|e| ArchiveError::Hash(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)
            .map_err(|e| ArchiveError::Hash(format!("Failed to read {}: {}", path.display(), e)))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format_hash(&hasher.finalize()))
}

/// Verify a file matches an expected hash
pub fn verify_hash(path: &Path, expected_hash: &str) -> Result<bool> {
    Ok(compute_full_hash(path)? == expected_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_full_hash() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Hello, World!").unwrap();

        let hash = compute_full_hash(file.path()).unwrap();
        assert!(hash.starts_with("blake3:full:"));
        assert_eq!(hash, format_hash(&blake3::hash(b"Hello, World!")));
    }

    #[test]
    fn test_verify_hash_detects_change() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"original bytes").unwrap();
        let hash = compute_full_hash(file.path()).unwrap();
        assert!(verify_hash(file.path(), &hash).unwrap());

        file.write_all(b" plus more").unwrap();
        file.flush().unwrap();
        assert!(!verify_hash(file.path(), &hash).unwrap());
    }
}
