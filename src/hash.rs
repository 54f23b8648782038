//! xxHash-based file hashing for duplicate detection

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::trace;
use xxhash_rust::xxh3::Xxh3;

const BUFFER_SIZE: usize = 256 * 1024;

/// Hash the whole file with xxHash3, streaming it in chunks
pub fn compute_file_hash(path: &Path) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, File::open(path)?);
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hasher.digest();
    trace!(?path, hash, "Computed file hash");
    Ok(hash)
}

/// True when both files have the same size and the same hash
pub fn same_content(a: &Path, b: &Path) -> io::Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(compute_file_hash(a)? == compute_file_hash(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_hash_matches_one_shot_hash() {
        let file = temp_with(b"test content");
        let hash = compute_file_hash(file.path()).unwrap();
        assert_eq!(hash, xxhash_rust::xxh3::xxh3_64(b"test content"));
    }

    #[test]
    fn test_same_content() {
        let a = temp_with(b"content 1");
        let b = temp_with(b"content 1");
        let c = temp_with(b"content 2");
        let d = temp_with(b"longer content");

        assert!(same_content(a.path(), b.path()).unwrap());
        assert!(!same_content(a.path(), c.path()).unwrap());
        assert!(!same_content(a.path(), d.path()).unwrap());
    }
}
