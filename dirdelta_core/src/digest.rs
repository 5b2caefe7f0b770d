use dirdelta_common::{ComparisonError, Sha256Digest};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Compute the SHA-256 of a file, reading it in `blocksize` chunks
pub fn sha256_file(path: &Path, blocksize: usize) -> Result<Sha256Digest, ComparisonError> {
    let file = std::fs::File::open(path).map_err(|e| ComparisonError::read(path, e))?;
    sha256_reader(file, blocksize).map_err(|e| ComparisonError::read(path, e))
}

pub(crate) fn sha256_reader<R: Read>(
    mut reader: R,
    blocksize: usize,
) -> std::io::Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; blocksize.max(1)];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let bytes: [u8; 32] = hasher.finalize().into();
    Ok(Sha256Digest::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_known_digest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();

        let digest = sha256_file(&path, 65536).unwrap();
        assert_eq!(
            digest.to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_empty_file_digest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        fs::write(&path, b"").unwrap();

        assert_eq!(
            sha256_file(&path, 64).unwrap().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_invariant_to_blocksize() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        let content: Vec<u8> = (0..200_003u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &content).unwrap();

        let reference = sha256_file(&path, 65536).unwrap();
        for blocksize in [1, 64, 65536, 1_048_576] {
            assert_eq!(
                sha256_file(&path, blocksize).unwrap(),
                reference,
                "digest changed with blocksize {}",
                blocksize
            );
        }
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = sha256_file(&temp.path().join("nope"), 64).unwrap_err();
        assert_eq!(err.kind(), dirdelta_common::ErrorKind::Read);
    }
}
