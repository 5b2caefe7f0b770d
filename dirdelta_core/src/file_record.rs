use crate::digest::sha256_file;
use dirdelta_common::{ComparisonError, MetadataSnapshot, Sha256Digest, TreeSide};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashState {
    Unhashed,
    Hashed(Sha256Digest),
}

/// One file of a tree: where it lives, what it looked like, and its digest once computed
#[derive(Debug)]
pub struct FileRecord {
    side: TreeSide,
    path: PathBuf,
    relative_path: PathBuf,
    blocksize: usize,
    metadata: Option<MetadataSnapshot>,
    hash: Mutex<HashState>,
}

impl FileRecord {
    /// Create a record for `root/relative_path`, snapshotting its metadata.
    ///
    /// The snapshot is `None` when the path is missing or not a regular file.
    pub fn new(
        side: TreeSide,
        root: &Path,
        relative_path: PathBuf,
        blocksize: usize,
    ) -> Result<Self, ComparisonError> {
        let path = root.join(&relative_path);
        let metadata = match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Some(MetadataSnapshot::from_metadata(&meta)),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(ComparisonError::read(&path, e)),
        };

        Ok(Self {
            side,
            path,
            relative_path,
            blocksize,
            metadata,
            hash: Mutex::new(HashState::Unhashed),
        })
    }

    pub fn side(&self) -> TreeSide {
        self.side
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn metadata(&self) -> Option<&MetadataSnapshot> {
        self.metadata.as_ref()
    }

    /// Whether the backing file currently exists as a regular file
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Content digest, computed on first access and reused afterwards
    pub fn digest(&self) -> Result<Sha256Digest, ComparisonError> {
        let mut state = self.hash.lock().map_err(|e| {
            ComparisonError::Contract(format!(
                "Hash state lock poisoned for {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if let HashState::Hashed(digest) = *state {
            return Ok(digest);
        }

        let digest = sha256_file(&self.path, self.blocksize)?;
        *state = HashState::Hashed(digest);
        debug!("Hashed {:?}: {}", self.path, digest);
        Ok(digest)
    }

    /// Digest if it has already been computed
    pub fn cached_digest(&self) -> Option<Sha256Digest> {
        match *self.hash.lock().ok()? {
            HashState::Hashed(digest) => Some(digest),
            HashState::Unhashed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_snapshot() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"12345").unwrap();

        let record =
            FileRecord::new(TreeSide::Original, temp.path(), PathBuf::from("a.txt"), 64).unwrap();
        assert_eq!(record.side(), TreeSide::Original);
        assert_eq!(record.relative_path(), Path::new("a.txt"));
        assert_eq!(record.path(), temp.path().join("a.txt"));
        assert_eq!(record.metadata().map(|m| m.size), Some(5));
        assert!(record.exists());
        assert!(record.cached_digest().is_none());
    }

    #[test]
    fn test_missing_path_has_no_snapshot() {
        let temp = TempDir::new().unwrap();
        let record =
            FileRecord::new(TreeSide::New, temp.path(), PathBuf::from("gone.txt"), 64).unwrap();
        assert!(record.metadata().is_none());
        assert!(!record.exists());
    }

    #[test]
    fn test_digest_is_memoized() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, b"hello").unwrap();

        let record =
            FileRecord::new(TreeSide::New, temp.path(), PathBuf::from("a.txt"), 64).unwrap();
        let first = record.digest().unwrap();

        // Later edits are not observed by an already hashed record
        fs::write(&path, b"changed").unwrap();
        assert_eq!(record.digest().unwrap(), first);
        assert_eq!(record.cached_digest(), Some(first));
    }

    #[test]
    fn test_concurrent_first_access_agrees() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("big.bin"), vec![7u8; 512 * 1024]).unwrap();

        let record =
            FileRecord::new(TreeSide::New, temp.path(), PathBuf::from("big.bin"), 1024).unwrap();

        let digests: Vec<Sha256Digest> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| record.digest().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(digests.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(record.cached_digest(), Some(digests[0]));
    }

    #[test]
    fn test_digest_of_vanished_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, b"hello").unwrap();

        let record =
            FileRecord::new(TreeSide::New, temp.path(), PathBuf::from("a.txt"), 64).unwrap();
        fs::remove_file(&path).unwrap();

        let err = record.digest().unwrap_err();
        assert_eq!(err.kind(), dirdelta_common::ErrorKind::Read);
        assert!(record.cached_digest().is_none());
    }
}
