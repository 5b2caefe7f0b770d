use crate::file_record::FileRecord;
use dirdelta_common::ComparisonError;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;

/// How the contents of a common file pair are judged equal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStrategy {
    /// Stat both files, compare sizes, then bytes
    MetadataQuick,
    /// Compare the records' SHA-256 digests
    ContentHash,
}

/// Decides whether two records of the same relative path hold the same bytes
#[derive(Debug, Clone)]
pub struct ContentComparator {
    strategy: ContentStrategy,
    blocksize: usize,
    shallow: bool,
}

impl ContentComparator {
    pub fn new(strategy: ContentStrategy, blocksize: usize) -> Self {
        Self {
            strategy,
            blocksize,
            shallow: false,
        }
    }

    /// Accept equal size and mtime as equality without reading bytes
    pub fn with_shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    /// Returns `true` when the two files have identical content
    pub fn compare(
        &self,
        original: &FileRecord,
        new: &FileRecord,
    ) -> Result<bool, ComparisonError> {
        check_pair(original, new)?;

        match self.strategy {
            ContentStrategy::MetadataQuick => self.quick_compare(original.path(), new.path()),
            ContentStrategy::ContentHash => Ok(original.digest()? == new.digest()?),
        }
    }

    fn quick_compare(&self, left: &Path, right: &Path) -> Result<bool, ComparisonError> {
        let left_meta = regular_file_metadata(left)?;
        let right_meta = regular_file_metadata(right)?;

        // Quick size check
        if left_meta.len() != right_meta.len() {
            return Ok(false);
        }

        if self.shallow {
            if let (Ok(l), Ok(r)) = (left_meta.modified(), right_meta.modified()) {
                if l == r {
                    return Ok(true);
                }
            }
        }

        self.bytes_equal(left, right)
    }

    fn bytes_equal(&self, left: &Path, right: &Path) -> Result<bool, ComparisonError> {
        let mut left_file = File::open(left).map_err(|e| ComparisonError::read(left, e))?;
        let mut right_file = File::open(right).map_err(|e| ComparisonError::read(right, e))?;

        let size = self.blocksize.max(1);
        let mut left_buf = vec![0u8; size];
        let mut right_buf = vec![0u8; size];

        loop {
            let l = fill_block(&mut left_file, &mut left_buf)
                .map_err(|e| ComparisonError::read(left, e))?;
            let r = fill_block(&mut right_file, &mut right_buf)
                .map_err(|e| ComparisonError::read(right, e))?;

            if l != r || left_buf[..l] != right_buf[..r] {
                return Ok(false);
            }
            if l == 0 {
                return Ok(true);
            }
        }
    }
}

fn check_pair(original: &FileRecord, new: &FileRecord) -> Result<(), ComparisonError> {
    if original.side() == new.side() {
        return Err(ComparisonError::Contract(format!(
            "Trying to compare two records from the {} tree: {} and {}",
            original.side(),
            original.path().display(),
            new.path().display()
        )));
    }
    if original.relative_path() != new.relative_path() {
        return Err(ComparisonError::Contract(format!(
            "Trying to compare records of different relative paths: {} and {}",
            original.relative_path().display(),
            new.relative_path().display()
        )));
    }
    Ok(())
}

fn regular_file_metadata(path: &Path) -> Result<fs::Metadata, ComparisonError> {
    let meta = fs::metadata(path).map_err(|e| ComparisonError::read(path, e))?;
    if !meta.is_file() {
        return Err(ComparisonError::read(
            path,
            std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    Ok(meta)
}

/// Read until `buf` is full or the reader is exhausted
fn fill_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
