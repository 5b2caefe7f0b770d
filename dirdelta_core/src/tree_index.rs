use crate::comparison::CompareOptions;
use crate::file_record::FileRecord;
use dirdelta_common::{ComparisonError, Sha256Digest, TreeSide};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Listing of one directory tree, keyed by path relative to its root
pub struct TreeIndex {
    side: TreeSide,
    root: PathBuf,
    blocksize: usize,
    relative_paths: BTreeSet<PathBuf>,
    records: BTreeMap<PathBuf, FileRecord>,
    records_populated: bool,
    hash_index: BTreeMap<PathBuf, Sha256Digest>,
}

impl TreeIndex {
    /// Walk `root` and collect the relative path of every regular file under it
    pub fn build(
        root: &Path,
        side: TreeSide,
        options: &CompareOptions,
    ) -> Result<Self, ComparisonError> {
        info!("Listing files in {}", root.display());

        let root_meta = fs::metadata(root).map_err(|e| ComparisonError::Traversal {
            root: root.to_path_buf(),
            source: e,
        })?;
        if !root_meta.is_dir() {
            return Err(ComparisonError::Traversal {
                root: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
            });
        }

        let ignore = build_ignore(&options.ignore_patterns);
        let mut relative_paths = BTreeSet::new();

        let walker = WalkDir::new(root)
            .follow_links(options.follow_symlinks)
            .skip_hidden(false)
            .sort(true);

        for entry in walker {
            let mut entry = entry.map_err(|e| walk_error(root, e))?;
            if let Some(err) = entry.read_children_error.take() {
                return Err(walk_error(root, err));
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            let path = entry.path();
            if !is_regular_file(&path, file_type).map_err(|e| ComparisonError::Traversal {
                root: root.to_path_buf(),
                source: e,
            })? {
                debug!("Skipping {:?}: not a regular file", path);
                continue;
            }

            let relative_path = path
                .strip_prefix(root)
                .map_err(|e| ComparisonError::Traversal {
                    root: root.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                })?
                .to_path_buf();

            if relative_path.as_os_str().is_empty() {
                continue;
            }

            if let Some(ref ignore) = ignore {
                if ignored_with_parents(ignore, &relative_path) {
                    continue;
                }
            }

            relative_paths.insert(relative_path);
        }

        debug!("Listed {} files under {:?}", relative_paths.len(), root);

        Ok(Self {
            side,
            root: root.to_path_buf(),
            blocksize: options.blocksize,
            relative_paths,
            records: BTreeMap::new(),
            records_populated: false,
            hash_index: BTreeMap::new(),
        })
    }

    pub fn side(&self) -> TreeSide {
        self.side
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative_paths(&self) -> &BTreeSet<PathBuf> {
        &self.relative_paths
    }

    pub fn records(&self) -> &BTreeMap<PathBuf, FileRecord> {
        &self.records
    }

    pub fn record(&self, relative_path: &Path) -> Option<&FileRecord> {
        self.records.get(relative_path)
    }

    pub fn hash_index(&self) -> &BTreeMap<PathBuf, Sha256Digest> {
        &self.hash_index
    }

    pub fn len(&self) -> usize {
        self.relative_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_paths.is_empty()
    }

    /// Create a record for every listed path not in `skip`
    pub fn populate_records(&mut self, skip: &BTreeSet<PathBuf>) -> Result<usize, ComparisonError> {
        info!("Generating information of files in {}", self.root.display());

        for relative_path in &self.relative_paths {
            if skip.contains(relative_path) || self.records.contains_key(relative_path) {
                continue;
            }
            let record = FileRecord::new(
                self.side,
                &self.root,
                relative_path.clone(),
                self.blocksize,
            )?;
            self.records.insert(relative_path.clone(), record);
        }

        self.records_populated = true;
        debug!("{} records for {:?}", self.records.len(), self.root);
        Ok(self.records.len())
    }

    /// Hash every record whose file still exists and index it by relative path
    pub fn populate_hash_index(&mut self, parallel: bool) -> Result<(), ComparisonError> {
        if !self.records_populated {
            return Err(ComparisonError::Contract(format!(
                "Hash index requested for {} before its records were populated",
                self.root.display()
            )));
        }

        info!("Computing sha256 hashes for {}...", self.root.display());

        let pending: Vec<&FileRecord> = self
            .records
            .values()
            .filter(|record| !self.hash_index.contains_key(record.relative_path()))
            .filter(|record| record.exists())
            .collect();

        let hash_one = |record: &&FileRecord| {
            record
                .digest()
                .map(|digest| (record.relative_path().to_path_buf(), digest))
        };

        let hashed: Vec<(PathBuf, Sha256Digest)> = if parallel {
            pending.par_iter().map(hash_one).collect::<Result<_, _>>()?
        } else {
            pending.iter().map(hash_one).collect::<Result<_, _>>()?
        };

        self.hash_index.extend(hashed);
        debug!("Hash index for {:?} has {} entries", self.root, self.hash_index.len());
        Ok(())
    }
}

/// Regular files and links resolving to one. Dangling links stay listed.
fn is_regular_file(path: &Path, file_type: fs::FileType) -> std::io::Result<bool> {
    if file_type.is_file() {
        return Ok(true);
    }
    if !file_type.is_symlink() {
        return Ok(false);
    }
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

fn walk_error(root: &Path, err: jwalk::Error) -> ComparisonError {
    let message = err.to_string();
    ComparisonError::Traversal {
        root: root.to_path_buf(),
        source: err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, message)),
    }
}

/// Build a Gitignore from custom ignore patterns
fn build_ignore(patterns: &[String]) -> Option<Gitignore> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GitignoreBuilder::new("");
    for pattern in patterns {
        if let Err(err) = builder.add_line(None, pattern) {
            debug!("Failed to add ignore pattern '{}': {}", pattern, err);
        }
    }

    match builder.build() {
        Ok(ignore) => Some(ignore),
        Err(e) => {
            debug!("Failed to build custom ignore: {}", e);
            None
        }
    }
}

/// Check a file path and all of its parent directories against the patterns
fn ignored_with_parents(ignore: &Gitignore, path: &Path) -> bool {
    if ignore.matched(path, false).is_ignore() {
        return true;
    }

    let mut current = path;
    while let Some(parent) = current.parent() {
        if !parent.as_os_str().is_empty() && ignore.matched(parent, true).is_ignore() {
            return true;
        }
        current = parent;
    }
    false
}
