use crate::content::{ContentComparator, ContentStrategy};
use crate::file_record::FileRecord;
use crate::hash_index::{compare_full, HashGroup};
use crate::set_compare::partition_paths;
use crate::tree_index::TreeIndex;
use dirdelta_common::{
    AppConfig, ComparisonError, ComparisonMode, Sha256Digest, TreeSide, DEFAULT_BLOCKSIZE,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything that shapes one comparison run
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub mode: ComparisonMode,
    pub blocksize: usize,
    pub skip_files: BTreeSet<PathBuf>,
    pub ignore_patterns: Vec<String>,
    pub follow_symlinks: bool,
    pub shallow: bool,
    pub parallel: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            mode: ComparisonMode::Quick,
            blocksize: DEFAULT_BLOCKSIZE,
            skip_files: BTreeSet::new(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            shallow: false,
            parallel: false,
        }
    }
}

impl CompareOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mode: config.mode,
            blocksize: config.blocksize,
            skip_files: config.skip_files.iter().cloned().collect(),
            ignore_patterns: config.ignore_patterns.clone(),
            follow_symlinks: config.follow_symlinks,
            shallow: config.shallow,
            parallel: config.parallel_hashing,
        }
    }

    pub fn with_mode(mut self, mode: ComparisonMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ComparisonError> {
        if self.blocksize == 0 {
            return Err(ComparisonError::Config(
                "Blocksize must be a positive number of bytes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of one comparison run. All path lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub mode: ComparisonMode,
    pub original_root: PathBuf,
    pub new_root: PathBuf,
    pub only_in_original: Vec<PathBuf>,
    pub only_in_new: Vec<PathBuf>,
    pub common: Vec<PathBuf>,
    pub changed: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Paths left out of the changed/unchanged classification by the skip list
    pub skipped: Vec<PathBuf>,
    /// Present only in full-hash mode
    pub hash_groups: Option<BTreeMap<Sha256Digest, HashGroup>>,
}

impl ComparisonResult {
    pub fn has_differences(&self) -> bool {
        !self.only_in_original.is_empty()
            || !self.only_in_new.is_empty()
            || !self.changed.is_empty()
    }
}

/// Comparison engine for two directory trees
pub struct ComparisonEngine {
    options: CompareOptions,
}

impl ComparisonEngine {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    /// Compare `original_root` against `new_root` under the configured mode
    pub fn compare(
        &self,
        original_root: &Path,
        new_root: &Path,
    ) -> Result<ComparisonResult, ComparisonError> {
        self.options.validate()?;
        check_root(original_root)?;
        check_root(new_root)?;

        info!(
            "Comparing the contents of {} and {} ({} mode)",
            original_root.display(),
            new_root.display(),
            self.options.mode
        );

        let mut original = TreeIndex::build(original_root, TreeSide::Original, &self.options)?;
        let mut new = TreeIndex::build(new_root, TreeSide::New, &self.options)?;

        let partition = partition_paths(original.relative_paths(), new.relative_paths());
        debug!(
            "{} only in original, {} only in new, {} common",
            partition.only_in_original.len(),
            partition.only_in_new.len(),
            partition.common.len()
        );

        original.populate_records(&self.options.skip_files)?;
        new.populate_records(&self.options.skip_files)?;

        let (changed, unchanged, skipped, hash_groups) = match self.options.mode {
            ComparisonMode::Quick => {
                info!("Comparing common files byte by byte");
                let (changed, unchanged, skipped) = self.compare_common(
                    &original,
                    &new,
                    &partition.common,
                    ContentStrategy::MetadataQuick,
                )?;
                (changed, unchanged, skipped, None)
            }
            ComparisonMode::HashedCommon => {
                info!("Comparing common files by their sha256 hashes");
                let (changed, unchanged, skipped) = self.compare_common(
                    &original,
                    &new,
                    &partition.common,
                    ContentStrategy::ContentHash,
                )?;
                (changed, unchanged, skipped, None)
            }
            ComparisonMode::FullHash => {
                warn!(
                    "Checking ALL files in both directories via sha256 hashes; every byte of both trees will be read"
                );
                let full = compare_full(&mut original, &mut new, self.options.parallel)?;
                let skipped = new
                    .relative_paths()
                    .iter()
                    .filter(|path| new.record(path).is_none())
                    .cloned()
                    .collect();
                (full.changed_or_new, full.unchanged, skipped, Some(full.hash_groups))
            }
        };

        info!(
            "{} changed, {} unchanged, {} new, {} removed",
            changed.len(),
            unchanged.len(),
            partition.only_in_new.len(),
            partition.only_in_original.len()
        );

        Ok(ComparisonResult {
            mode: self.options.mode,
            original_root: original_root.to_path_buf(),
            new_root: new_root.to_path_buf(),
            only_in_original: partition.only_in_original,
            only_in_new: partition.only_in_new,
            common: partition.common,
            changed,
            unchanged,
            skipped,
            hash_groups,
        })
    }

    /// Classify each common path as changed or unchanged
    fn compare_common(
        &self,
        original: &TreeIndex,
        new: &TreeIndex,
        common: &[PathBuf],
        strategy: ContentStrategy,
    ) -> Result<(Vec<PathBuf>, Vec<PathBuf>, Vec<PathBuf>), ComparisonError> {
        let comparator = ContentComparator::new(strategy, self.options.blocksize)
            .with_shallow(self.options.shallow);

        let mut pairs = Vec::with_capacity(common.len());
        let mut skipped = Vec::new();
        for path in common {
            match (original.record(path), new.record(path)) {
                (Some(o), Some(n)) => pairs.push((path, o, n)),
                _ => skipped.push(path.clone()),
            }
        }

        let compare_pair = |(path, o, n): &(&PathBuf, &FileRecord, &FileRecord)| {
            comparator
                .compare(o, n)
                .map(|same| ((*path).clone(), same))
                .map_err(|e| ComparisonError::FilePair {
                    original: o.path().to_path_buf(),
                    new: n.path().to_path_buf(),
                    source: Box::new(e),
                })
        };

        let verdicts: Vec<(PathBuf, bool)> =
            if self.options.parallel && strategy == ContentStrategy::ContentHash {
                pairs.par_iter().map(compare_pair).collect::<Result<_, _>>()?
            } else {
                pairs.iter().map(compare_pair).collect::<Result<_, _>>()?
            };

        let mut changed = Vec::new();
        let mut unchanged = Vec::new();
        for (path, same) in verdicts {
            if same {
                unchanged.push(path);
            } else {
                changed.push(path);
            }
        }

        Ok((changed, unchanged, skipped))
    }
}

fn check_root(root: &Path) -> Result<(), ComparisonError> {
    if !root.is_dir() {
        return Err(ComparisonError::Config(format!(
            "Directory {} does not exist",
            root.display()
        )));
    }
    Ok(())
}
