use crate::tree_index::TreeIndex;
use dirdelta_common::{ComparisonError, Sha256Digest, TreeSide};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Relative paths in each tree that share one digest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashGroup {
    pub original: Vec<PathBuf>,
    pub new: Vec<PathBuf>,
}

impl HashGroup {
    pub fn paths(&self, side: TreeSide) -> &[PathBuf] {
        match side {
            TreeSide::Original => &self.original,
            TreeSide::New => &self.new,
        }
    }
}

/// Outcome of comparing two whole trees by digest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullHashComparison {
    /// Recorded paths of the new tree whose content at that location is not unchanged
    pub changed_or_new: Vec<PathBuf>,
    /// Paths present in both trees with the same digest
    pub unchanged: Vec<PathBuf>,
    pub hash_groups: BTreeMap<Sha256Digest, HashGroup>,
}

/// Hash every file in both trees and derive changed/unchanged sets from digest equality.
///
/// Both indexes must have their records populated.
pub fn compare_full(
    original: &mut TreeIndex,
    new: &mut TreeIndex,
    parallel: bool,
) -> Result<FullHashComparison, ComparisonError> {
    check_sides(original, new)?;

    original.populate_hash_index(parallel)?;
    new.populate_hash_index(parallel)?;

    info!("Computing differences via sha256 hashes...");

    let by_digest_original = invert(original.hash_index());
    let by_digest_new = invert(new.hash_index());

    let digests: BTreeSet<&Sha256Digest> = by_digest_original
        .keys()
        .chain(by_digest_new.keys())
        .collect();

    let mut hash_groups = BTreeMap::new();
    let mut unchanged = BTreeSet::new();

    for digest in digests {
        let found_in_original = by_digest_original.get(digest).cloned().unwrap_or_default();
        let found_in_new = by_digest_new.get(digest).cloned().unwrap_or_default();

        // Same location and same content in both trees
        let in_original: BTreeSet<&PathBuf> = found_in_original.iter().collect();
        unchanged.extend(
            found_in_new
                .iter()
                .filter(|path| in_original.contains(path))
                .cloned(),
        );

        hash_groups.insert(
            *digest,
            HashGroup {
                original: found_in_original,
                new: found_in_new,
            },
        );
    }

    let changed_or_new: Vec<PathBuf> = new
        .records()
        .keys()
        .filter(|path| !unchanged.contains(*path))
        .cloned()
        .collect();

    debug!(
        "{} digests, {} unchanged, {} changed or new",
        hash_groups.len(),
        unchanged.len(),
        changed_or_new.len()
    );

    Ok(FullHashComparison {
        changed_or_new,
        unchanged: unchanged.into_iter().collect(),
        hash_groups,
    })
}

fn check_sides(original: &TreeIndex, new: &TreeIndex) -> Result<(), ComparisonError> {
    if original.side() != TreeSide::Original || new.side() != TreeSide::New {
        return Err(ComparisonError::Contract(format!(
            "Full hash comparison expects (original, new) trees, got ({}, {})",
            original.side(),
            new.side()
        )));
    }
    Ok(())
}

/// digest -> sorted relative paths carrying it
fn invert(index: &BTreeMap<PathBuf, Sha256Digest>) -> BTreeMap<Sha256Digest, Vec<PathBuf>> {
    let mut inverted: BTreeMap<Sha256Digest, Vec<PathBuf>> = BTreeMap::new();
    for (path, digest) in index {
        inverted.entry(*digest).or_default().push(path.clone());
    }
    inverted
}

/// Digest groups that contain the given path on the given side
pub fn groups_containing<'a>(
    groups: &'a BTreeMap<Sha256Digest, HashGroup>,
    side: TreeSide,
    path: &'a Path,
) -> impl Iterator<Item = (&'a Sha256Digest, &'a HashGroup)> + 'a {
    groups
        .iter()
        .filter(move |(_, group)| group.paths(side).iter().any(|p| p == path))
}
