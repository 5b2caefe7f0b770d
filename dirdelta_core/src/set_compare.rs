use std::collections::BTreeSet;
use std::path::PathBuf;

/// Paths of two trees split into the three disjoint classes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPartition {
    pub only_in_original: Vec<PathBuf>,
    pub only_in_new: Vec<PathBuf>,
    pub common: Vec<PathBuf>,
}

/// Classify two path collections. Output lists are sorted.
pub fn partition_paths<'a, O, N>(original: O, new: N) -> PathPartition
where
    O: IntoIterator<Item = &'a PathBuf>,
    N: IntoIterator<Item = &'a PathBuf>,
{
    let original: BTreeSet<&PathBuf> = original.into_iter().collect();
    let new: BTreeSet<&PathBuf> = new.into_iter().collect();

    PathPartition {
        only_in_original: original.difference(&new).map(|p| (*p).clone()).collect(),
        only_in_new: new.difference(&original).map(|p| (*p).clone()).collect(),
        common: original.intersection(&new).map(|p| (*p).clone()).collect(),
    }
}
