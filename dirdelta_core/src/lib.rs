pub mod digest;
pub mod file_record;
pub mod tree_index;
pub mod set_compare;
pub mod content;
pub mod hash_index;
pub mod comparison;

pub use digest::sha256_file;
pub use file_record::FileRecord;
pub use tree_index::TreeIndex;
pub use set_compare::{partition_paths, PathPartition};
pub use content::{ContentComparator, ContentStrategy};
pub use hash_index::{compare_full, groups_containing, FullHashComparison, HashGroup};
pub use comparison::{CompareOptions, ComparisonEngine, ComparisonResult};
