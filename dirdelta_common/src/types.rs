use crate::ComparisonError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::SystemTime;

/// Default read chunk size for hashing and byte comparison
pub const DEFAULT_BLOCKSIZE: usize = 65536;

/// Which of the two compared trees an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TreeSide {
    /// The older tree (A)
    Original,
    /// The newer tree (B)
    New,
}

impl fmt::Display for TreeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeSide::Original => f.write_str("original"),
            TreeSide::New => f.write_str("new"),
        }
    }
}

/// How common files are judged equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonMode {
    /// Byte comparison of common files, with a size fast path
    #[default]
    #[serde(alias = "filecmp")]
    Quick,
    /// SHA-256 of each common pair
    #[serde(alias = "common", alias = "common_only")]
    HashedCommon,
    /// SHA-256 of every file in both trees, grouped by digest
    #[serde(alias = "sha256")]
    FullHash,
}

impl ComparisonMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMode::Quick => "quick",
            ComparisonMode::HashedCommon => "hashed-common",
            ComparisonMode::FullHash => "full-hash",
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMode {
    type Err = ComparisonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" | "filecmp" => Ok(ComparisonMode::Quick),
            "hashed-common" | "common" | "common_only" => Ok(ComparisonMode::HashedCommon),
            "full-hash" | "sha256" => Ok(ComparisonMode::FullHash),
            other => Err(ComparisonError::Config(format!(
                "Unknown comparison mode: {other}"
            ))),
        }
    }
}

/// Metadata captured when a file record is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub size: u64,
    pub modified: SystemTime,
    /// Permission bits (`st_mode & 0o7777` on Unix, 0o444/0o644 elsewhere)
    pub permissions: u32,
}

impl MetadataSnapshot {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            permissions: permission_bits(metadata),
        }
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// SHA-256 digest value (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sha256Digest(pub [u8; 32]);

impl Sha256Digest {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for Sha256Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn default_blocksize() -> usize {
    DEFAULT_BLOCKSIZE
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Read chunk size in bytes for hashing and byte comparison
    #[serde(default = "default_blocksize")]
    pub blocksize: usize,

    /// Comparison mode used when none is given on the command line
    #[serde(default)]
    pub mode: ComparisonMode,

    /// Relative paths that never get a file record
    #[serde(default)]
    pub skip_files: Vec<PathBuf>,

    /// Ignore patterns (e.g., "*.o", "node_modules/")
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether to follow symbolic links to directories
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Treat equal size and mtime as equal content in quick mode
    #[serde(default)]
    pub shallow: bool,

    /// Hash files on a rayon pool
    #[serde(default)]
    pub parallel_hashing: bool,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            blocksize: DEFAULT_BLOCKSIZE,
            mode: ComparisonMode::default(),
            skip_files: Vec::new(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            shallow: false,
            parallel_hashing: false,
            portable_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_aliases() {
        assert_eq!("quick".parse::<ComparisonMode>().unwrap(), ComparisonMode::Quick);
        assert_eq!("filecmp".parse::<ComparisonMode>().unwrap(), ComparisonMode::Quick);
        assert_eq!("common".parse::<ComparisonMode>().unwrap(), ComparisonMode::HashedCommon);
        assert_eq!(
            "hashed-common".parse::<ComparisonMode>().unwrap(),
            ComparisonMode::HashedCommon
        );
        assert_eq!("sha256".parse::<ComparisonMode>().unwrap(), ComparisonMode::FullHash);
        assert_eq!("FULL-HASH".parse::<ComparisonMode>().unwrap(), ComparisonMode::FullHash);
    }

    #[test]
    fn test_unknown_mode_is_config_error() {
        let err = "md5".parse::<ComparisonMode>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.blocksize, DEFAULT_BLOCKSIZE);
        assert_eq!(config.mode, ComparisonMode::Quick);
        assert!(config.skip_files.is_empty());
        assert!(!config.parallel_hashing);
    }

    #[test]
    fn test_config_mode_alias_in_toml() {
        let config: AppConfig = toml::from_str("mode = \"sha256\"\nblocksize = 4096\n").unwrap();
        assert_eq!(config.mode, ComparisonMode::FullHash);
        assert_eq!(config.blocksize, 4096);
    }

    #[test]
    fn test_digest_hex() {
        let digest = Sha256Digest([0xab; 32]);
        assert_eq!(digest.to_hex().len(), 64);
        assert!(digest.to_string().starts_with("abab"));
    }
}
