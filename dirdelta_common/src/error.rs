use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("Traversal of {} failed: {source}", root.display())]
    Traversal {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reading {} failed: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("Comparing {} and {} failed with error: {source}", original.display(), new.display())]
    FilePair {
        original: PathBuf,
        new: PathBuf,
        #[source]
        source: Box<ComparisonError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of a [`ComparisonError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Traversal,
    Read,
    Config,
    Contract,
    Serialization,
}

impl ComparisonError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Kind of the underlying failure; pair context is looked through.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Traversal { .. } => ErrorKind::Traversal,
            Self::Read { .. } => ErrorKind::Read,
            Self::Config(_) => ErrorKind::Config,
            Self::Contract(_) => ErrorKind::Contract,
            Self::FilePair { source, .. } => source.kind(),
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, ComparisonError>;
