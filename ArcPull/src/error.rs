//! Error types for `arcpull`

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::OperationResult;

/// The error type for `arcpull` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file or stream operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A destination directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A destination file could not be opened for writing.
    #[error("failed to open {path} for writing: {source}")]
    FileCreationFailed {
        /// The file that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    // ==================== Archive Errors ====================
    /// The container format was recognized but no engine handles it.
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    /// The archive could not be opened or its directory could not be read.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An index outside the archive was requested.
    #[error("index {index} out of range (archive holds {count} items)")]
    IndexOutOfRange {
        /// The requested index.
        index: u32,
        /// Number of items in the archive.
        count: u32,
    },

    /// No entry carries the requested name.
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    /// An entry name would resolve outside the output directory.
    #[error("entry '{0}' escapes the output directory")]
    PathTraversal(String),

    // ==================== Extraction Errors ====================
    /// The engine reported a non-success outcome for an entry.
    #[error("extraction of item {index} failed: {result}")]
    OperationFailed {
        /// The item the engine reported on.
        index: u32,
        /// The reported outcome.
        result: OperationResult,
    },

    /// The progress callback asked to stop the extraction.
    #[error("extraction of item {index} cancelled")]
    Cancelled {
        /// The item being extracted when the callback asked to stop.
        index: u32,
    },
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            other => Error::InvalidArchive(other.to_string()),
        }
    }
}

/// A specialized Result type for `arcpull` operations.
pub type Result<T> = std::result::Result<T, Error>;
