//! # arcpull
//!
//! Read access to compressed archives: enumerate entries, then extract them
//! to disk or to any [`std::io::Write`], with byte-level progress and
//! timestamp preservation.
//!
//! ## Quick Start
//!
//! ### Extracting One Entry
//!
//! ```no_run
//! use std::ops::ControlFlow;
//! use arcpull::{ArchiveFile, ExtractionProgress};
//!
//! let archive = ArchiveFile::open("backup.zip")?;
//! let entry = archive.entry("docs/readme.txt")?;
//!
//! // To disk, keeping the archived modification time
//! entry.extract_to_path("out/docs/readme.txt", true, None)?;
//!
//! // To memory, with progress
//! let mut buffer = Vec::new();
//! let mut on_progress = |p: &ExtractionProgress| {
//!     println!("+{} bytes ({}%)", p.bytes_delivered, p.percent_complete);
//!     ControlFlow::Continue(())
//! };
//! entry.extract_to_stream(&mut buffer, Some(&mut on_progress))?;
//! # Ok::<(), arcpull::Error>(())
//! ```
//!
//! ### Extracting Everything
//!
//! ```no_run
//! use arcpull::prelude::*;
//!
//! let archive = ArchiveFile::open("backup.zip")?;
//! let summary = archive.extract_all("out/", &ExtractOptions::new().with_overwrite(true))?;
//! println!("{} files, {} bytes", summary.files, summary.bytes);
//! # Ok::<(), arcpull::Error>(())
//! ```
//!
//! ### Custom Engines
//!
//! Anything implementing [`engine::InArchive`] can be wrapped with
//! [`ArchiveFile::from_engine`] and extracted the same way.
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `arcpull` command-line binary

pub mod archive;
pub mod batch;
pub mod engine;
pub mod entry;
pub mod error;
pub mod options;
pub mod paths;
pub mod sink;

// Re-exports for convenience
pub use archive::{ArchiveFile, ArchiveFormat, BulkProgress, ExtractionSummary};
pub use entry::ArchiveEntry;
pub use error::{Error, Result};
pub use options::ExtractOptions;
pub use sink::{ExtractionProgress, ExtractionSink, ProgressCallback};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::archive::{ArchiveFile, ArchiveFormat, BulkProgress, ExtractionSummary};
    pub use crate::entry::ArchiveEntry;
    pub use crate::error::{Error, Result};
    pub use crate::options::ExtractOptions;
    pub use crate::sink::{ExtractionProgress, ProgressCallback};

    pub use crate::engine::{InArchive, ItemMetadata, OperationResult, ZipEngine};

    pub use crate::batch::{BatchResult, batch_extract, find_archive_files};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
