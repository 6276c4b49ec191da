//! Batch archive extraction
//!
//! Discovers archives under a directory and extracts many of them in
//! parallel. Every archive gets its own [`ArchiveFile`], so no engine is
//! shared between threads.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::archive::ArchiveFile;
use crate::options::ExtractOptions;
use crate::paths::normalize_path;

/// Progress update for a batch run
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Archive number (1-indexed, in start order)
    pub current: usize,
    /// Total number of archives
    pub total: usize,
    /// Archive being started, relative to the source directory
    pub current_archive: String,
}

impl BatchProgress {
    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Result of a batch extraction
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Number of archives extracted
    pub success_count: usize,
    /// Number of archives that failed
    pub fail_count: usize,
    /// One message per archive processed
    pub results: Vec<String>,
}

/// Find all .zip files in a directory recursively
///
/// # Returns
/// A sorted list of paths to the archives found in the directory tree.
pub fn find_archive_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut archives: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    archives.sort();
    archives
}

/// Batch extract archives in parallel
///
/// Each archive is extracted into a folder named after it (without
/// extension), placed at the archive's position relative to `source_base`
/// under `dest_base`. One archive failing does not stop the others.
///
/// # Arguments
/// * `archives` - Archives to extract
/// * `source_base` - Base directory of the source (for calculating relative paths)
/// * `dest_base` - Destination directory for extracted files
/// * `options` - Applied to every archive
/// * `progress` - Called as each archive starts
pub fn batch_extract<F>(
    archives: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    options: &ExtractOptions,
    progress: F,
) -> BatchResult
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = archives.len();

    let results: Vec<String> = archives
        .par_iter()
        .map(|archive_path| {
            let relative_path = archive_path
                .strip_prefix(source_base)
                .unwrap_or(archive_path.as_path());
            let display_path = normalize_path(relative_path);

            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&BatchProgress {
                current,
                total,
                current_archive: display_path.clone(),
            });

            let relative_parent = relative_path.parent().unwrap_or(Path::new(""));
            let stem = archive_path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let archive_dest = dest_base.join(relative_parent).join(&stem);

            let extracted = ArchiveFile::open_inner(archive_path, options.password.clone())
                .and_then(|archive| archive.extract_all(&archive_dest, options));

            match extracted {
                Ok(summary) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    format!(
                        "Extracted: {display_path} ({} files, {} skipped)",
                        summary.files, summary.skipped
                    )
                }
                Err(e) => {
                    tracing::warn!("Failed to extract {display_path}: {e}");
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    format!("Failed {display_path}: {e}")
                }
            }
        })
        .collect();

    BatchResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    }
}
