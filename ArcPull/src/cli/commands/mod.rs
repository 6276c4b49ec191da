use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::ExtractOptions;

pub mod batch;
pub mod extract;
pub mod list;

#[derive(Subcommand)]
pub enum Commands {
    /// List archive contents
    List {
        /// Archive file
        #[arg(short, long)]
        source: PathBuf,

        /// Show detailed info (sizes, ratio, modification time, flags)
        #[arg(short, long, conflicts_with = "json")]
        detailed: bool,

        /// Print entry metadata as JSON
        #[arg(long)]
        json: bool,

        /// Only list entries matching glob pattern (e.g., "*.txt")
        #[arg(long)]
        filter: Option<String>,

        /// Only show count of matching entries
        #[arg(short, long, conflicts_with = "json")]
        count: bool,

        /// Password for encrypted archives
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Extract an archive
    Extract {
        /// Source archive
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        /// Only extract entries matching glob pattern (e.g., "*.txt", "docs/*")
        #[arg(long, conflicts_with = "file")]
        filter: Option<String>,

        /// Extract a single entry by its path inside the archive
        #[arg(long, conflicts_with = "filter")]
        file: Option<String>,

        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,

        /// Leave extracted files with the time they were written
        #[arg(long)]
        no_timestamps: bool,

        /// Password for encrypted entries
        #[arg(short, long)]
        password: Option<String>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Extract every .zip under a directory in parallel
    Batch {
        /// Directory to search for archives
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory (source layout is mirrored)
        #[arg(short, long)]
        destination: PathBuf,

        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,

        /// Leave extracted files with the time they were written
        #[arg(long)]
        no_timestamps: bool,

        /// Password for encrypted entries (tried on every archive)
        #[arg(short, long)]
        password: Option<String>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::List {
                source,
                detailed,
                json,
                filter,
                count,
                password,
            } => list::execute(
                source,
                *detailed,
                *json,
                filter.as_deref(),
                *count,
                password.as_deref(),
            ),
            Commands::Extract {
                source,
                destination,
                filter,
                file,
                overwrite,
                no_timestamps,
                password,
                quiet,
            } => extract::execute(
                source,
                destination,
                filter.as_deref(),
                file.as_deref(),
                &extract_options(*overwrite, *no_timestamps, password.as_ref()),
                !*quiet,
            ),
            Commands::Batch {
                source,
                destination,
                overwrite,
                no_timestamps,
                password,
                quiet,
            } => batch::execute(
                source,
                destination,
                &extract_options(*overwrite, *no_timestamps, password.as_ref()),
                !*quiet,
            ),
        }
    }
}

fn extract_options(overwrite: bool, no_timestamps: bool, password: Option<&String>) -> ExtractOptions {
    ExtractOptions::new()
        .with_overwrite(overwrite)
        .with_preserve_timestamps(!no_timestamps)
        .with_password(password.cloned())
}

/// Open an archive, with a password when one was given
fn open_archive(source: &Path, password: Option<&str>) -> crate::Result<crate::ArchiveFile> {
    match password {
        Some(password) => crate::ArchiveFile::open_with_password(source, password),
        None => crate::ArchiveFile::open(source),
    }
}

/// Match an entry against a glob, by file name or by full path
fn matches_entry(pattern: &str, entry_name: &str) -> bool {
    let path = entry_name.trim_end_matches('/');
    let filename = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    matches_glob(pattern, filename) || matches_glob(pattern, path)
}

/// Simple glob pattern matching (supports * and ?)
fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    matches_glob_recursive(&pattern_chars, &text_chars, 0, 0)
}

fn matches_glob_recursive(pattern: &[char], text: &[char], pi: usize, ti: usize) -> bool {
    if pi == pattern.len() && ti == text.len() {
        return true;
    }
    if pi == pattern.len() {
        return false;
    }

    match pattern[pi] {
        '*' => (ti..=text.len()).any(|i| matches_glob_recursive(pattern, text, pi + 1, i)),
        '?' => ti < text.len() && matches_glob_recursive(pattern, text, pi + 1, ti + 1),
        // Literal, case-insensitive for paths
        c => {
            ti < text.len()
                && text[ti].eq_ignore_ascii_case(&c)
                && matches_glob_recursive(pattern, text, pi + 1, ti + 1)
        }
    }
}

/// Format byte size for human-readable output
fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}")
    }
}
