//! Opening archives and extracting them in bulk
//!
//! [`ArchiveFile`] owns an engine and hands out [`ArchiveEntry`] values that
//! borrow it. Bulk extraction walks those entries and writes each one with
//! [`ArchiveEntry::extract_to_path`].

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::{InArchive, ZipEngine};
use crate::entry::ArchiveEntry;
use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::paths::{sanitize_entry_path, zip_volume_path};
use crate::sink::ExtractionProgress;

/// Container format, as told by the leading signature bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveFormat {
    Zip,
    SevenZip,
    Rar,
    GZip,
    BZip2,
    Xz,
    Cab,
    Unknown,
}

impl ArchiveFormat {
    /// Number of leading bytes [`detect`](Self::detect) looks at
    pub const SIGNATURE_LEN: usize = 8;

    /// Identify the container format from the first bytes of a file.
    #[must_use]
    pub fn detect(header: &[u8]) -> Self {
        const SIGNATURES: &[(&[u8], ArchiveFormat)] = &[
            (b"PK\x03\x04", ArchiveFormat::Zip),
            // Empty archive: end of central directory only
            (b"PK\x05\x06", ArchiveFormat::Zip),
            // First volume of a spanned archive
            (b"PK\x07\x08", ArchiveFormat::Zip),
            (b"7z\xBC\xAF\x27\x1C", ArchiveFormat::SevenZip),
            (b"Rar!\x1A\x07", ArchiveFormat::Rar),
            (b"\xFD7zXZ\x00", ArchiveFormat::Xz),
            (b"\x1F\x8B", ArchiveFormat::GZip),
            (b"BZh", ArchiveFormat::BZip2),
            (b"MSCF", ArchiveFormat::Cab),
        ];

        SIGNATURES
            .iter()
            .find(|(magic, _)| header.starts_with(magic))
            .map_or(ArchiveFormat::Unknown, |&(_, format)| format)
    }

    /// Identify the format of a reader and rewind it.
    pub fn detect_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut header = Vec::with_capacity(Self::SIGNATURE_LEN);
        reader
            .by_ref()
            .take(Self::SIGNATURE_LEN as u64)
            .read_to_end(&mut header)?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self::detect(&header))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::SevenZip => "7z",
            Self::Rar => "rar",
            Self::GZip => "gzip",
            Self::BZip2 => "bzip2",
            Self::Xz => "xz",
            Self::Cab => "cab",
            Self::Unknown => "unknown",
        }
    }

    /// True if this crate ships an engine for the format.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self == Self::Zip
    }
}

/// Counts from a bulk extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    /// Files written
    pub files: usize,
    /// Folders created
    pub folders: usize,
    /// Entries left alone (existing files, or unmapped entries)
    pub skipped: usize,
    /// Bytes written across all files
    pub bytes: u64,
}

/// Progress of a bulk extraction
#[derive(Debug, Clone, Copy)]
pub struct BulkProgress<'e> {
    /// 1-based position of the entry being written
    pub current: usize,
    /// Number of entries that will be written
    pub total: usize,
    pub file_name: &'e str,
    /// Bytes written so far across the whole run
    pub bytes_done: u64,
    /// Bytes the whole run will write
    pub bytes_total: u64,
}

/// An opened archive.
///
/// # Example
///
/// ```no_run
/// use arcpull::{ArchiveFile, ExtractOptions};
///
/// let archive = ArchiveFile::open("backup.zip")?;
/// for entry in archive.entries()? {
///     println!("{} ({} bytes)", entry.file_name(), entry.size());
/// }
///
/// let summary = archive.extract_all("out/", &ExtractOptions::new())?;
/// println!("{} files written", summary.files);
/// # Ok::<(), arcpull::Error>(())
/// ```
pub struct ArchiveFile {
    engine: Box<dyn InArchive>,
    format: ArchiveFormat,
    path: Option<PathBuf>,
}

impl ArchiveFile {
    /// Open an archive from disk.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedFormat`] for containers without an engine
    /// and [`Error::InvalidArchive`] if the container cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_inner(path.as_ref(), None)
    }

    /// Open an archive whose entries are encrypted with `password`.
    ///
    /// # Errors
    /// Same as [`open`](Self::open). A wrong password only shows up when an
    /// encrypted entry is extracted.
    pub fn open_with_password<P: AsRef<Path>>(path: P, password: &str) -> Result<Self> {
        Self::open_inner(path.as_ref(), Some(password.to_string()))
    }

    pub(crate) fn open_inner(path: &Path, password: Option<String>) -> Result<Self> {
        let mut file = File::open(path)?;
        let format = ArchiveFormat::detect_reader(&mut file)?;

        if !format.is_supported() {
            return Err(Error::UnsupportedFormat(format!(
                "{} ({})",
                path.display(),
                format.name()
            )));
        }

        if zip_volume_path(path, 1).is_some_and(|part| part.exists()) {
            tracing::warn!(
                "{} looks like the last volume of a split archive; only its own data is readable",
                path.display()
            );
        }

        let engine = ZipEngine::new(BufReader::new(file), password)?;
        tracing::debug!("Opened {} as {}", path.display(), format.name());

        Ok(Self {
            engine: Box::new(engine),
            format,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an already opened engine.
    ///
    /// The format is reported as [`ArchiveFormat::Unknown`].
    #[must_use]
    pub fn from_engine(engine: Box<dyn InArchive>) -> Self {
        Self {
            engine,
            format: ArchiveFormat::Unknown,
            path: None,
        }
    }

    #[must_use]
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Path the archive was opened from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> u32 {
        self.engine.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn engine(&self) -> &dyn InArchive {
        self.engine.as_ref()
    }

    /// Every entry, in index order, with its metadata filled in.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry<'_>>> {
        (0..self.len()).map(|index| self.entry_at(index)).collect()
    }

    /// Entry at `index`.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] past the last entry.
    pub fn entry_at(&self, index: u32) -> Result<ArchiveEntry<'_>> {
        let count = self.len();
        if index >= count {
            return Err(Error::IndexOutOfRange { index, count });
        }
        let meta = self.engine.item_metadata(index)?;
        Ok(ArchiveEntry::new(self.engine.as_ref(), index, meta))
    }

    /// First entry whose name matches `name`. Backslashes match forward slashes.
    ///
    /// # Errors
    /// Returns [`Error::EntryNotFound`] if no entry carries that name.
    pub fn entry(&self, name: &str) -> Result<ArchiveEntry<'_>> {
        let wanted = name.replace('\\', "/");
        let wanted = wanted.trim_end_matches('/');
        self.entries()?
            .into_iter()
            .find(|e| e.file_name().replace('\\', "/").trim_end_matches('/') == wanted)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))
    }

    /// Extract every entry under `output_dir`.
    ///
    /// # Errors
    /// Stops at the first entry that fails and returns its error. Entry names
    /// that would land outside `output_dir` fail with [`Error::PathTraversal`].
    pub fn extract_all<P: AsRef<Path>>(
        &self,
        output_dir: P,
        options: &ExtractOptions,
    ) -> Result<ExtractionSummary> {
        self.extract_all_with_progress(output_dir, options, &mut |_| {})
    }

    /// [`extract_all`](Self::extract_all) with a callback fed as bytes land on disk.
    pub fn extract_all_with_progress<P: AsRef<Path>>(
        &self,
        output_dir: P,
        options: &ExtractOptions,
        progress: &mut dyn FnMut(&BulkProgress<'_>),
    ) -> Result<ExtractionSummary> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir).map_err(|source| Error::DirectoryCreationFailed {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut planned = Vec::new();
        for entry in self.entries()? {
            let relative = sanitize_entry_path(entry.file_name())?;
            planned.push((entry, output_dir.join(relative)));
        }

        self.write_entries(planned, 0, options, progress)
    }

    /// Extract the entries `mapper` gives a destination for.
    ///
    /// Entries mapped to `None` are skipped. Destination paths are used as
    /// given, without sanitizing.
    pub fn extract_with<F>(&self, mut mapper: F, options: &ExtractOptions) -> Result<ExtractionSummary>
    where
        F: FnMut(&ArchiveEntry<'_>) -> Option<PathBuf>,
    {
        let mut planned = Vec::new();
        let mut unmapped = 0;
        for entry in self.entries()? {
            match mapper(&entry) {
                Some(dest) => planned.push((entry, dest)),
                None => unmapped += 1,
            }
        }

        self.write_entries(planned, unmapped, options, &mut |_| {})
    }

    fn write_entries(
        &self,
        planned: Vec<(ArchiveEntry<'_>, PathBuf)>,
        skipped: usize,
        options: &ExtractOptions,
        progress: &mut dyn FnMut(&BulkProgress<'_>),
    ) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary {
            skipped,
            ..ExtractionSummary::default()
        };
        let total = planned.len();
        let bytes_total: u64 = planned
            .iter()
            .filter(|(e, _)| !e.is_folder())
            .map(|(e, _)| e.size())
            .sum();

        for (i, (entry, dest)) in planned.into_iter().enumerate() {
            let entry = match options.password.as_deref() {
                Some(password) => entry.with_password(password),
                None => entry,
            };

            if entry.is_folder() {
                entry.extract_to_path(&dest, false, None)?;
                summary.folders += 1;
                continue;
            }

            if dest.exists() && !options.overwrite {
                tracing::warn!("Skipping {}: {} already exists", entry.file_name(), dest.display());
                summary.skipped += 1;
                continue;
            }

            let mut bytes_done = summary.bytes;
            let mut on_tick = |tick: &ExtractionProgress| {
                bytes_done += tick.bytes_delivered;
                progress(&BulkProgress {
                    current: i + 1,
                    total,
                    file_name: entry.file_name(),
                    bytes_done,
                    bytes_total,
                });
                ControlFlow::Continue(())
            };
            entry.extract_to_path(&dest, options.preserve_timestamps, Some(&mut on_tick))?;

            summary.files += 1;
            summary.bytes = bytes_done;
        }

        tracing::debug!(
            "Extracted {} files, {} folders, skipped {}",
            summary.files,
            summary.folders,
            summary.skipped
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for ArchiveFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFile")
            .field("format", &self.format)
            .field("path", &self.path)
            .field("items", &self.len())
            .finish_non_exhaustive()
    }
}
