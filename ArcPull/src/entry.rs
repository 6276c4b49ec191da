//! Archive entries and single-entry extraction

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::engine::{InArchive, ItemMetadata};
use crate::error::{Error, Result};
use crate::sink::{ExtractionSink, ProgressCallback};

/// One file or folder record of an opened archive.
///
/// An entry borrows the archive it came from, so it cannot outlive it.
/// Its index and metadata are fixed when the archive enumerates it.
#[derive(Clone)]
pub struct ArchiveEntry<'a> {
    archive: &'a dyn InArchive,
    index: u32,
    meta: ItemMetadata,
    password: Option<&'a str>,
}

impl<'a> ArchiveEntry<'a> {
    pub(crate) fn new(archive: &'a dyn InArchive, index: u32, meta: ItemMetadata) -> Self {
        Self {
            archive,
            index,
            meta,
            password: None,
        }
    }

    /// Use `password` for this entry instead of the one the archive was
    /// opened with.
    #[must_use]
    pub fn with_password(mut self, password: &'a str) -> Self {
        self.password = Some(password);
        self
    }

    /// Position of this entry within the archive.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// All descriptive attributes of this entry.
    #[must_use]
    pub fn metadata(&self) -> &ItemMetadata {
        &self.meta
    }

    /// Name with its relative path inside the archive.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.meta.file_name
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.meta.is_folder
    }

    /// Uncompressed size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.meta.size
    }

    /// Compressed size in bytes.
    #[must_use]
    pub fn packed_size(&self) -> u64 {
        self.meta.packed_size
    }

    #[must_use]
    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.meta.creation_time
    }

    #[must_use]
    pub fn last_write_time(&self) -> Option<DateTime<Utc>> {
        self.meta.last_write_time
    }

    #[must_use]
    pub fn last_access_time(&self) -> Option<DateTime<Utc>> {
        self.meta.last_access_time
    }

    #[must_use]
    pub fn crc(&self) -> u32 {
        self.meta.crc
    }

    #[must_use]
    pub fn attributes(&self) -> u32 {
        self.meta.attributes
    }

    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.meta.is_encrypted
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.meta.comment
    }

    /// Compression method name as reported by the engine.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.meta.method
    }

    #[must_use]
    pub fn host_os(&self) -> Option<&str> {
        self.meta.host_os.as_deref()
    }

    /// Data of this entry starts in a previous volume.
    #[must_use]
    pub fn is_split_before(&self) -> bool {
        self.meta.is_split_before
    }

    /// Data of this entry continues in the next volume.
    #[must_use]
    pub fn is_split_after(&self) -> bool {
        self.meta.is_split_after
    }

    /// Extract this entry to a file at `path`.
    ///
    /// Folder entries only create the directory: no engine call is made and
    /// no progress is reported. For files, missing parent directories are
    /// created, the file is written and closed, and with `preserve_timestamp`
    /// its modification time is set to the entry's last-write time (entries
    /// without one keep the natural time of the write).
    ///
    /// A failed extraction can leave a truncated file behind.
    ///
    /// # Errors
    /// Returns [`Error::DirectoryCreationFailed`] or
    /// [`Error::FileCreationFailed`] when the destination cannot be prepared,
    /// and any error [`extract_to_stream`](Self::extract_to_stream) returns.
    pub fn extract_to_path<P: AsRef<Path>>(
        &self,
        path: P,
        preserve_timestamp: bool,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<()> {
        let path = path.as_ref();

        if self.meta.is_folder {
            return create_dir_all(path);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }

        tracing::debug!("Extracting {} -> {}", self.meta.file_name, path.display());

        let file = File::create(path).map_err(|source| Error::FileCreationFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.extract_to_stream(&mut writer, on_progress)?;
        writer.flush()?;
        drop(writer);

        if preserve_timestamp {
            if let Some(modified) = self.meta.last_write_time {
                set_modified_time(path, modified)?;
            }
        }

        Ok(())
    }

    /// Extract this entry into `destination`.
    ///
    /// The engine is asked for exactly this entry's index. Once it returns,
    /// progress is always brought to 100%, on failure as well as on success,
    /// unless the callback itself asked to stop.
    ///
    /// On failure that last notification only closes out the progress: its
    /// byte count covers the remaining size, not bytes that were written.
    ///
    /// # Errors
    /// Returns the engine's error if it failed, [`Error::OperationFailed`] if
    /// it reported bad data or a wrong password for this entry, and
    /// [`Error::Cancelled`] if the progress callback broke out.
    pub fn extract_to_stream(
        &self,
        destination: &mut dyn Write,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<()> {
        let mut sink =
            ExtractionSink::new(self.index, destination, on_progress).with_password(self.password);

        let extracted = self.archive.extract(&[self.index], false, &mut sink);
        let finalized = sink.finalize();

        extracted?;
        sink.check_result()?;
        finalized
    }
}

impl fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("index", &self.index)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn set_modified_time(path: &Path, modified: DateTime<Utc>) -> Result<()> {
    let file = File::options().write(true).open(path)?;
    file.set_modified(SystemTime::from(modified))?;
    Ok(())
}
