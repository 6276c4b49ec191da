//! Archive engine capability contract
//!
//! An engine is an opened container that can describe its items and stream
//! the data of selected items into an [`ExtractCallback`]. The callback is a
//! push surface: the engine asks it for an output stream, reports how many
//! bytes it expects and has produced, and reports one outcome per item.
//!
//! The crate ships [`ZipEngine`]; any other container can be plugged in by
//! implementing [`InArchive`] and handing it to
//! [`ArchiveFile::from_engine`](crate::ArchiveFile::from_engine).

mod zip_engine;

pub use zip_engine::ZipEngine;

use std::fmt;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// Outcome the engine reports for each extracted item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Ok,
    UnsupportedMethod,
    DataError,
    CrcError,
    WrongPassword,
    Unavailable,
    UnexpectedEnd,
}

impl OperationResult {
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == OperationResult::Ok
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::UnsupportedMethod => "unsupported compression method",
            Self::DataError => "data error",
            Self::CrcError => "CRC mismatch",
            Self::WrongPassword => "missing or wrong password",
            Self::Unavailable => "data unavailable",
            Self::UnexpectedEnd => "unexpected end of data",
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine intends to do with the data of the item it asks a stream for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskMode {
    /// Decode and deliver the data
    Extract,
    /// Decode and verify the data without delivering it
    Test,
    /// Skip the item
    Skip,
}

/// Descriptive attributes of one archive item, as read from the container directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemMetadata {
    /// Name of the item with its relative path within the archive
    pub file_name: String,
    /// True if the item is a folder
    pub is_folder: bool,
    /// Uncompressed size
    pub size: u64,
    /// Size in the archived state
    pub packed_size: u64,
    pub creation_time: Option<DateTime<Utc>>,
    pub last_write_time: Option<DateTime<Utc>>,
    pub last_access_time: Option<DateTime<Utc>>,
    /// CRC32 of the uncompressed data
    pub crc: u32,
    /// Platform attribute bits (unix mode or DOS attributes, engine-defined)
    pub attributes: u32,
    pub is_encrypted: bool,
    pub comment: String,
    /// Compression method name
    pub method: String,
    pub host_os: Option<String>,
    /// Parts of this item live in a previous volume
    pub is_split_before: bool,
    /// Parts of this item live in a following volume
    pub is_split_after: bool,
}

/// Push surface an engine drives while extracting.
///
/// `'a` is the lifetime of the destination handed out by [`get_stream`]; the
/// engine may hold that writer while it keeps calling the progress methods.
///
/// [`get_stream`]: ExtractCallback::get_stream
pub trait ExtractCallback<'a> {
    /// Total number of bytes the engine expects to produce for this call.
    fn set_total(&mut self, total: u64) -> Result<()>;

    /// Bytes produced so far, cumulative across the call.
    fn set_completed(&mut self, completed: u64) -> Result<()>;

    /// Ask for the output stream of `index`.
    ///
    /// `None` tells the engine to decode the item without delivering it.
    fn get_stream(&mut self, index: u32, mode: AskMode) -> Result<Option<&'a mut dyn Write>>;

    /// Outcome for `index`, reported once its data has been processed.
    fn set_operation_result(&mut self, index: u32, result: OperationResult) -> Result<()>;

    /// Password for encrypted items, supplied for this call only.
    ///
    /// Engines prefer it over a password they were opened with.
    fn password(&self) -> Option<&str> {
        None
    }
}

/// An opened archive supporting index-based extraction.
///
/// Implementations must be safe to share between threads; concurrent
/// `extract` calls are serialized by the engine.
pub trait InArchive: Send + Sync {
    /// Number of items in the archive.
    fn item_count(&self) -> u32;

    /// Descriptive attributes of the item at `index`.
    fn item_metadata(&self, index: u32) -> Result<ItemMetadata>;

    /// Extract the items in `indices`, driving `callback`.
    ///
    /// With `test_mode` set the engine asks for streams with [`AskMode::Test`].
    fn extract(
        &self,
        indices: &[u32],
        test_mode: bool,
        callback: &mut dyn ExtractCallback<'_>,
    ) -> Result<()>;
}
