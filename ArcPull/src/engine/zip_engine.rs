//! `InArchive` engine backed by the `zip` crate

use std::io::{self, Read, Seek, Write};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use zip::ZipArchive;
use zip::result::ZipError;

use super::{AskMode, ExtractCallback, InArchive, ItemMetadata, OperationResult};
use crate::error::{Error, Result};

/// Size of the buffer items are streamed through; one progress tick per chunk
const CHUNK_SIZE: usize = 64 * 1024;

/// Zip container engine.
///
/// Item metadata is read once when the engine is created. Extraction goes
/// through a mutex, so one engine can be shared by every entry of an archive.
pub struct ZipEngine<R> {
    archive: Mutex<ZipArchive<R>>,
    items: Vec<ItemMetadata>,
    password: Option<String>,
}

impl<R: Read + Seek> ZipEngine<R> {
    /// Open a zip container from a reader.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArchive`] if the central directory cannot be read.
    pub fn new(reader: R, password: Option<String>) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut items = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            // Raw access: no decryption needed to describe encrypted items
            let file = archive.by_index_raw(i)?;
            items.push(ItemMetadata {
                file_name: file.name().to_string(),
                is_folder: file.is_dir(),
                size: file.size(),
                packed_size: file.compressed_size(),
                creation_time: None,
                last_write_time: file.last_modified().and_then(|dt| {
                    dos_time_to_utc(
                        dt.year(),
                        dt.month(),
                        dt.day(),
                        dt.hour(),
                        dt.minute(),
                        dt.second(),
                    )
                }),
                last_access_time: None,
                crc: file.crc32(),
                attributes: file.unix_mode().unwrap_or(0),
                is_encrypted: file.encrypted(),
                comment: file.comment().to_string(),
                method: format!("{:?}", file.compression()),
                host_os: None,
                is_split_before: false,
                is_split_after: false,
            });
        }

        tracing::debug!("Opened zip archive with {} items", items.len());

        Ok(Self {
            archive: Mutex::new(archive),
            items,
            password,
        })
    }

    fn item(&self, index: u32) -> Result<&ItemMetadata> {
        self.items
            .get(index as usize)
            .ok_or(Error::IndexOutOfRange {
                index,
                count: self.count(),
            })
    }
}

impl<R> ZipEngine<R> {
    fn count(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }
}

impl<R: Read + Seek + Send> InArchive for ZipEngine<R> {
    fn item_count(&self) -> u32 {
        self.count()
    }

    fn item_metadata(&self, index: u32) -> Result<ItemMetadata> {
        self.item(index).cloned()
    }

    fn extract(
        &self,
        indices: &[u32],
        test_mode: bool,
        callback: &mut dyn ExtractCallback<'_>,
    ) -> Result<()> {
        let mut total = 0u64;
        for &index in indices {
            total += self.item(index)?.size;
        }

        let mut archive = self
            .archive
            .lock()
            .map_err(|_| Error::InvalidArchive("zip engine lock poisoned".to_string()))?;

        callback.set_total(total)?;

        let password = callback
            .password()
            .map(str::to_owned)
            .or_else(|| self.password.clone());
        let mode = if test_mode { AskMode::Test } else { AskMode::Extract };
        let mut completed = 0u64;

        for &index in indices {
            let item = self.item(index)?;
            let stream = callback.get_stream(index, mode)?;
            let result = stream_item(
                &mut archive,
                index,
                item,
                password.as_deref(),
                stream,
                &mut completed,
                callback,
            )?;
            if !result.is_ok() {
                tracing::debug!("Zip item {} ({}): {}", index, item.file_name, result);
            }
            callback.set_operation_result(index, result)?;
        }

        Ok(())
    }
}

/// Stream one item's data into `out`, ticking `callback` after each chunk.
///
/// Data problems become an [`OperationResult`]; write and callback failures
/// are returned as errors.
fn stream_item<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: u32,
    item: &ItemMetadata,
    password: Option<&str>,
    mut out: Option<&mut dyn Write>,
    completed: &mut u64,
    callback: &mut dyn ExtractCallback<'_>,
) -> Result<OperationResult> {
    if item.is_folder {
        return Ok(OperationResult::Ok);
    }

    let opened = match (item.is_encrypted, password) {
        (true, None) => return Ok(OperationResult::WrongPassword),
        (true, Some(password)) => archive.by_index_decrypt(index as usize, password.as_bytes()),
        (false, _) => archive.by_index(index as usize),
    };

    let mut file = match opened {
        Ok(file) => file,
        Err(ZipError::Io(e)) => return Err(Error::Io(e)),
        Err(e) => return Ok(result_for_open_error(&e)),
    };

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Ok(result_for_read_error(&e)),
        };

        if let Some(out) = out.as_mut() {
            out.write_all(&buffer[..read])?;
        }

        *completed += read as u64;
        callback.set_completed(*completed)?;
    }

    if let Some(out) = out.as_mut() {
        out.flush()?;
    }

    Ok(OperationResult::Ok)
}

fn result_for_open_error(err: &ZipError) -> OperationResult {
    match err {
        ZipError::InvalidPassword => OperationResult::WrongPassword,
        ZipError::UnsupportedArchive(_) => OperationResult::UnsupportedMethod,
        ZipError::FileNotFound => OperationResult::Unavailable,
        _ => OperationResult::DataError,
    }
}

fn result_for_read_error(err: &io::Error) -> OperationResult {
    if err.to_string().to_lowercase().contains("checksum") {
        OperationResult::CrcError
    } else if err.kind() == io::ErrorKind::UnexpectedEof {
        OperationResult::UnexpectedEnd
    } else {
        OperationResult::DataError
    }
}

/// Zip stores local DOS time without a zone; it is taken as UTC.
fn dos_time_to_utc(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))?
        .and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second))
        .map(|naive| naive.and_utc())
}
