//! Shared fixtures: zip archives on disk and a scripted engine

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use arcpull::engine::{AskMode, ExtractCallback, InArchive, ItemMetadata, OperationResult};
use arcpull::{Error, ExtractionProgress, Result};
use zip::write::SimpleFileOptions;

/// One record of a zip fixture
pub enum Fixture<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
}

/// Write a zip archive at `path` with every entry stamped `modified`.
pub fn write_zip(path: &Path, entries: &[Fixture<'_>], modified: zip::DateTime) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = || SimpleFileOptions::default().last_modified_time(modified);
    for entry in entries {
        match entry {
            Fixture::File(name, data) => {
                writer.start_file(*name, options()).unwrap();
                writer.write_all(data).unwrap();
            }
            Fixture::Dir(name) => writer.add_directory(*name, options()).unwrap(),
        }
    }
    writer.finish().unwrap();
}

/// Write a zip archive holding one ZipCrypto-encrypted file.
pub fn write_encrypted_zip(path: &Path, name: &str, data: &[u8], password: &str) {
    use zip::unstable::write::FileOptionsExt;

    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().with_deprecated_encryption(password.as_bytes());
    writer.start_file(name, options).unwrap();
    writer.write_all(data).unwrap();
    writer.finish().unwrap();
}

/// Write a zip archive holding one stored file, then flip a byte of its data
/// so only the CRC check can notice.
pub fn write_corrupted_zip(path: &Path, name: &str, data: &[u8]) {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file(name, options).unwrap();
    writer.write_all(data).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    let at = bytes
        .windows(data.len())
        .position(|window| window == data)
        .expect("stored data is written verbatim");
    bytes[at + data.len() / 2] ^= 0xFF;
    std::fs::write(path, bytes).unwrap();
}

pub fn fixture_time() -> zip::DateTime {
    zip::DateTime::from_date_and_time(2021, 6, 15, 13, 45, 30).unwrap()
}

/// Collects every progress notification as `(bytes_delivered, percent_complete)`
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<(u64, u8)>,
}

impl Recorder {
    pub fn callback(&mut self) -> impl FnMut(&ExtractionProgress) -> ControlFlow<()> + '_ {
        |p: &ExtractionProgress| {
            self.events.push((p.bytes_delivered, p.percent_complete));
            ControlFlow::Continue(())
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.events.iter().map(|e| e.0).sum()
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.events.last().map(|e| e.1)
    }
}

/// What a scripted engine does, in order, for each extracted item
#[derive(Debug, Clone)]
pub enum Step {
    /// `set_total(n)`
    Total(u64),
    /// Write the next `n` bytes of the item's data to its stream
    Write(usize),
    /// `set_completed(n)`
    Completed(u64),
    /// Ask for the stream of some other index
    AskOther(u32),
    /// Ask for this item's stream a second time
    AskAgain,
    /// `set_operation_result(result)`
    Result(OperationResult),
    /// Abort the call with an engine error
    Fail,
}

/// An engine that replays a fixed script instead of reading a container
pub struct ScriptedEngine {
    items: Vec<(ItemMetadata, Vec<u8>, Vec<Step>)>,
    /// Number of `extract` calls made
    calls: Arc<AtomicUsize>,
    /// Every stream request as `(index, handed_out)`
    requests: Arc<Mutex<Vec<(u32, bool)>>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a file whose script reports its size once, writes it all, and succeeds.
    pub fn with_file(self, name: &str, data: &[u8]) -> Self {
        let size = data.len() as u64;
        self.with_script(
            name,
            data,
            vec![
                Step::Total(size),
                Step::Write(data.len()),
                Step::Completed(size),
                Step::Result(OperationResult::Ok),
            ],
        )
    }

    pub fn with_script(mut self, name: &str, data: &[u8], steps: Vec<Step>) -> Self {
        let meta = ItemMetadata {
            file_name: name.to_string(),
            size: data.len() as u64,
            packed_size: data.len() as u64,
            method: "Stored".to_string(),
            ..ItemMetadata::default()
        };
        self.items.push((meta, data.to_vec(), steps));
        self
    }

    pub fn with_folder(mut self, name: &str) -> Self {
        let meta = ItemMetadata {
            file_name: name.to_string(),
            is_folder: true,
            ..ItemMetadata::default()
        };
        self.items.push((meta, Vec::new(), Vec::new()));
        self
    }

    /// Handle that keeps counting `extract` calls after the engine is boxed
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Handle to the stream request log
    pub fn request_log(&self) -> Arc<Mutex<Vec<(u32, bool)>>> {
        Arc::clone(&self.requests)
    }
}

impl InArchive for ScriptedEngine {
    fn item_count(&self) -> u32 {
        self.items.len() as u32
    }

    fn item_metadata(&self, index: u32) -> Result<ItemMetadata> {
        self.items
            .get(index as usize)
            .map(|(meta, _, _)| meta.clone())
            .ok_or(Error::IndexOutOfRange {
                index,
                count: self.item_count(),
            })
    }

    fn extract(
        &self,
        indices: &[u32],
        test_mode: bool,
        callback: &mut dyn ExtractCallback<'_>,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = if test_mode { AskMode::Test } else { AskMode::Extract };

        for &index in indices {
            let (_, data, steps) = &self.items[index as usize];
            let mut stream = callback.get_stream(index, mode)?;
            self.requests.lock().unwrap().push((index, stream.is_some()));
            let mut written = 0;

            for step in steps {
                match step {
                    Step::Total(n) => callback.set_total(*n)?,
                    Step::Write(n) => {
                        let end = (written + n).min(data.len());
                        if let Some(out) = stream.as_mut() {
                            out.write_all(&data[written..end])?;
                        }
                        written = end;
                    }
                    Step::Completed(n) => callback.set_completed(*n)?,
                    Step::AskOther(other) => {
                        let got = callback.get_stream(*other, mode)?;
                        self.requests.lock().unwrap().push((*other, got.is_some()));
                    }
                    Step::AskAgain => {
                        let got = callback.get_stream(index, mode)?;
                        self.requests.lock().unwrap().push((index, got.is_some()));
                    }
                    Step::Result(result) => callback.set_operation_result(index, *result)?,
                    Step::Fail => {
                        return Err(Error::InvalidArchive("scripted engine failure".to_string()));
                    }
                }
            }
        }

        Ok(())
    }
}
