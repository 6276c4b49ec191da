//! Extraction against engines that misbehave in controlled ways

mod common;

use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::atomic::Ordering;

use arcpull::engine::OperationResult;
use arcpull::{ArchiveFile, Error, ExtractionProgress};
use common::{Recorder, ScriptedEngine, Step};
use pretty_assertions::assert_eq;

fn archive_with(steps: Vec<Step>, data: &[u8]) -> ArchiveFile {
    ArchiveFile::from_engine(Box::new(
        ScriptedEngine::new().with_script("item.bin", data, steps),
    ))
}

#[test]
fn test_out_of_order_ticks_never_go_negative() {
    let archive = archive_with(
        vec![
            Step::Total(100),
            Step::Write(100),
            Step::Completed(60),
            Step::Completed(30),
            Step::Completed(60),
            Step::Completed(100),
            Step::Result(OperationResult::Ok),
        ],
        &[1u8; 100],
    );
    let entry = archive.entry_at(0).unwrap();

    let mut out = Vec::new();
    let mut recorder = Recorder::default();
    entry
        .extract_to_stream(&mut out, Some(&mut recorder.callback()))
        .unwrap();

    assert_eq!(recorder.events, vec![(60, 60), (40, 100)]);
    assert_eq!(recorder.total_bytes(), out.len() as u64);
}

#[test]
fn test_undercounting_engine_is_finalized() {
    let archive = archive_with(
        vec![
            Step::Total(100),
            Step::Write(100),
            Step::Completed(40),
            Step::Result(OperationResult::Ok),
        ],
        &[2u8; 100],
    );
    let entry = archive.entry_at(0).unwrap();

    let mut out = Vec::new();
    let mut recorder = Recorder::default();
    entry
        .extract_to_stream(&mut out, Some(&mut recorder.callback()))
        .unwrap();

    assert_eq!(recorder.events, vec![(40, 40), (60, 100)]);
    assert_eq!(recorder.total_bytes(), out.len() as u64);
}

#[test]
fn test_overreporting_engine_is_clamped() {
    let archive = archive_with(
        vec![
            Step::Total(10),
            Step::Write(10),
            Step::Completed(25),
            Step::Result(OperationResult::Ok),
        ],
        &[3u8; 10],
    );
    let entry = archive.entry_at(0).unwrap();

    let mut out = Vec::new();
    let mut recorder = Recorder::default();
    entry
        .extract_to_stream(&mut out, Some(&mut recorder.callback()))
        .unwrap();

    assert_eq!(recorder.events, vec![(25, 100)]);
    assert_eq!(out.len(), 10);
}

#[test]
fn test_silent_engine_still_reports_completion() {
    let archive = archive_with(
        vec![Step::Write(4), Step::Result(OperationResult::Ok)],
        b"data",
    );
    let entry = archive.entry_at(0).unwrap();

    let mut out = Vec::new();
    let mut recorder = Recorder::default();
    entry
        .extract_to_stream(&mut out, Some(&mut recorder.callback()))
        .unwrap();

    assert_eq!(out, b"data");
    assert_eq!(recorder.events, vec![(0, 100)]);
}

#[test]
fn test_failed_result_is_an_error_after_finalizing() {
    let archive = archive_with(
        vec![
            Step::Total(8),
            Step::Write(8),
            Step::Completed(8),
            Step::Result(OperationResult::CrcError),
        ],
        &[4u8; 8],
    );
    let entry = archive.entry_at(0).unwrap();

    let mut out = Vec::new();
    let mut recorder = Recorder::default();
    let err = entry
        .extract_to_stream(&mut out, Some(&mut recorder.callback()))
        .unwrap_err();

    match err {
        Error::OperationFailed { index, result } => {
            assert_eq!(index, 0);
            assert_eq!(result, OperationResult::CrcError);
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
    assert_eq!(recorder.last_percent(), Some(100));
}

#[test]
fn test_wrong_password_reaches_caller() {
    let archive = archive_with(
        vec![Step::Total(3), Step::Result(OperationResult::WrongPassword)],
        b"abc",
    );
    let entry = archive.entry_at(0).unwrap();

    let err = entry.extract_to_stream(&mut Vec::new(), None).unwrap_err();
    assert!(matches!(
        err,
        Error::OperationFailed {
            result: OperationResult::WrongPassword,
            ..
        }
    ));
}

#[test]
fn test_engine_error_wins_and_still_finalizes() {
    let archive = archive_with(
        vec![
            Step::Total(10),
            Step::Write(5),
            Step::Completed(5),
            Step::Result(OperationResult::DataError),
            Step::Fail,
        ],
        &[5u8; 10],
    );
    let entry = archive.entry_at(0).unwrap();

    let mut out = Vec::new();
    let mut recorder = Recorder::default();
    let err = entry
        .extract_to_stream(&mut out, Some(&mut recorder.callback()))
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArchive(_)));
    assert_eq!(recorder.events, vec![(5, 50), (5, 100)]);
}

#[test]
fn test_mismatched_and_repeated_stream_requests_are_refused() {
    let engine = ScriptedEngine::new().with_script(
        "item.bin",
        b"payload",
        vec![
            Step::AskOther(5),
            Step::AskAgain,
            Step::Write(7),
            Step::Result(OperationResult::Ok),
        ],
    );
    let requests = engine.request_log();
    let archive = ArchiveFile::from_engine(Box::new(engine));
    let entry = archive.entry_at(0).unwrap();

    let mut out = Vec::new();
    entry.extract_to_stream(&mut out, None).unwrap();

    assert_eq!(out, b"payload");
    assert_eq!(*requests.lock().unwrap(), vec![(0, true), (5, false), (0, false)]);
}

#[test]
fn test_callback_break_cancels_without_final_event() {
    let archive = archive_with(
        vec![
            Step::Total(100),
            Step::Write(50),
            Step::Completed(50),
            Step::Write(50),
            Step::Completed(100),
            Step::Result(OperationResult::Ok),
        ],
        &[6u8; 100],
    );
    let entry = archive.entry_at(0).unwrap();

    let mut calls = 0;
    let mut stop_early = |_: &ExtractionProgress| {
        calls += 1;
        ControlFlow::Break(())
    };
    let mut out = Vec::new();
    let err = entry
        .extract_to_stream(&mut out, Some(&mut stop_early))
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { index: 0 }));
    assert_eq!(calls, 1);
    assert_eq!(out.len(), 50);
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_destination_write_failure_propagates() {
    let archive = archive_with(
        vec![Step::Total(4), Step::Write(4), Step::Result(OperationResult::Ok)],
        b"data",
    );
    let entry = archive.entry_at(0).unwrap();

    let err = entry.extract_to_stream(&mut FailingWriter, None).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_each_extraction_asks_only_for_its_own_index() {
    let engine = ScriptedEngine::new()
        .with_file("a.txt", b"aaa")
        .with_file("b.txt", b"bbbb");
    let requests = engine.request_log();
    let calls = engine.call_counter();
    let archive = ArchiveFile::from_engine(Box::new(engine));

    let mut out = Vec::new();
    for entry in archive.entries().unwrap() {
        entry.extract_to_stream(&mut out, None).unwrap();
    }

    assert_eq!(out, b"aaabbbb");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*requests.lock().unwrap(), vec![(0, true), (1, true)]);
}
