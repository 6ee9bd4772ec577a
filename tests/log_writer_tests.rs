// Frame log writer tests: creation, zero-frame validity, commit discipline

use depth_recorder::format::{Frame, FormatError, LogHeader, LOG_HEADER_LEN};
use depth_recorder::log_reader::FrameLogReader;
use depth_recorder::log_writer::{FrameLogWriter, WriteError};
use tempfile::TempDir;

fn test_frame(index: u32, width: u32, height: u32) -> Frame {
    let pixels = (width * height) as usize;
    Frame {
        index,
        width,
        height,
        depth: vec![1500; pixels],
        color: vec![64; pixels * 3],
    }
}

#[test]
fn test_fresh_log_is_valid_with_zero_frames() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.dclg");
    let writer = FrameLogWriter::create(&path, LogHeader::new(32, 24)).unwrap();
    drop(writer);

    // File is parseable before any frame was captured.
    let mut reader = FrameLogReader::open(&path).unwrap();
    assert_eq!(reader.header().width, 32);
    assert_eq!(reader.header().height, 24);
    assert!(reader.read_all().unwrap().is_empty());
}

#[test]
fn test_create_truncates_previous_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.dclg");

    let mut writer = FrameLogWriter::create(&path, LogHeader::new(4, 4)).unwrap();
    writer.append(&test_frame(1, 4, 4)).unwrap();
    writer.finish().unwrap();

    let writer = FrameLogWriter::create(&path, LogHeader::new(4, 4)).unwrap();
    drop(writer);
    assert_eq!(
        std::fs::metadata(&path).unwrap().len(),
        LOG_HEADER_LEN as u64
    );
}

#[test]
fn test_create_error_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_such_dir").join("session.dclg");
    let err = FrameLogWriter::create(&path, LogHeader::new(4, 4)).unwrap_err();

    assert!(matches!(err, WriteError::Create { .. }));
    assert!(err.to_string().contains("no_such_dir"));
}

#[test]
fn test_stats_count_header_and_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.dclg");
    let header = LogHeader::new(16, 8);
    let mut writer = FrameLogWriter::create(&path, header).unwrap();

    for i in 1..=3 {
        writer.append(&test_frame(i, 16, 8)).unwrap();
    }
    let stats = writer.finish().unwrap();

    let record_len = 4 + header.record_body_len() as u64;
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.bytes, LOG_HEADER_LEN as u64 + 3 * record_len);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), stats.bytes);
}

#[test]
fn test_dimension_mismatch_is_never_swallowed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.dclg");
    let mut writer = FrameLogWriter::create(&path, LogHeader::new(8, 8)).unwrap();
    writer.append(&test_frame(1, 8, 8)).unwrap();

    let err = writer.append(&test_frame(2, 8, 4)).unwrap_err();
    assert!(matches!(
        err,
        WriteError::Format(FormatError::DimensionMismatch { index: 2, .. })
    ));

    // The log still replays up to the last good record.
    let stats = writer.finish().unwrap();
    assert_eq!(stats.frames, 1);
    let mut reader = FrameLogReader::open(&path).unwrap();
    let frames = reader.read_all().unwrap();
    assert_eq!(frames.len(), 1);
    assert!(!reader.truncated());
}

#[test]
fn test_short_payload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.dclg");
    let mut writer = FrameLogWriter::create(&path, LogHeader::new(8, 8)).unwrap();

    let mut frame = test_frame(1, 8, 8);
    frame.depth.pop();
    assert!(writer.append(&frame).is_err());
    assert_eq!(writer.frames(), 0);
}

#[test]
fn test_writer_roundtrip_preserves_index_sequence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.dclg");
    let mut writer = FrameLogWriter::create(&path, LogHeader::new(4, 4)).unwrap();
    for i in 1..=10 {
        writer.append(&test_frame(i, 4, 4)).unwrap();
    }
    writer.finish().unwrap();

    let mut reader = FrameLogReader::open(&path).unwrap();
    let indices: Vec<u32> = reader
        .read_all()
        .unwrap()
        .iter()
        .map(|f| f.index)
        .collect();
    assert_eq!(indices, (1..=10).collect::<Vec<u32>>());
}
