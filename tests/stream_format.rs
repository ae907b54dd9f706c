//! Frame stream file format tests: header layout, writer, reader, and
//! validation against files on disk.

use std::fs;

use framestream::{
    FileHeader, FrameBuffer, FrameStreamError, FrameStreamReader, StreamWriter, TargetGeometry,
};

fn geometry(width: u32, height: u32) -> TargetGeometry {
    TargetGeometry {
        render_width: width,
        render_height: height,
    }
}

fn solid(value: u8, width: u32, height: u32) -> FrameBuffer {
    FrameBuffer::from_raw(vec![value; (width * height * 3) as usize], width, height)
        .expect("buffer length matches geometry")
}

#[test]
fn header_layout_is_little_endian() {
    let header = FileHeader::new(geometry(150, 112), 60, 30.0);
    let bytes = header.to_bytes();

    assert_eq!(&bytes[0..4], &[150, 0, 0, 0]);
    assert_eq!(&bytes[4..8], &[112, 0, 0, 0]);
    assert_eq!(&bytes[8..12], &[60, 0, 0, 0]);
    assert_eq!(&bytes[12..16], &30.0f32.to_le_bytes());
    assert_eq!(FileHeader::from_bytes(&bytes).unwrap(), header);
}

#[test]
fn written_file_reads_back() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("frames.data");
    let header = FileHeader::new(geometry(3, 2), 3, 24.0);

    let written = framestream::write_stream(
        &path,
        header,
        (1..=3).map(|value| Ok(solid(value, 3, 2))),
    )
    .expect("Failed to write stream");
    assert_eq!(written, 3);
    assert_eq!(fs::metadata(&path).unwrap().len(), header.stream_len(3));

    let reader = FrameStreamReader::open(&path).expect("Failed to open stream");
    assert_eq!(*reader.header(), header);
    assert!(!reader.is_truncated());

    let values: Vec<u8> = reader
        .map(|frame| frame.expect("Failed to read frame").as_bytes()[0])
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn write_stream_stops_at_first_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.data");
    let header = FileHeader::new(geometry(2, 2), 3, 24.0);

    let frames = vec![
        Ok(solid(1, 2, 2)),
        Err(FrameStreamError::VideoDecodeError("bad frame".to_string())),
        Ok(solid(3, 2, 2)),
    ];
    let result = framestream::write_stream(&path, header, frames);
    assert!(matches!(result, Err(FrameStreamError::VideoDecodeError(_))));

    let reader = FrameStreamReader::open(&path).unwrap();
    assert_eq!(reader.frames_present(), 1);
}

#[test]
fn writer_rejects_mismatched_frame() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("mismatch.data");
    let mut writer = StreamWriter::create(&path, FileHeader::new(geometry(4, 4), 1, 30.0)).unwrap();

    let result = writer.write_frame(&solid(0, 2, 2));
    assert!(matches!(
        result,
        Err(FrameStreamError::FrameSizeMismatch {
            expected: 48,
            actual: 12
        })
    ));
    assert_eq!(writer.finish().unwrap(), 0);
}

#[test]
fn missing_directory_is_destination_unavailable() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nope").join("frames.data");
    let result = StreamWriter::create(&path, FileHeader::new(geometry(1, 1), 0, 30.0));
    match result {
        Err(FrameStreamError::DestinationUnavailable { path: reported, .. }) => {
            assert_eq!(reported, path);
        }
        other => panic!("expected DestinationUnavailable, got {other:?}"),
    }
}

#[test]
fn validation_flags_truncation() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("short.data");
    let header = FileHeader::new(geometry(2, 2), 100, 30.0);
    framestream::write_stream(&path, header, (0..60).map(|_| Ok(solid(9, 2, 2)))).unwrap();

    let report = framestream::validate_stream_file(&path).unwrap();
    assert!(report.is_valid());
    assert!(
        report
            .warnings
            .iter()
            .any(|warning| warning.contains("declares 100 frames, 60 present"))
    );
}

#[test]
fn validation_flags_partial_record() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("partial.data");
    let header = FileHeader::new(geometry(2, 2), 1, 30.0);
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&[0; 12]);
    bytes.extend_from_slice(&[0; 5]);
    fs::write(&path, bytes).unwrap();

    let report = framestream::validate_stream_file(&path).unwrap();
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|error| error.contains("5 trailing bytes")));
}

#[test]
fn validation_flags_surplus_frames_and_bad_rate() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("surplus.data");
    let header = FileHeader::new(geometry(1, 1), 1, 0.0);
    framestream::write_stream(&path, header, (0..2).map(|_| Ok(solid(0, 1, 1)))).unwrap();

    let report = framestream::validate_stream_file(&path).unwrap();
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn truncated_header_is_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tiny.data");
    fs::write(&path, [1, 2, 3]).unwrap();

    assert!(matches!(
        FrameStreamReader::open(&path),
        Err(FrameStreamError::InvalidHeader(_))
    ));
    assert!(matches!(
        framestream::validate_stream_file(&path),
        Err(FrameStreamError::InvalidHeader(_))
    ));
}
