//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for various
//! failure conditions.

use framestream::{
    AudioExtractor, FrameStreamError, MediaProbe, TargetGeometry, Toolchain, TranscodeOptions,
};

#[test]
fn probe_nonexistent_file() {
    let result = MediaProbe::probe("this_file_does_not_exist.mp4");
    let error = result.expect_err("Missing file should not probe");

    let error_message = error.to_string();
    assert!(
        error_message.contains("this_file_does_not_exist.mp4"),
        "Error message should name the path: {error_message}",
    );
}

#[test]
fn geometry_error_names_dimensions() {
    let error = TargetGeometry::resolve(150, 0, 480).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Cannot determine render geometry from source dimensions 0x480"
    );
}

#[test]
fn frame_size_mismatch_message() {
    let error = FrameStreamError::FrameSizeMismatch {
        expected: 50_400,
        actual: 12,
    };
    assert_eq!(error.to_string(), "Frame buffer holds 12 bytes, expected 50400");
}

#[test]
fn io_errors_convert() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: FrameStreamError = io_error.into();
    assert!(matches!(error, FrameStreamError::IoError(_)));
    assert!(error.to_string().contains("denied"));
}

#[test]
fn missing_explicit_toolchain() {
    let error = Toolchain::new("/nonexistent/bin/ffmpeg")
        .probe()
        .expect_err("Nonexistent toolchain should not probe");
    let error_message = error.to_string();
    assert!(
        error_message.contains("/nonexistent/bin/ffmpeg"),
        "Error message should name the program: {error_message}",
    );
}

#[test]
fn transcode_missing_input() {
    let result = Toolchain::default().transcode(
        "this_file_does_not_exist.m4a",
        "out.mp3",
        &TranscodeOptions::mp3(),
    );
    assert!(matches!(
        result,
        Err(FrameStreamError::SourceUnavailable { .. })
    ));
}

#[test]
fn extract_audio_from_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = AudioExtractor::new(Toolchain::default())
        .extract(&invalid_file_path, temporary_directory.path().join("out.mp3"));
    assert!(matches!(
        result,
        Err(FrameStreamError::SourceUnavailable { .. })
    ));
}
