//! Audio extraction and transcoding tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and an `ffmpeg` executable on `PATH`; they return early otherwise.

use std::path::Path;

use framestream::{
    AudioExtractor, AudioFormat, FrameStreamError, MediaProbe, Toolchain, TranscodeOptions,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_video_only_path() -> &'static str {
    "tests/fixtures/sample_video_only.mp4"
}

fn sample_audio_only_path() -> &'static str {
    "tests/fixtures/sample_audio_only.m4a"
}

fn toolchain_available() -> bool {
    Toolchain::default().probe().is_ok()
}

#[test]
fn extract_mp3_from_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() || !toolchain_available() {
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("audio.mp3");
    AudioExtractor::new(Toolchain::default())
        .extract(path, &output)
        .expect("Failed to extract audio");

    let metadata = MediaProbe::probe(&output).expect("Failed to probe extracted audio");
    assert!(metadata.video.is_none());
    let audio = metadata.audio.expect("Extracted file has audio");
    assert!(audio.codec.starts_with("mp3"), "unexpected codec {}", audio.codec);
}

#[test]
fn extract_lossless_wav() {
    let path = sample_video_path();
    if !Path::new(path).exists() || !toolchain_available() {
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("audio.wav");
    AudioExtractor::new(Toolchain::default())
        .with_format(AudioFormat::Wav)
        .extract(path, &output)
        .expect("Failed to extract audio");

    let audio = MediaProbe::probe(&output).unwrap().audio.unwrap();
    assert_eq!(audio.codec, "pcm_s16le");
}

#[test]
fn video_without_audio_is_rejected_before_running_toolchain() {
    let path = sample_video_only_path();
    if !Path::new(path).exists() {
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("audio.mp3");
    // A toolchain that cannot exist: the audio check must fail first.
    let extractor = AudioExtractor::new(Toolchain::new("/nonexistent/ffmpeg"));
    let result = extractor.extract(path, &output);
    assert!(matches!(result, Err(FrameStreamError::NoAudioStream)));
    assert!(!output.exists());
}

#[test]
fn unavailable_toolchain_is_reported() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let result = AudioExtractor::new(Toolchain::new("/nonexistent/ffmpeg"))
        .extract(path, dir.path().join("audio.mp3"));
    assert!(matches!(
        result,
        Err(FrameStreamError::ToolchainUnavailable { .. })
    ));
}

#[test]
fn transcode_m4a_to_mp3() {
    let path = sample_audio_only_path();
    if !Path::new(path).exists() || !toolchain_available() {
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("audio.mp3");
    Toolchain::default()
        .transcode(path, &output, &TranscodeOptions::mp3())
        .expect("Failed to transcode");

    let audio = MediaProbe::probe(&output).unwrap().audio.unwrap();
    assert!(audio.codec.starts_with("mp3"), "unexpected codec {}", audio.codec);
}

#[test]
fn transcode_failure_carries_stderr() {
    if !toolchain_available() {
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("not_media.m4a");
    std::fs::write(&input, b"this is not a media file").unwrap();

    let result = Toolchain::default().transcode(
        &input,
        dir.path().join("out.mp3"),
        &TranscodeOptions::mp3(),
    );
    match result {
        Err(FrameStreamError::ToolchainFailed { status, stderr, .. }) => {
            assert!(!status.success());
            assert!(!stderr.is_empty());
        }
        other => panic!("expected ToolchainFailed, got {other:?}"),
    }
}
