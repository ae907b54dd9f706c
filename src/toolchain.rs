//! The external `ffmpeg` command-line toolchain.
//!
//! Audio extraction and container/codec conversion are delegated to an
//! `ffmpeg` executable rather than the linked libraries. [`Toolchain`]
//! locates and runs it; [`TranscodeOptions`] describes one conversion.
//!
//! # Example
//!
//! ```no_run
//! use framestream::{Toolchain, TranscodeOptions};
//!
//! let ffmpeg = Toolchain::default();
//! println!("{}", ffmpeg.probe()?);
//! ffmpeg.transcode("audio.m4a", "audio.mp3", &TranscodeOptions::mp3())?;
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use crate::error::FrameStreamError;

/// Program name looked up on `PATH` when no explicit path is given.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Parameters for one `ffmpeg` invocation.
///
/// Builds `-i <input> [-vn] [-acodec c] [-ab rate] [-vcodec c] [extra…]
/// (-y | -n) <output>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOptions {
    pub(crate) audio_codec: Option<String>,
    pub(crate) audio_bitrate: Option<String>,
    pub(crate) video_codec: Option<String>,
    pub(crate) no_video: bool,
    pub(crate) overwrite: bool,
    pub(crate) extra_args: Vec<String>,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            audio_codec: None,
            audio_bitrate: None,
            video_codec: None,
            no_video: false,
            overwrite: true,
            extra_args: Vec::new(),
        }
    }
}

impl TranscodeOptions {
    /// Let `ffmpeg` pick codecs from the output extension, overwriting the
    /// output if it exists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop video and encode audio as 192 kbit/s MP3.
    pub fn mp3() -> Self {
        Self::new()
            .no_video(true)
            .audio_codec("libmp3lame")
            .audio_bitrate("192k")
    }

    /// Audio encoder name (`-acodec`).
    #[must_use]
    pub fn audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = Some(codec.into());
        self
    }

    /// Audio bit rate (`-ab`), e.g. `"192k"`.
    #[must_use]
    pub fn audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.audio_bitrate = Some(bitrate.into());
        self
    }

    /// Video encoder name (`-vcodec`).
    #[must_use]
    pub fn video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = Some(codec.into());
        self
    }

    /// Drop video streams (`-vn`).
    #[must_use]
    pub fn no_video(mut self, no_video: bool) -> Self {
        self.no_video = no_video;
        self
    }

    /// Overwrite an existing output (`-y`) or refuse to (`-n`).
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Append raw arguments before the output path.
    #[must_use]
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The full argument list for converting `input` into `output`.
    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
        if self.no_video {
            args.push("-vn".into());
        }
        if let Some(codec) = &self.audio_codec {
            args.push("-acodec".into());
            args.push(codec.into());
        }
        if let Some(bitrate) = &self.audio_bitrate {
            args.push("-ab".into());
            args.push(bitrate.into());
        }
        if let Some(codec) = &self.video_codec {
            args.push("-vcodec".into());
            args.push(codec.into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(if self.overwrite { "-y" } else { "-n" }.into());
        args.push(output.into());
        args
    }
}

/// Handle on an `ffmpeg` executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    program: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Toolchain {
    /// Use `program`, either a bare name resolved through `PATH` or a path
    /// to the executable.
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The configured program.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check that the toolchain runs, returning the first line of its
    /// version banner.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStreamError::ToolchainUnavailable`] if an explicit
    /// path does not exist, the program cannot be spawned, or
    /// `-version` exits unsuccessfully.
    pub fn probe(&self) -> Result<String, FrameStreamError> {
        if self.is_explicit_path() && !self.program.exists() {
            return Err(self.unavailable("no such file"));
        }

        let output = self.run(&["-version".into()])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unavailable(format!(
                "`-version` exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let banner = stdout.lines().next().unwrap_or_default().trim().to_string();
        log::debug!("Toolchain {} reports: {banner}", self.program.display());
        Ok(banner)
    }

    /// Convert `input` into `output`.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::SourceUnavailable`] if `input` does not exist.
    /// - [`FrameStreamError::ToolchainUnavailable`] if the program cannot be
    ///   spawned.
    /// - [`FrameStreamError::ToolchainFailed`] if it exits unsuccessfully,
    ///   carrying its stderr.
    pub fn transcode<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        options: &TranscodeOptions,
    ) -> Result<(), FrameStreamError> {
        let input = input.as_ref();
        let output = output.as_ref();
        if !input.exists() {
            return Err(FrameStreamError::SourceUnavailable {
                path: input.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }

        log::info!(
            "Transcoding {} -> {} with {}",
            input.display(),
            output.display(),
            self.program.display()
        );
        let args = options.arguments(input, output);
        log::debug!("Toolchain arguments: {args:?}");

        let result = self.run(&args)?;
        if !result.status.success() {
            return Err(FrameStreamError::ToolchainFailed {
                program: self.program.clone(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        log::info!("Wrote {}", output.display());
        Ok(())
    }

    fn run(&self, args: &[OsString]) -> Result<Output, FrameStreamError> {
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| self.unavailable(error.to_string()))
    }

    fn is_explicit_path(&self) -> bool {
        self.program
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty())
    }

    fn unavailable(&self, reason: impl Into<String>) -> FrameStreamError {
        FrameStreamError::ToolchainUnavailable {
            program: self.program.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn mp3_preset_arguments() {
        let args = TranscodeOptions::mp3().arguments(Path::new("in.m4a"), Path::new("out.mp3"));
        assert_eq!(
            strings(args),
            [
                "-i", "in.m4a", "-vn", "-acodec", "libmp3lame", "-ab", "192k", "-y", "out.mp3"
            ]
        );
    }

    #[test]
    fn extra_arguments_precede_output() {
        let options = TranscodeOptions::new()
            .video_codec("libx264")
            .overwrite(false)
            .extra_args(["-preset", "fast"]);
        let args = options.arguments(Path::new("a.avi"), Path::new("b.mp4"));
        assert_eq!(
            strings(args),
            ["-i", "a.avi", "-vcodec", "libx264", "-preset", "fast", "-n", "b.mp4"]
        );
    }

    #[test]
    fn explicit_path_is_checked_before_spawning() {
        let toolchain = Toolchain::new("/nonexistent/bin/ffmpeg");
        assert!(matches!(
            toolchain.probe(),
            Err(FrameStreamError::ToolchainUnavailable { .. })
        ));
    }

    #[test]
    fn bare_name_is_not_an_explicit_path() {
        assert!(!Toolchain::default().is_explicit_path());
        assert!(Toolchain::new("./ffmpeg").is_explicit_path());
    }

    #[test]
    fn missing_input_is_source_unavailable() {
        let result = Toolchain::default().transcode(
            "/nonexistent/input.m4a",
            "/nonexistent/output.mp3",
            &TranscodeOptions::mp3(),
        );
        assert!(matches!(result, Err(FrameStreamError::SourceUnavailable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_reported() {
        let input = tempfile::NamedTempFile::new().unwrap();
        let toolchain = Toolchain::new("false");

        assert!(matches!(
            toolchain.probe(),
            Err(FrameStreamError::ToolchainUnavailable { .. })
        ));
        let result = toolchain.transcode(input.path(), "out.mp3", &TranscodeOptions::mp3());
        match result {
            Err(FrameStreamError::ToolchainFailed { program, status, .. }) => {
                assert_eq!(program, PathBuf::from("false"));
                assert!(!status.success());
            }
            other => panic!("expected ToolchainFailed, got {other:?}"),
        }
    }
}
