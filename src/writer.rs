//! Frame stream writing.
//!
//! [`StreamWriter`] writes the 16-byte [`FileHeader`] once, then appends
//! frame records verbatim with no framing. It never seeks back: the header's
//! declared frame count stays whatever the caller supplied, even if fewer
//! frames follow.
//!
//! # Example
//!
//! ```no_run
//! use framestream::{FileHeader, FrameBuffer, StreamWriter, TargetGeometry};
//!
//! let geometry = TargetGeometry::resolve(150, 640, 480)?;
//! let header = FileHeader::new(geometry, 1, 30.0);
//!
//! let mut writer = StreamWriter::create("frames.data", header)?;
//! let black = FrameBuffer::from_raw(vec![0; geometry.frame_len()], 150, 112).unwrap();
//! writer.write_frame(&black)?;
//! assert_eq!(writer.finish()?, 1);
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```

use std::{
    fs::File,
    io::{BufWriter, Error as IoError, Write},
    path::{Path, PathBuf},
};

use crate::{
    error::FrameStreamError,
    frame::FrameBuffer,
    header::FileHeader,
};

/// Appends frame records to a frame stream.
#[derive(Debug)]
pub struct StreamWriter<W: Write> {
    inner: W,
    header: FileHeader,
    frame_len: usize,
    frames_written: u64,
    path: Option<PathBuf>,
}

impl StreamWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write `header` at offset 0.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::DestinationUnavailable`] if the file cannot be
    ///   created or the header cannot be written.
    /// - [`FrameStreamError::InvalidHeader`] if the header's geometry is too
    ///   large to address.
    pub fn create<P: AsRef<Path>>(path: P, header: FileHeader) -> Result<Self, FrameStreamError> {
        let path = path.as_ref();
        header.checked_frame_len()?;
        let file = File::create(path).map_err(|error| FrameStreamError::DestinationUnavailable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        log::debug!("Created frame stream: {}", path.display());
        Self::start(BufWriter::new(file), header, Some(path.to_path_buf()))
    }
}

impl<W: Write> StreamWriter<W> {
    /// Wrap an arbitrary writer and write `header` to it.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::InvalidHeader`] if the header's geometry is too
    ///   large to address.
    /// - [`FrameStreamError::IoError`] if the header cannot be written.
    pub fn new(inner: W, header: FileHeader) -> Result<Self, FrameStreamError> {
        Self::start(inner, header, None)
    }

    fn start(
        mut inner: W,
        header: FileHeader,
        path: Option<PathBuf>,
    ) -> Result<Self, FrameStreamError> {
        let frame_len = header.checked_frame_len()?;
        if let Err(error) = inner.write_all(&header.to_bytes()) {
            return Err(write_error(path.as_deref(), error));
        }
        Ok(Self {
            inner,
            header,
            frame_len,
            frames_written: 0,
            path,
        })
    }

    /// The header written at the start of the stream.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Append one frame record.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::FrameSizeMismatch`] if the frame's dimensions
    ///   disagree with the header.
    /// - [`FrameStreamError::DestinationUnavailable`] if the write fails on a
    ///   writer made by [`create`](StreamWriter::create), otherwise
    ///   [`FrameStreamError::IoError`].
    pub fn write_frame(&mut self, frame: &FrameBuffer) -> Result<(), FrameStreamError> {
        let bytes = frame.as_bytes();
        if bytes.len() != self.frame_len
            || frame.width() != self.header.render_width
            || frame.height() != self.header.render_height
        {
            return Err(FrameStreamError::FrameSizeMismatch {
                expected: self.frame_len,
                actual: bytes.len(),
            });
        }
        self.inner
            .write_all(bytes)
            .map_err(|error| write_error(self.path.as_deref(), error))?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush buffered bytes and return the number of frames written.
    ///
    /// # Errors
    ///
    /// Same mapping as [`write_frame`](Self::write_frame) if the flush fails.
    pub fn finish(mut self) -> Result<u64, FrameStreamError> {
        self.flush()?;
        Ok(self.frames_written)
    }

    /// Flush and hand back the underlying writer.
    ///
    /// # Errors
    ///
    /// Same mapping as [`write_frame`](Self::write_frame) if the flush fails.
    pub fn into_inner(mut self) -> Result<W, FrameStreamError> {
        self.flush()?;
        Ok(self.inner)
    }

    fn flush(&mut self) -> Result<(), FrameStreamError> {
        self.inner
            .flush()
            .map_err(|error| write_error(self.path.as_deref(), error))
    }
}

fn write_error(path: Option<&Path>, error: IoError) -> FrameStreamError {
    match path {
        Some(path) => FrameStreamError::DestinationUnavailable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        },
        None => FrameStreamError::IoError(error),
    }
}

/// Write a complete frame stream to `path`.
///
/// Writes `header`, then every frame from `frames` in order. Stops at the
/// first `Err` item, leaving the frames written so far on disk. Returns the
/// number of frames written, which may differ from `header.frame_count`.
///
/// # Errors
///
/// Returns the first error from creating the file, from `frames`, or from
/// writing.
pub fn write_stream<P, I>(path: P, header: FileHeader, frames: I) -> Result<u64, FrameStreamError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Result<FrameBuffer, FrameStreamError>>,
{
    let mut writer = StreamWriter::create(path, header)?;
    for frame in frames {
        writer.write_frame(&frame?)?;
    }
    writer.finish()
}
