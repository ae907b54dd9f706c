//! Frame stream reading.
//!
//! [`FrameStreamReader`] opens a file written by the pipeline, parses its
//! header, and derives how many complete frame records are actually present
//! from the file size. The header's declared count is never trusted for
//! that: a truncated conversion leaves it larger than the data.

use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::{Path, PathBuf},
};

use crate::{
    error::FrameStreamError,
    frame::FrameBuffer,
    header::{FileHeader, HEADER_LEN},
};

/// Sequential reader over a frame stream file.
///
/// # Example
///
/// ```no_run
/// use framestream::FrameStreamReader;
///
/// let mut reader = FrameStreamReader::open("frames.data")?;
/// println!(
///     "{} of {} declared frames present",
///     reader.frames_present(),
///     reader.declared_frames()
/// );
/// if let Some(first) = reader.next_frame()? {
///     println!("top-left pixel: {:?}", first.pixel(0, 0));
/// }
/// # Ok::<(), framestream::FrameStreamError>(())
/// ```
#[derive(Debug)]
pub struct FrameStreamReader {
    inner: BufReader<File>,
    header: FileHeader,
    path: PathBuf,
    file_len: u64,
    frames_present: u64,
    trailing_bytes: u64,
    frames_read: u64,
}

impl FrameStreamReader {
    /// Open a frame stream and parse its header.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::SourceUnavailable`] if the file cannot be
    ///   opened.
    /// - [`FrameStreamError::InvalidHeader`] if the file is shorter than a
    ///   header, or the header's geometry is too large to address.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameStreamError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|error| FrameStreamError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        let file_len = file.metadata()?.len();

        let mut inner = BufReader::new(file);
        let mut header_bytes = [0u8; HEADER_LEN];
        inner.read_exact(&mut header_bytes).map_err(|error| {
            if error.kind() == ErrorKind::UnexpectedEof {
                FrameStreamError::InvalidHeader(format!(
                    "expected {HEADER_LEN} bytes, found {file_len}"
                ))
            } else {
                FrameStreamError::IoError(error)
            }
        })?;
        let header = FileHeader::from_bytes(&header_bytes)?;

        let payload = file_len - HEADER_LEN as u64;
        let frame_len = header.checked_frame_len()? as u64;
        let (frames_present, trailing_bytes) = if frame_len == 0 {
            (0, payload)
        } else {
            (payload / frame_len, payload % frame_len)
        };

        log::debug!(
            "Opened frame stream {}: {}x{}, {} declared, {} present, {} trailing bytes",
            path.display(),
            header.render_width,
            header.render_height,
            header.frame_count,
            frames_present,
            trailing_bytes,
        );

        Ok(Self {
            inner,
            header,
            path: path.to_path_buf(),
            file_len,
            frames_present,
            trailing_bytes,
            frames_read: 0,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file in bytes.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Frame count declared in the header.
    pub fn declared_frames(&self) -> u64 {
        u64::from(self.header.frame_count)
    }

    /// Complete frame records present in the file.
    pub fn frames_present(&self) -> u64 {
        self.frames_present
    }

    /// Bytes after the last complete record. Non-zero means the file was cut
    /// mid-record.
    pub fn trailing_bytes(&self) -> u64 {
        self.trailing_bytes
    }

    /// Returns `true` if fewer records are present than the header declares.
    pub fn is_truncated(&self) -> bool {
        self.frames_present < self.declared_frames()
    }

    /// Read the next complete frame record, or `None` once every complete
    /// record has been read.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStreamError::IoError`] if the read fails.
    pub fn next_frame(&mut self) -> Result<Option<FrameBuffer>, FrameStreamError> {
        if self.frames_read >= self.frames_present {
            return Ok(None);
        }
        let mut data = vec![0u8; self.header.frame_len()];
        self.inner.read_exact(&mut data)?;
        self.frames_read += 1;
        Ok(FrameBuffer::from_raw(
            data,
            self.header.render_width,
            self.header.render_height,
        ))
    }
}

impl Iterator for FrameStreamReader {
    type Item = Result<FrameBuffer, FrameStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::geometry::TargetGeometry;

    fn write_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn counts_complete_and_trailing_bytes() {
        let header = FileHeader::new(
            TargetGeometry {
                render_width: 2,
                render_height: 1,
            },
            5,
            24.0,
        );
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&[1; 6]);
        bytes.extend_from_slice(&[2; 6]);
        bytes.extend_from_slice(&[3; 4]);
        let file = write_file(&bytes);

        let mut reader = FrameStreamReader::open(file.path()).unwrap();
        assert_eq!(reader.declared_frames(), 5);
        assert_eq!(reader.frames_present(), 2);
        assert_eq!(reader.trailing_bytes(), 4);
        assert!(reader.is_truncated());

        let frames: Vec<FrameBuffer> = reader.by_ref().map(Result::unwrap).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_bytes(), &[2; 6]);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn short_file_is_invalid_header() {
        let file = write_file(&[0; 7]);
        let result = FrameStreamReader::open(file.path());
        assert!(matches!(result, Err(FrameStreamError::InvalidHeader(_))));
    }

    #[test]
    fn oversized_geometry_is_invalid_header() {
        let mut bytes = vec![0xFF; 8];
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&[1; 32]);
        let file = write_file(&bytes);
        let result = FrameStreamReader::open(file.path());
        assert!(matches!(result, Err(FrameStreamError::InvalidHeader(_))));
    }

    #[test]
    fn zero_geometry_has_no_frames() {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes.extend_from_slice(&[7; 9]);
        let file = write_file(&bytes);
        let reader = FrameStreamReader::open(file.path()).unwrap();
        assert_eq!(reader.frames_present(), 0);
        assert_eq!(reader.trailing_bytes(), 9);
    }
}
