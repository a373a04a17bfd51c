//! Image source handles.
//!
//! The pipeline reads a source up to three times (bounds, orientation, pixels),
//! so a source is a re-openable handle rather than a one-shot stream. Each
//! [`ImageSource::open`] yields a fresh reader positioned at the start.

use super::backend::ImagingError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable handle to encoded image bytes, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An image file on local storage.
    Path(PathBuf),
    /// Encoded image bytes already in memory (e.g. read from a content provider).
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        ImageSource::Bytes(bytes.into())
    }

    /// Human-readable origin used in error messages and logs.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }

    /// Open a fresh buffered reader over the source.
    pub fn open(&self) -> Result<SourceReader, ImagingError> {
        match self {
            ImageSource::Path(path) => File::open(path)
                .map(|f| SourceReader::File(BufReader::new(f)))
                .map_err(|e| self.decode_error(e)),
            ImageSource::Bytes(bytes) => Ok(SourceReader::Memory(Cursor::new(Arc::clone(bytes)))),
        }
    }

    /// Encoded size of the source in bytes.
    pub fn byte_len(&self) -> Result<u64, ImagingError> {
        match self {
            ImageSource::Path(path) => std::fs::metadata(path)
                .map(|m| m.len())
                .map_err(|e| self.decode_error(e)),
            ImageSource::Bytes(bytes) => Ok(bytes.len() as u64),
        }
    }

    /// Wrap a read failure as a [`ImagingError::Decode`] naming this source.
    pub fn decode_error(&self, reason: impl std::fmt::Display) -> ImagingError {
        ImagingError::Decode {
            origin: self.describe(),
            reason: reason.to_string(),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes.into())
    }
}

/// Reader returned by [`ImageSource::open`]: buffered file or in-memory cursor.
pub enum SourceReader {
    File(BufReader<File>),
    Memory(Cursor<Arc<[u8]>>),
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SourceReader::File(r) => r.read(buf),
            SourceReader::Memory(r) => r.read(buf),
        }
    }
}

impl BufRead for SourceReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SourceReader::File(r) => r.fill_buf(),
            SourceReader::Memory(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SourceReader::File(r) => r.consume(amt),
            SourceReader::Memory(r) => r.consume(amt),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            SourceReader::File(r) => r.seek(pos),
            SourceReader::Memory(r) => r.seek(pos),
        }
    }
}
