//! The byte source contract. The core decoder only ever talks to this trait;
//! it never opens files or knows about wide-character paths, that's the byte
//! source's job.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::error::{Result, ScccaError};

/// Abstract random-access byte source. Implementations may be backed by a
/// local file, an in-memory buffer, or a remote blob (the decoder does not
/// care), and issues no concurrent reads against a single instance.
pub trait ByteReader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Total size of the underlying source, in bytes.
    fn size(&mut self) -> std::result::Result<u64, Self::Error>;

    /// Move the read cursor to an absolute byte offset.
    fn seek(&mut self, offset: u64) -> std::result::Result<(), Self::Error>;

    /// Read up to `buf.len()` bytes, returning the number actually read.
    /// `0` means end-of-source.
    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, Self::Error>;

    /// Whether the source is still usable.
    fn is_open(&self) -> bool;

    /// Release any underlying resource. Idempotent.
    fn close(&mut self) -> std::result::Result<(), Self::Error>;
}

/// Seeks to `offset` and fills `buf` completely, looping over short reads.
/// Fails with [`ScccaError::ShortInput`] on premature end-of-source and with
/// [`ScccaError::ReadFailed`] if the underlying source errors.
pub(crate) fn read_exact_at<R: ByteReader>(
    reader: &mut R,
    offset: u64,
    buf: &mut [u8],
) -> Result<()> {
    reader
        .seek(offset)
        .map_err(|e| ScccaError::ReadFailed(Box::new(e)))?;

    let mut filled = 0;
    while filled < buf.len() {
        let n = reader
            .read(&mut buf[filled..])
            .map_err(|e| ScccaError::ReadFailed(Box::new(e)))?;
        if n == 0 {
            return Err(ScccaError::ShortInput {
                offset,
                needed: buf.len(),
                available: filled,
            });
        }
        filled += n;
    }
    Ok(())
}

/// [`ByteReader`] backed by an open [`std::fs::File`].
pub struct FileByteReader {
    file: Option<File>,
}

impl FileByteReader {
    pub fn new(file: File) -> Self {
        Self { file: Some(file) }
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "reader is closed"))
    }
}

impl ByteReader for FileByteReader {
    type Error = io::Error;

    fn size(&mut self) -> io::Result<u64> {
        self.file_mut()?.metadata().map(|m| m.len())
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.file_mut()?.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buf)
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.take();
        Ok(())
    }
}

/// [`ByteReader`] backed by an in-memory buffer. Used by tests and by callers
/// that already hold the file contents (e.g. carved from unallocated space).
pub struct CursorByteReader {
    cursor: Option<Cursor<Vec<u8>>>,
}

impl CursorByteReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            cursor: Some(Cursor::new(data)),
        }
    }

    fn cursor_mut(&mut self) -> io::Result<&mut Cursor<Vec<u8>>> {
        self.cursor
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "reader is closed"))
    }
}

impl ByteReader for CursorByteReader {
    type Error = io::Error;

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.cursor_mut()?.get_ref().len() as u64)
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.cursor_mut()?.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor_mut()?.read(buf)
    }

    fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    fn close(&mut self) -> io::Result<()> {
        self.cursor.take();
        Ok(())
    }
}
