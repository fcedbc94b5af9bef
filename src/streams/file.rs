//! File-backed input stream.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{Closeable, InputStream, NativeDescriptor};

/// A readable stream over a block or checksum file on a volume
///
/// Exposes the file's [`NativeDescriptor`] while open. Closing reports the
/// result of the underlying `close(2)` instead of discarding it.
#[derive(Debug)]
pub struct FileInputStream {
    file: Option<File>,
    path: PathBuf,
}

impl FileInputStream {
    /// Opens `path` for reading from the start.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::from_file(file, path))
    }

    /// Opens `path` positioned at `offset`.
    pub fn open_at(path: impl AsRef<Path>, offset: u64) -> io::Result<Self> {
        let mut stream = Self::open(path)?;
        stream.file_mut()?.seek(SeekFrom::Start(offset))?;
        Ok(stream)
    }

    /// Wraps an already-open file.
    pub fn from_file(file: File, path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file),
            path: path.into(),
        }
    }

    /// Path the stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(closed_error)
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream closed")
}

impl Read for FileInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buf)
    }
}

impl Closeable for FileInputStream {
    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => close_file(file),
            None => Ok(()),
        }
    }
}

impl InputStream for FileInputStream {
    /// Seeks forward, never past the current end of file.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let file = self.file_mut()?;
        let len = file.metadata()?.len();
        let position = file.stream_position()?;
        let skipped = n.min(len.saturating_sub(position));
        if skipped > 0 {
            file.seek(SeekFrom::Start(position + skipped))?;
        }
        Ok(skipped)
    }

    fn native_descriptor(&self) -> io::Result<Option<NativeDescriptor>> {
        let file = self.file.as_ref().ok_or_else(closed_error)?;
        #[cfg(unix)]
        {
            Ok(Some(NativeDescriptor::of(file)))
        }
        #[cfg(not(unix))]
        {
            let _ = file;
            Ok(None)
        }
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

#[cfg(unix)]
fn close_file(file: File) -> io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: `fd` came from `into_raw_fd`, so this is its only owner and it
    // is closed exactly once.
    let rc = unsafe { libc::close(fd) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn close_file(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn block_file(dir: &TempDir, len: usize) -> PathBuf {
        let path = dir.path().join("blk_1001");
        fs::write(&path, (0..len).map(|i| i as u8).collect::<Vec<_>>()).unwrap();
        path
    }

    #[test]
    fn test_open_at_offset() {
        let dir = TempDir::new().unwrap();
        let mut stream = FileInputStream::open_at(block_file(&dir, 32), 30).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![30, 31]);
    }

    #[test]
    fn test_skip_stops_at_end_of_file() {
        let dir = TempDir::new().unwrap();
        let mut stream = FileInputStream::open(block_file(&dir, 10)).unwrap();
        assert_eq!(stream.skip(7).unwrap(), 7);
        assert_eq!(stream.skip(7).unwrap(), 3);
        assert_eq!(stream.skip(7).unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_descriptor_while_open() {
        let dir = TempDir::new().unwrap();
        let mut stream = FileInputStream::open(block_file(&dir, 4)).unwrap();
        let fd = stream.native_descriptor().unwrap().unwrap();
        assert!(fd.as_raw() >= 0);

        stream.close().unwrap();
        assert!(stream.native_descriptor().is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut stream = FileInputStream::open(block_file(&dir, 4)).unwrap();
        stream.close().unwrap();
        stream.close().unwrap();
        assert!(stream.is_closed());

        let mut buf = [0u8; 1];
        assert!(stream.read(&mut buf).is_err());
    }
}
