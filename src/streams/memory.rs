//! In-memory streams.
//!
//! Used for replicas served from memory and for transports that buffer a
//! whole response. Neither stream is file-backed, so neither exposes a
//! native descriptor. Each exposes a shared `closed` flag so the owner of the
//! bytes can observe when the stream was released.

use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{Closeable, InputStream, OutputStream};

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream closed")
}

/// A readable stream over an owned byte buffer
#[derive(Debug)]
pub struct MemoryInputStream {
    cursor: Cursor<Vec<u8>>,
    closed: Arc<AtomicBool>,
}

impl MemoryInputStream {
    /// Creates a stream positioned at the start of `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bytes left before end of stream.
    pub fn remaining(&self) -> u64 {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position())
    }

    /// Whether the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// A flag that turns `true` once the stream is closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl Read for MemoryInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(closed_error());
        }
        self.cursor.read(buf)
    }
}

impl Closeable for MemoryInputStream {
    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

impl InputStream for MemoryInputStream {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        if self.is_closed() {
            return Err(closed_error());
        }
        let skipped = n.min(self.remaining());
        self.cursor.set_position(self.cursor.position() + skipped);
        Ok(skipped)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

/// A writable stream collecting bytes in memory
#[derive(Debug, Default)]
pub struct MemoryOutputStream {
    buffer: Vec<u8>,
    closed: Arc<AtomicBool>,
}

impl MemoryOutputStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn contents(&self) -> &[u8] {
        &self.buffer
    }

    /// Whether the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// A flag that turns `true` once the stream is closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl Write for MemoryOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(closed_error());
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Closeable for MemoryOutputStream {
    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

impl OutputStream for MemoryOutputStream {
    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_is_clamped_to_remaining() {
        let mut stream = MemoryInputStream::new(vec![0u8; 10]);
        assert_eq!(stream.skip(4).unwrap(), 4);
        assert_eq!(stream.skip(100).unwrap(), 6);
        assert_eq!(stream.skip(1).unwrap(), 0);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_no_descriptor() {
        let stream = MemoryInputStream::new(Vec::new());
        assert!(stream.native_descriptor().unwrap().is_none());
    }

    #[test]
    fn test_read_after_close_fails() {
        let mut stream = MemoryInputStream::new(vec![1, 2, 3]);
        let flag = stream.closed_flag();
        stream.close().unwrap();
        stream.close().unwrap();

        assert!(flag.load(Ordering::Acquire));
        let mut buf = [0u8; 1];
        assert_eq!(
            stream.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
    }

    #[test]
    fn test_output_collects_until_closed() {
        let mut out = MemoryOutputStream::new();
        out.write_all(b"ack").unwrap();
        out.close().unwrap();

        assert_eq!(out.contents(), b"ack");
        assert!(out.write(b"x").is_err());
    }
}
