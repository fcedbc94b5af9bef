//! Byte streams with an explicit, fallible close
//!
//! `std::io::Read`/`Write` have no way to report a failure when a resource is
//! released; dropping swallows it. The streams handed to replica reads need
//! one, so every stream here also implements [`Closeable`]. Closing an
//! already-closed stream is a no-op, never an error.
//!
//! Provided streams:
//! - [`FileInputStream`]: file-backed, exposes a [`NativeDescriptor`]
//! - [`MemoryInputStream`] / [`MemoryOutputStream`]: in-memory, no descriptor
//! - [`SocketInputStream`] / [`SocketOutputStream`]: halves of a TCP connection

mod duplex;
mod errors;
mod file;
mod memory;
mod socket;
mod util;

pub use duplex::DuplexChannel;
pub use errors::{StreamError, StreamErrorCode, StreamResult};
pub use file::FileInputStream;
pub use memory::{MemoryInputStream, MemoryOutputStream};
pub use socket::{SocketInputStream, SocketOutputStream};
pub use util::{read_fully, skip_fully, FirstError};
pub(crate) use util::{close_checked, log_swallowed};

use std::io::{self, Read, Write};

/// A resource that must be released explicitly.
pub trait Closeable {
    /// Releases the resource.
    ///
    /// Calling this on an already-closed resource returns `Ok(())`.
    fn close(&mut self) -> io::Result<()>;
}

/// A low-level handle to an open file, usable for OS calls beyond `Read`.
///
/// The descriptor is borrowed from the stream it was probed from and is only
/// valid while that stream is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeDescriptor(i32);

impl NativeDescriptor {
    /// Wraps a raw descriptor number.
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw descriptor number.
    pub fn as_raw(&self) -> i32 {
        self.0
    }

    /// Borrows the descriptor of an open file or socket.
    #[cfg(unix)]
    pub fn of<F: std::os::unix::io::AsRawFd>(file: &F) -> Self {
        Self(file.as_raw_fd())
    }
}

/// A readable byte stream owned by a replica read.
pub trait InputStream: Read + Closeable + Send {
    /// Skips up to `n` bytes, returning how many were skipped.
    ///
    /// May skip fewer than `n` bytes, including zero, without being at the
    /// end of the stream. Use [`skip_fully`] for an exact skip.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let mut limited = Read::take(&mut *self, n);
        io::copy(&mut limited, &mut io::sink())
    }

    /// Probes for the native descriptor backing this stream.
    ///
    /// `Ok(None)` means the stream is not file-backed. An error means it is,
    /// but the descriptor could not be obtained.
    fn native_descriptor(&self) -> io::Result<Option<NativeDescriptor>> {
        Ok(None)
    }

    /// Short name of the stream implementation, for logs.
    fn kind(&self) -> &'static str;
}

/// A writable byte stream owned by a transport channel.
pub trait OutputStream: Write + Closeable + Send {
    /// Short name of the stream implementation, for logs.
    fn kind(&self) -> &'static str;
}

impl<T: Closeable + ?Sized> Closeable for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<T: InputStream + ?Sized> InputStream for Box<T> {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        (**self).skip(n)
    }

    fn native_descriptor(&self) -> io::Result<Option<NativeDescriptor>> {
        (**self).native_descriptor()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

impl<T: OutputStream + ?Sized> OutputStream for Box<T> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}
