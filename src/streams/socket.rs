//! The two halves of a TCP connection as separately closeable streams.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use super::{Closeable, InputStream, OutputStream};

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream closed")
}

/// Shuts down one direction and releases this half's handle.
///
/// A peer that already went away is not a close failure.
fn shutdown_half(socket: TcpStream, how: Shutdown) -> io::Result<()> {
    match socket.shutdown(how) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
        Err(e) => Err(e),
    }
}

/// Read half of a TCP connection
#[derive(Debug)]
pub struct SocketInputStream {
    socket: Option<TcpStream>,
    peer: Option<SocketAddr>,
}

impl SocketInputStream {
    /// Takes ownership of a handle used only for reading.
    pub fn new(socket: TcpStream) -> Self {
        let peer = socket.peer_addr().ok();
        Self {
            socket: Some(socket),
            peer,
        }
    }

    /// Remote address, if it was known when the stream was created.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl Read for SocketInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.as_mut().ok_or_else(closed_error)?.read(buf)
    }
}

impl Closeable for SocketInputStream {
    fn close(&mut self) -> io::Result<()> {
        match self.socket.take() {
            Some(socket) => shutdown_half(socket, Shutdown::Read),
            None => Ok(()),
        }
    }
}

impl InputStream for SocketInputStream {
    fn kind(&self) -> &'static str {
        "socket"
    }
}

/// Write half of a TCP connection
#[derive(Debug)]
pub struct SocketOutputStream {
    socket: Option<TcpStream>,
}

impl SocketOutputStream {
    /// Takes ownership of a handle used only for writing.
    pub fn new(socket: TcpStream) -> Self {
        Self {
            socket: Some(socket),
        }
    }
}

impl Write for SocketOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.as_mut().ok_or_else(closed_error)?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.socket.as_mut().ok_or_else(closed_error)?.flush()
    }
}

impl Closeable for SocketOutputStream {
    /// Flushes, then shuts down the write direction so the peer sees EOF.
    fn close(&mut self) -> io::Result<()> {
        let Some(mut socket) = self.socket.take() else {
            return Ok(());
        };
        let flushed = socket.flush();
        let shut = shutdown_half(socket, Shutdown::Write);
        flushed.and(shut)
    }
}

impl OutputStream for SocketOutputStream {
    fn kind(&self) -> &'static str {
        "socket"
    }
}
