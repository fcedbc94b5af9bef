//! A paired input and output stream for the transport layer.

use std::io;
use std::net::TcpStream;

use super::util::close_checked;
use super::{InputStream, OutputStream, SocketInputStream, SocketOutputStream};
use crate::observability::{self, Event};

/// An owned input stream and an owned output stream released together
///
/// `close` never raises: it runs in cleanup paths where a close failure must
/// not replace the error already being handled. Both halves always get a
/// close attempt and failures are logged. Dropping the channel closes it.
#[derive(Debug)]
pub struct DuplexChannel<I = Box<dyn InputStream>, O = Box<dyn OutputStream>>
where
    I: InputStream,
    O: OutputStream,
{
    input: I,
    output: O,
    closed: bool,
}

impl DuplexChannel<SocketInputStream, SocketOutputStream> {
    /// Splits a connected socket into a read half and a write half.
    pub fn from_tcp(socket: TcpStream) -> io::Result<Self> {
        let write_half = socket.try_clone()?;
        Ok(Self::new(
            SocketInputStream::new(socket),
            SocketOutputStream::new(write_half),
        ))
    }
}

impl<I: InputStream, O: OutputStream> DuplexChannel<I, O> {
    /// Pairs two already-open streams.
    pub fn new(input: I, output: O) -> Self {
        Self {
            input,
            output,
            closed: false,
        }
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Both halves at once, e.g. to pump a request/response exchange.
    pub fn split_mut(&mut self) -> (&mut I, &mut O) {
        (&mut self.input, &mut self.output)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes the input, then the output, logging any failure.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = close_checked(&mut self.input, "input") {
            log_close_failure("input", self.input.kind(), &e.to_string());
        }
        if let Err(e) = close_checked(&mut self.output, "output") {
            log_close_failure("output", self.output.kind(), &e.to_string());
        }
    }
}

fn log_close_failure(half: &str, kind: &str, error: &str) {
    observability::log_event(
        Event::DuplexCloseFailed,
        &[("half", half), ("kind", kind), ("error", error)],
    );
}

impl<I: InputStream, O: OutputStream> Drop for DuplexChannel<I, O> {
    fn drop(&mut self) {
        self.close();
    }
}
