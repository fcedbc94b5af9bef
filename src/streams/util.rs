//! Exact read/skip helpers and the two close disciplines
//!
//! - [`read_fully`] / [`skip_fully`]: exactly `n` bytes or an EOF error
//! - [`log_swallowed`]: log a release failure instead of raising it
//! - [`FirstError`]: run every close step, surface only the first failure

use std::io::{self, Read};

use super::errors::{StreamError, StreamResult};
use super::{Closeable, InputStream};
use crate::observability::{self, Event};

/// Reads exactly `buf.len()` bytes from `stream`.
///
/// Bytes read before an EOF stay in `buf`. `Interrupted` reads are retried.
pub fn read_fully<S: Read + ?Sized>(stream: &mut S, name: &str, buf: &mut [u8]) -> StreamResult<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                observability::metrics().increment_short_reads();
                return Err(StreamError::short_read(name, buf.len(), filled));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::read_failed(name, e)),
        }
    }
    Ok(())
}

/// Skips exactly `len` bytes of `stream`.
///
/// A skip that makes no progress is followed by a one-byte read, so a lazy
/// `skip` implementation is not mistaken for end of stream.
pub fn skip_fully<S: InputStream + ?Sized>(stream: &mut S, name: &str, len: u64) -> StreamResult<()> {
    let mut remaining = len;
    while remaining > 0 {
        let skipped = match stream.skip(remaining) {
            Ok(n) => n.min(remaining),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::read_failed(name, e)),
        };
        if skipped > 0 {
            remaining -= skipped;
            continue;
        }

        let mut byte = [0u8; 1];
        match stream.read(&mut byte) {
            Ok(0) => {
                observability::metrics().increment_incomplete_skips();
                return Err(StreamError::incomplete_skip(name, len, len - remaining));
            }
            Ok(_) => remaining -= 1,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::read_failed(name, e)),
        }
    }
    Ok(())
}

/// Closes `stream`, counting the attempt and mapping a failure.
pub(crate) fn close_checked<S: Closeable + ?Sized>(stream: &mut S, name: &str) -> StreamResult<()> {
    let metrics = observability::metrics();
    metrics.increment_streams_closed();
    stream.close().map_err(|e| {
        metrics.increment_close_failures();
        StreamError::close_failed(name, e)
    })
}

/// Logs the failure a quiet release step would otherwise have raised.
///
/// Every `STREAM_CLOSE_FAILED` line carries `stream`, `code` and `error`.
pub(crate) fn log_swallowed(result: StreamResult<()>) {
    if let Err(e) = result {
        observability::log_event(
            Event::StreamCloseFailed,
            &[
                ("stream", e.stream().unwrap_or("unknown")),
                ("code", e.code().code()),
                ("error", &e.to_string()),
            ],
        );
    }
}

/// Accumulates the first failure of a sequence of release steps.
///
/// Every step is run regardless of earlier failures; later failures are
/// logged as suppressed.
#[derive(Debug, Default)]
pub struct FirstError {
    first: Option<StreamError>,
}

impl FirstError {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one release step.
    pub fn record(&mut self, result: StreamResult<()>) {
        let Err(err) = result else {
            return;
        };
        if self.first.is_none() {
            self.first = Some(err);
            return;
        }
        observability::metrics().increment_close_failures_suppressed();
        observability::log_event(
            Event::StreamCloseFailureSuppressed,
            &[("error", &err.to_string())],
        );
    }

    /// Returns whether no failure has been recorded.
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// `Err` with the first recorded failure, if any.
    pub fn into_result(self) -> StreamResult<()> {
        match self.first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
