//! Test doubles for replica read handles.

use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::fileio::{FadviseAdvice, FileIoProvider};
use crate::streams::{
    Closeable, InputStream, MemoryInputStream, NativeDescriptor, StreamResult,
};
use crate::volume::FsVolume;

/// In-memory stream whose close can be made to fail, counting close calls.
pub(crate) struct ScriptedStream {
    inner: MemoryInputStream,
    close_error: Option<&'static str>,
    closes: Arc<AtomicUsize>,
    descriptor: Option<NativeDescriptor>,
}

impl ScriptedStream {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: MemoryInputStream::new(bytes),
            close_error: None,
            closes: Arc::new(AtomicUsize::new(0)),
            descriptor: None,
        }
    }

    pub(crate) fn failing_close(mut self, message: &'static str) -> Self {
        self.close_error = Some(message);
        self
    }

    /// Pretends to be file-backed.
    pub(crate) fn with_descriptor(mut self, raw: i32) -> Self {
        self.descriptor = Some(NativeDescriptor::from_raw(raw));
        self
    }

    pub(crate) fn closes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Closeable for ScriptedStream {
    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()?;
        match self.close_error {
            Some(message) => Err(io::Error::new(io::ErrorKind::Other, message)),
            None => Ok(()),
        }
    }
}

impl InputStream for ScriptedStream {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        self.inner.skip(n)
    }

    fn native_descriptor(&self) -> io::Result<Option<NativeDescriptor>> {
        Ok(self.descriptor)
    }

    fn kind(&self) -> &'static str {
        "scripted"
    }
}

/// One recorded advisory call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AdvisoryCall {
    pub(crate) volume: String,
    pub(crate) identifier: String,
    pub(crate) fd: i32,
    pub(crate) offset: u64,
    pub(crate) len: u64,
    pub(crate) advice: FadviseAdvice,
}

/// File I/O provider that records advisories instead of issuing them.
#[derive(Debug, Default)]
pub(crate) struct RecordingFileIo {
    calls: Mutex<Vec<AdvisoryCall>>,
}

impl RecordingFileIo {
    pub(crate) fn calls(&self) -> Vec<AdvisoryCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl FileIoProvider for RecordingFileIo {
    fn posix_fadvise(
        &self,
        volume: &FsVolume,
        identifier: &str,
        fd: NativeDescriptor,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        self.calls.lock().unwrap().push(AdvisoryCall {
            volume: volume.id().to_string(),
            identifier: identifier.to_string(),
            fd: fd.as_raw(),
            offset,
            len,
            advice,
        });
        Ok(())
    }
}
