//! Shared doubles for integration tests

#![allow(dead_code)]

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use replica_io::fileio::{FadviseAdvice, FileIoProvider};
use replica_io::streams::{Closeable, InputStream, MemoryInputStream, NativeDescriptor, StreamResult};
use replica_io::volume::FsVolume;

/// Bytes per checksum chunk in the fixture checksum files
pub const BYTES_PER_CHECKSUM: usize = 50;

/// Version header preceding the CRCs in a checksum file
pub const CHECKSUM_HEADER: [u8; 2] = [0x00, 0x01];

/// In-memory stream whose close fails with `message` and counts attempts
pub struct FailingCloseStream {
    inner: MemoryInputStream,
    message: &'static str,
    closes: Arc<AtomicUsize>,
}

impl FailingCloseStream {
    pub fn new(bytes: Vec<u8>, message: &'static str) -> Self {
        Self {
            inner: MemoryInputStream::new(bytes),
            message,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn closes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl Read for FailingCloseStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Closeable for FailingCloseStream {
    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()?;
        Err(io::Error::new(io::ErrorKind::Other, self.message))
    }
}

impl InputStream for FailingCloseStream {
    fn kind(&self) -> &'static str {
        "failing"
    }
}

/// Provider that records the ranges it was asked to advise on
#[derive(Debug, Default)]
pub struct RecordingProvider {
    calls: Mutex<Vec<(String, u64, u64, FadviseAdvice)>>,
}

impl RecordingProvider {
    pub fn calls(&self) -> Vec<(String, u64, u64, FadviseAdvice)> {
        self.calls.lock().unwrap().clone()
    }
}

impl FileIoProvider for RecordingProvider {
    fn posix_fadvise(
        &self,
        _volume: &FsVolume,
        identifier: &str,
        _fd: NativeDescriptor,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((identifier.to_string(), offset, len, advice));
        Ok(())
    }
}

/// Writes `data` as `blk_<id>` and its checksum file as `blk_<id>.meta`.
///
/// The checksum file is the version header followed by one big-endian
/// CRC32 per `BYTES_PER_CHECKSUM` chunk.
pub fn write_block(dir: &Path, id: u64, data: &[u8]) -> (PathBuf, PathBuf) {
    let block = dir.join(format!("blk_{}", id));
    let meta = dir.join(format!("blk_{}.meta", id));

    let mut sums = CHECKSUM_HEADER.to_vec();
    for chunk in data.chunks(BYTES_PER_CHECKSUM) {
        sums.extend_from_slice(&crc32fast::hash(chunk).to_be_bytes());
    }

    fs::write(&block, data).unwrap();
    fs::write(&meta, sums).unwrap();
    (block, meta)
}

pub fn block_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
