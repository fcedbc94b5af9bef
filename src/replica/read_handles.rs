//! Resources held open while one replica read is served.

use std::fmt;
use std::sync::Arc;

use super::data::{DataHandle, CHECKSUM};
use super::data_only::{ChecksumReleaseError, DataOnlyReadHandles};
use super::DataReadHandles;
use crate::fileio::{FadviseAdvice, FileIoProvider};
use crate::streams::{
    close_checked, log_swallowed, read_fully, skip_fully, FirstError, InputStream, NativeDescriptor,
    StreamError, StreamResult,
};
use crate::volume::VolumeReference;

/// Data stream, checksum stream, volume pin and data descriptor of one read
///
/// Built by the block-read handler from streams it already opened and a
/// volume reference it already obtained. Released by exactly one of:
///
/// - [`close_all`](Self::close_all): every resource gets a close attempt;
///   the first failure is returned.
/// - [`close_quietly`](Self::close_quietly): same, but the failure is logged.
///   This is what `Drop` does.
///
/// Both are idempotent. After either, reads and skips fail with
/// `REPLICA_STREAM_RELEASED`.
///
/// The checksum stream can be released early with
/// [`release_checksum_only`](Self::release_checksum_only) or
/// [`into_data_only`](Self::into_data_only) when verification is skipped.
pub struct ReplicaReadHandles {
    data: DataHandle,
    checksum: Option<Box<dyn InputStream>>,
}

impl ReplicaReadHandles {
    /// Takes ownership of both streams and the volume pin.
    ///
    /// The data stream's native descriptor is probed here, once. A stream
    /// that is not file-backed only disables cache advisories.
    pub fn new<D, C>(
        data: D,
        checksum: C,
        volume_ref: VolumeReference,
        file_io: Arc<dyn FileIoProvider>,
    ) -> Self
    where
        D: InputStream + 'static,
        C: InputStream + 'static,
    {
        Self {
            data: DataHandle::open(Box::new(data), volume_ref, file_io),
            checksum: Some(Box::new(checksum)),
        }
    }

    /// Reads exactly `buf.len()` block bytes.
    ///
    /// On `REPLICA_SHORT_READ` the bytes that were available stay in `buf`.
    pub fn read_data_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        self.data.read_exact(buf)
    }

    /// Reads exactly `buf.len()` checksum bytes.
    pub fn read_checksum_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        read_fully(self.checksum()?, CHECKSUM, buf)
    }

    /// Skips exactly `len` block bytes or fails with `REPLICA_INCOMPLETE_SKIP`.
    pub fn skip_data_exact(&mut self, len: u64) -> StreamResult<()> {
        self.data.skip_exact(len)
    }

    /// Skips exactly `len` checksum bytes or fails with `REPLICA_INCOMPLETE_SKIP`.
    pub fn skip_checksum_exact(&mut self, len: u64) -> StreamResult<()> {
        skip_fully(self.checksum()?, CHECKSUM, len)
    }

    /// Descriptor probed at construction; `None` if the data stream is not
    /// file-backed or the handles were closed.
    pub fn data_descriptor(&self) -> Option<NativeDescriptor> {
        self.data.descriptor()
    }

    /// The volume pin, for collaborators that need to know which volume
    /// backs this read. Must not be released through this borrow.
    pub fn volume_reference(&self) -> Option<&VolumeReference> {
        self.data.volume_reference()
    }

    pub fn data_stream_mut(&mut self) -> Option<&mut (dyn InputStream + 'static)> {
        self.data.stream_mut()
    }

    pub fn checksum_stream_mut(&mut self) -> Option<&mut (dyn InputStream + 'static)> {
        self.checksum.as_deref_mut()
    }

    /// Asks the OS to act on `[offset, offset + len)` of the block file.
    ///
    /// Calling this without a data descriptor is a caller bug: it fails with
    /// `REPLICA_DESCRIPTOR_UNAVAILABLE` and the provider is not called.
    pub fn advise_cache_drop(
        &self,
        identifier: &str,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        self.data.advise_cache_drop(identifier, offset, len, advice)
    }

    /// Closes only the checksum stream, returning its close failure.
    ///
    /// The data stream stays open. A second call is a no-op.
    pub fn release_checksum_only(&mut self) -> StreamResult<()> {
        match self.checksum.take() {
            Some(mut checksum) => close_checked(&mut checksum, CHECKSUM),
            None => Ok(()),
        }
    }

    /// Closes the checksum stream and narrows to the data-only handles.
    ///
    /// The data side survives a failed checksum close: it is returned inside
    /// the error.
    pub fn into_data_only(mut self) -> Result<DataOnlyReadHandles, ChecksumReleaseError> {
        let released = self.release_checksum_only();
        let handles = DataOnlyReadHandles::from_data(self.data.take());
        match released {
            Ok(()) => Ok(handles),
            Err(error) => Err(ChecksumReleaseError::new(error, handles)),
        }
    }

    /// Closes checksum then data, releases the volume pin, and returns the
    /// first close failure.
    ///
    /// Every resource gets its close attempt whatever failed before it. A
    /// checksum failure wins over a data failure; the loser is logged.
    /// Volume release failures are logged, never returned.
    pub fn close_all(&mut self) -> StreamResult<()> {
        let mut errors = FirstError::new();
        if let Some(mut checksum) = self.checksum.take() {
            errors.record(close_checked(&mut checksum, CHECKSUM));
        }
        self.data.close(&mut errors);
        errors.into_result()
    }

    /// [`close_all`](Self::close_all), logging instead of returning its failure.
    pub fn close_quietly(&mut self) {
        log_swallowed(self.close_all());
    }

    /// Whether every resource has been released.
    pub fn is_closed(&self) -> bool {
        self.checksum.is_none() && self.data.is_released()
    }

    fn checksum(&mut self) -> StreamResult<&mut Box<dyn InputStream>> {
        self.checksum
            .as_mut()
            .ok_or_else(|| StreamError::released(CHECKSUM))
    }
}

impl fmt::Debug for ReplicaReadHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaReadHandles")
            .field("data", &self.data)
            .field("checksum", &self.checksum.as_ref().map(|s| s.kind()))
            .finish()
    }
}

impl DataReadHandles for ReplicaReadHandles {
    fn read_data_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        ReplicaReadHandles::read_data_exact(self, buf)
    }

    fn skip_data_exact(&mut self, len: u64) -> StreamResult<()> {
        ReplicaReadHandles::skip_data_exact(self, len)
    }

    fn data_descriptor(&self) -> Option<NativeDescriptor> {
        ReplicaReadHandles::data_descriptor(self)
    }

    fn advise_cache_drop(
        &self,
        identifier: &str,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        ReplicaReadHandles::advise_cache_drop(self, identifier, offset, len, advice)
    }
}

impl Drop for ReplicaReadHandles {
    fn drop(&mut self) {
        self.close_quietly();
    }
}
