//! Handles left after the checksum stream was released.

use std::error::Error;
use std::fmt;

use super::data::DataHandle;
use super::DataReadHandles;
use crate::fileio::FadviseAdvice;
use crate::streams::{
    log_swallowed, FirstError, InputStream, NativeDescriptor, StreamError, StreamResult,
};
use crate::volume::VolumeReference;

/// Data stream, volume pin and data descriptor of a read that skips
/// checksum verification
///
/// Produced by [`ReplicaReadHandles::into_data_only`]; there is no checksum
/// stream left to read. Closing follows the same two disciplines.
///
/// [`ReplicaReadHandles::into_data_only`]: super::ReplicaReadHandles::into_data_only
#[derive(Debug)]
pub struct DataOnlyReadHandles {
    data: DataHandle,
}

impl DataOnlyReadHandles {
    pub(crate) fn from_data(data: DataHandle) -> Self {
        Self { data }
    }

    pub fn read_data_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        self.data.read_exact(buf)
    }

    pub fn skip_data_exact(&mut self, len: u64) -> StreamResult<()> {
        self.data.skip_exact(len)
    }

    pub fn data_descriptor(&self) -> Option<NativeDescriptor> {
        self.data.descriptor()
    }

    pub fn volume_reference(&self) -> Option<&VolumeReference> {
        self.data.volume_reference()
    }

    pub fn data_stream_mut(&mut self) -> Option<&mut (dyn InputStream + 'static)> {
        self.data.stream_mut()
    }

    /// See [`ReplicaReadHandles::advise_cache_drop`](super::ReplicaReadHandles::advise_cache_drop).
    pub fn advise_cache_drop(
        &self,
        identifier: &str,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        self.data.advise_cache_drop(identifier, offset, len, advice)
    }

    /// Closes the data stream and releases the volume pin.
    pub fn close_all(&mut self) -> StreamResult<()> {
        let mut errors = FirstError::new();
        self.data.close(&mut errors);
        errors.into_result()
    }

    pub fn close_quietly(&mut self) {
        log_swallowed(self.close_all());
    }

    pub fn is_closed(&self) -> bool {
        self.data.is_released()
    }
}

impl DataReadHandles for DataOnlyReadHandles {
    fn read_data_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        DataOnlyReadHandles::read_data_exact(self, buf)
    }

    fn skip_data_exact(&mut self, len: u64) -> StreamResult<()> {
        DataOnlyReadHandles::skip_data_exact(self, len)
    }

    fn data_descriptor(&self) -> Option<NativeDescriptor> {
        DataOnlyReadHandles::data_descriptor(self)
    }

    fn advise_cache_drop(
        &self,
        identifier: &str,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        DataOnlyReadHandles::advise_cache_drop(self, identifier, offset, len, advice)
    }
}

impl Drop for DataOnlyReadHandles {
    fn drop(&mut self) {
        self.close_quietly();
    }
}

/// The checksum stream failed to close while narrowing to data-only handles
///
/// Carries the still-open data side so the read can continue or be closed.
#[derive(Debug)]
pub struct ChecksumReleaseError {
    error: StreamError,
    handles: DataOnlyReadHandles,
}

impl ChecksumReleaseError {
    pub(crate) fn new(error: StreamError, handles: DataOnlyReadHandles) -> Self {
        Self { error, handles }
    }

    pub fn error(&self) -> &StreamError {
        &self.error
    }

    /// Gives up on the error and keeps reading.
    pub fn into_handles(self) -> DataOnlyReadHandles {
        self.handles
    }

    pub fn into_parts(self) -> (StreamError, DataOnlyReadHandles) {
        (self.error, self.handles)
    }
}

impl fmt::Display for ChecksumReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for ChecksumReleaseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ChecksumReleaseError> for StreamError {
    fn from(err: ChecksumReleaseError) -> Self {
        err.error
    }
}
