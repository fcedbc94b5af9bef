//! The data-side resources shared by both handle types.

use std::fmt;
use std::sync::Arc;

use crate::fileio::{FadviseAdvice, FileIoProvider};
use crate::observability::{self, Event};
use crate::streams::{
    close_checked, read_fully, skip_fully, FirstError, InputStream, NativeDescriptor, StreamError,
    StreamResult,
};
use crate::volume::VolumeReference;

pub(crate) const DATA: &str = "data";
pub(crate) const CHECKSUM: &str = "checksum";

/// Data stream, its probed descriptor and the volume pin
///
/// All three are released together; the descriptor is never handed out
/// after the stream it was borrowed from is closed.
pub(crate) struct DataHandle {
    stream: Option<Box<dyn InputStream>>,
    descriptor: Option<NativeDescriptor>,
    volume_ref: Option<VolumeReference>,
    file_io: Arc<dyn FileIoProvider>,
}

impl DataHandle {
    /// Takes ownership and probes the descriptor once.
    pub(crate) fn open(
        stream: Box<dyn InputStream>,
        volume_ref: VolumeReference,
        file_io: Arc<dyn FileIoProvider>,
    ) -> Self {
        let descriptor = probe_descriptor(&*stream);
        Self {
            stream: Some(stream),
            descriptor,
            volume_ref: Some(volume_ref),
            file_io,
        }
    }

    /// Moves the resources out, leaving `self` released.
    pub(crate) fn take(&mut self) -> Self {
        Self {
            stream: self.stream.take(),
            descriptor: self.descriptor.take(),
            volume_ref: self.volume_ref.take(),
            file_io: Arc::clone(&self.file_io),
        }
    }

    fn stream(&mut self) -> StreamResult<&mut Box<dyn InputStream>> {
        self.stream.as_mut().ok_or_else(|| StreamError::released(DATA))
    }

    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        read_fully(self.stream()?, DATA, buf)
    }

    pub(crate) fn skip_exact(&mut self, len: u64) -> StreamResult<()> {
        skip_fully(self.stream()?, DATA, len)
    }

    pub(crate) fn descriptor(&self) -> Option<NativeDescriptor> {
        self.descriptor
    }

    pub(crate) fn volume_reference(&self) -> Option<&VolumeReference> {
        self.volume_ref.as_ref()
    }

    pub(crate) fn stream_mut(&mut self) -> Option<&mut (dyn InputStream + 'static)> {
        self.stream.as_deref_mut()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.stream.is_none() && self.volume_ref.is_none()
    }

    /// Fails fast, without calling the provider, when there is no descriptor.
    pub(crate) fn advise_cache_drop(
        &self,
        identifier: &str,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        let fd = self
            .descriptor
            .ok_or_else(|| StreamError::descriptor_unavailable(identifier))?;
        let volume = self
            .volume_ref
            .as_ref()
            .and_then(VolumeReference::volume)
            .ok_or_else(|| StreamError::released("volume"))?;
        self.file_io
            .posix_fadvise(volume, identifier, fd, offset, len, advice)
    }

    /// Closes the stream into `errors` and releases the volume pin.
    pub(crate) fn close(&mut self, errors: &mut FirstError) {
        self.descriptor = None;
        if let Some(mut stream) = self.stream.take() {
            errors.record(close_checked(&mut stream, DATA));
        }
        if let Some(mut volume_ref) = self.volume_ref.take() {
            volume_ref.release_quietly();
        }
    }
}

impl fmt::Debug for DataHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataHandle")
            .field("stream", &self.stream.as_ref().map(|s| s.kind()))
            .field("descriptor", &self.descriptor)
            .field(
                "volume",
                &self.volume_ref.as_ref().and_then(|r| r.volume()).map(|v| v.id()),
            )
            .finish()
    }
}

fn probe_descriptor(stream: &dyn InputStream) -> Option<NativeDescriptor> {
    match stream.native_descriptor() {
        Ok(Some(fd)) => Some(fd),
        Ok(None) => {
            observability::log_event(Event::DescriptorNotAvailable, &[("kind", stream.kind())]);
            None
        }
        Err(e) => {
            observability::log_event(
                Event::DescriptorProbeFailed,
                &[("kind", stream.kind()), ("error", &e.to_string())],
            );
            None
        }
    }
}
