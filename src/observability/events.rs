//! Observable events emitted while replica read resources are managed.
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` key of a log line.

use std::fmt;

use super::logger::Severity;

/// Observable resource lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Descriptor probing
    /// The data stream claimed to be file-backed but its descriptor could not be read
    DescriptorProbeFailed,
    /// The data stream is not file-backed; cache hints are disabled
    DescriptorNotAvailable,

    // Stream release
    /// Closing a stream failed and the failure was logged instead of raised
    StreamCloseFailed,
    /// A later close failure was dropped in favour of an earlier one
    StreamCloseFailureSuppressed,
    /// Closing one half of a duplex channel failed
    DuplexCloseFailed,

    // Volume pins
    /// Releasing a volume reference failed
    VolumeReleaseFailed,
    /// A failed file operation asked for the volume to be checked
    VolumeDiskCheckRequested,

    // Cache management
    /// A cache advisory was issued
    CacheAdvisory,
    /// The OS rejected a cache advisory
    CacheAdvisoryFailed,
    /// posix_fadvise is not available; further advisories are skipped
    FadviseUnsupported,
}

impl Event {
    /// Returns the event name as it appears in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DescriptorProbeFailed => "DESCRIPTOR_PROBE_FAILED",
            Event::DescriptorNotAvailable => "DESCRIPTOR_NOT_AVAILABLE",
            Event::StreamCloseFailed => "STREAM_CLOSE_FAILED",
            Event::StreamCloseFailureSuppressed => "STREAM_CLOSE_FAILURE_SUPPRESSED",
            Event::DuplexCloseFailed => "DUPLEX_CLOSE_FAILED",
            Event::VolumeReleaseFailed => "VOLUME_RELEASE_FAILED",
            Event::VolumeDiskCheckRequested => "VOLUME_DISK_CHECK_REQUESTED",
            Event::CacheAdvisory => "CACHE_ADVISORY",
            Event::CacheAdvisoryFailed => "CACHE_ADVISORY_FAILED",
            Event::FadviseUnsupported => "FADVISE_UNSUPPORTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::DescriptorNotAvailable | Event::CacheAdvisory => Severity::Trace,
            Event::FadviseUnsupported | Event::VolumeDiskCheckRequested => Severity::Info,
            Event::DescriptorProbeFailed
            | Event::StreamCloseFailed
            | Event::StreamCloseFailureSuppressed
            | Event::DuplexCloseFailed
            | Event::VolumeReleaseFailed
            | Event::CacheAdvisoryFailed => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
