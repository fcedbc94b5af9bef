//! Stream error types
//!
//! Error codes:
//! - REPLICA_SHORT_READ
//! - REPLICA_INCOMPLETE_SKIP
//! - REPLICA_READ_FAILED
//! - REPLICA_CLOSE_FAILED
//! - REPLICA_DESCRIPTOR_UNAVAILABLE (contract violation)
//! - REPLICA_ADVISORY_FAILED
//! - REPLICA_STREAM_RELEASED (contract violation)

use std::fmt;
use std::io;

/// Stream-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorCode {
    /// End of stream reached before the requested byte count was read
    ReplicaShortRead,
    /// End of stream reached before the requested byte count was skipped
    ReplicaIncompleteSkip,
    /// The underlying read or skip failed
    ReplicaReadFailed,
    /// Closing an underlying stream failed
    ReplicaCloseFailed,
    /// Cache advisory requested for a stream with no native descriptor
    ReplicaDescriptorUnavailable,
    /// The OS rejected a cache advisory
    ReplicaAdvisoryFailed,
    /// Operation on a stream that was already released
    ReplicaStreamReleased,
}

impl StreamErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StreamErrorCode::ReplicaShortRead => "REPLICA_SHORT_READ",
            StreamErrorCode::ReplicaIncompleteSkip => "REPLICA_INCOMPLETE_SKIP",
            StreamErrorCode::ReplicaReadFailed => "REPLICA_READ_FAILED",
            StreamErrorCode::ReplicaCloseFailed => "REPLICA_CLOSE_FAILED",
            StreamErrorCode::ReplicaDescriptorUnavailable => "REPLICA_DESCRIPTOR_UNAVAILABLE",
            StreamErrorCode::ReplicaAdvisoryFailed => "REPLICA_ADVISORY_FAILED",
            StreamErrorCode::ReplicaStreamReleased => "REPLICA_STREAM_RELEASED",
        }
    }

    /// Returns whether the error is a caller bug rather than an I/O condition
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            StreamErrorCode::ReplicaDescriptorUnavailable | StreamErrorCode::ReplicaStreamReleased
        )
    }

    /// The `io::ErrorKind` this code maps to when converted
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            StreamErrorCode::ReplicaShortRead | StreamErrorCode::ReplicaIncompleteSkip => {
                io::ErrorKind::UnexpectedEof
            }
            StreamErrorCode::ReplicaDescriptorUnavailable => io::ErrorKind::Unsupported,
            StreamErrorCode::ReplicaStreamReleased => io::ErrorKind::NotConnected,
            StreamErrorCode::ReplicaReadFailed
            | StreamErrorCode::ReplicaCloseFailed
            | StreamErrorCode::ReplicaAdvisoryFailed => io::ErrorKind::Other,
        }
    }
}

impl fmt::Display for StreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Stream error type with full context
#[derive(Debug)]
pub struct StreamError {
    /// Error code
    code: StreamErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
    /// Which stream of the read failed, when one did
    stream: Option<String>,
}

impl StreamError {
    /// End of stream after `read` of `requested` bytes
    pub fn short_read(stream: &str, requested: usize, read: usize) -> Self {
        Self {
            code: StreamErrorCode::ReplicaShortRead,
            message: format!("Premature EOF from {} stream", stream),
            details: Some(format!("requested: {}, read: {}", requested, read)),
            source: None,
            stream: Some(stream.to_string()),
        }
    }

    /// End of stream after `skipped` of `requested` bytes
    pub fn incomplete_skip(stream: &str, requested: u64, skipped: u64) -> Self {
        Self {
            code: StreamErrorCode::ReplicaIncompleteSkip,
            message: format!(
                "Premature EOF from {} stream after skipping {} byte(s)",
                stream, skipped
            ),
            details: Some(format!("requested: {}, skipped: {}", requested, skipped)),
            source: None,
            stream: Some(stream.to_string()),
        }
    }

    /// The underlying read or skip failed
    pub fn read_failed(stream: &str, source: io::Error) -> Self {
        Self {
            code: StreamErrorCode::ReplicaReadFailed,
            message: format!("Failed to read {} stream", stream),
            details: None,
            source: Some(source),
            stream: Some(stream.to_string()),
        }
    }

    /// Closing the named stream failed
    pub fn close_failed(stream: &str, source: io::Error) -> Self {
        Self {
            code: StreamErrorCode::ReplicaCloseFailed,
            message: format!("Failed to close {} stream", stream),
            details: None,
            source: Some(source),
            stream: Some(stream.to_string()),
        }
    }

    /// No native descriptor for a cache advisory
    pub fn descriptor_unavailable(identifier: &str) -> Self {
        Self {
            code: StreamErrorCode::ReplicaDescriptorUnavailable,
            message: "Cache advisory requested but the data stream has no native descriptor"
                .to_string(),
            details: Some(format!("identifier: {}", identifier)),
            source: None,
            stream: None,
        }
    }

    /// posix_fadvise failed
    pub fn advisory_failed(identifier: &str, offset: u64, len: u64, source: io::Error) -> Self {
        Self {
            code: StreamErrorCode::ReplicaAdvisoryFailed,
            message: format!("Cache advisory rejected for {}", identifier),
            details: Some(format!("offset: {}, len: {}", offset, len)),
            source: Some(source),
            stream: None,
        }
    }

    /// Operation on a stream that was already released
    pub fn released(stream: &str) -> Self {
        Self {
            code: StreamErrorCode::ReplicaStreamReleased,
            message: format!("The {} stream has already been released", stream),
            details: None,
            source: None,
            stream: Some(stream.to_string()),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StreamErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns the underlying I/O error, if any
    pub fn io_source(&self) -> Option<&io::Error> {
        self.source.as_ref()
    }

    /// Returns the name of the stream the error concerns (`data`, `checksum`, ...)
    pub fn stream(&self) -> Option<&str> {
        self.stream.as_deref()
    }

    /// Returns whether the error is a caller bug rather than an I/O condition
    pub fn is_contract_violation(&self) -> bool {
        self.code.is_contract_violation()
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        io::Error::new(err.code.io_kind(), err)
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StreamErrorCode::ReplicaShortRead.code(), "REPLICA_SHORT_READ");
        assert_eq!(StreamErrorCode::ReplicaIncompleteSkip.code(), "REPLICA_INCOMPLETE_SKIP");
        assert_eq!(StreamErrorCode::ReplicaCloseFailed.code(), "REPLICA_CLOSE_FAILED");
        assert_eq!(
            StreamErrorCode::ReplicaDescriptorUnavailable.code(),
            "REPLICA_DESCRIPTOR_UNAVAILABLE"
        );
        assert_eq!(StreamErrorCode::ReplicaAdvisoryFailed.code(), "REPLICA_ADVISORY_FAILED");
    }

    #[test]
    fn test_contract_violations() {
        assert!(StreamError::descriptor_unavailable("blk_1").is_contract_violation());
        assert!(StreamError::released("data").is_contract_violation());
        assert!(!StreamError::short_read("data", 10, 9).is_contract_violation());
    }

    #[test]
    fn test_short_read_display_has_counts() {
        let err = StreamError::short_read("checksum", 30, 20);
        let display = err.to_string();
        assert!(display.contains("REPLICA_SHORT_READ"));
        assert!(display.contains("checksum"));
        assert!(display.contains("requested: 30, read: 20"));
    }

    #[test]
    fn test_close_failed_keeps_source() {
        let err = StreamError::close_failed("data", io::Error::new(io::ErrorKind::Other, "EIO"));
        assert_eq!(err.io_source().unwrap().to_string(), "EIO");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.stream(), Some("data"));
        assert_eq!(StreamError::descriptor_unavailable("blk_1").stream(), None);
    }

    #[test]
    fn test_into_io_error_maps_eof() {
        let io_err: io::Error = StreamError::incomplete_skip("data", 5, 2).into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
