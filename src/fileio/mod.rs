//! File I/O provider: OS calls made on behalf of a volume
//!
//! Readers never call `posix_fadvise(2)` themselves. They go through a
//! [`FileIoProvider`], which scopes the call to the volume the file lives on
//! so that a failing call can flag that volume for a disk check.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::observability::{self, Event, Logger, Severity};
use crate::streams::{NativeDescriptor, StreamError, StreamResult};
use crate::volume::FsVolume;

/// Advice passed to `posix_fadvise(2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadviseAdvice {
    Normal,
    Sequential,
    Random,
    WillNeed,
    /// Evict the range from the page cache
    DontNeed,
    NoReuse,
}

impl FadviseAdvice {
    pub fn as_str(&self) -> &'static str {
        match self {
            FadviseAdvice::Normal => "POSIX_FADV_NORMAL",
            FadviseAdvice::Sequential => "POSIX_FADV_SEQUENTIAL",
            FadviseAdvice::Random => "POSIX_FADV_RANDOM",
            FadviseAdvice::WillNeed => "POSIX_FADV_WILLNEED",
            FadviseAdvice::DontNeed => "POSIX_FADV_DONTNEED",
            FadviseAdvice::NoReuse => "POSIX_FADV_NOREUSE",
        }
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn as_raw(&self) -> libc::c_int {
        match self {
            FadviseAdvice::Normal => libc::POSIX_FADV_NORMAL,
            FadviseAdvice::Sequential => libc::POSIX_FADV_SEQUENTIAL,
            FadviseAdvice::Random => libc::POSIX_FADV_RANDOM,
            FadviseAdvice::WillNeed => libc::POSIX_FADV_WILLNEED,
            FadviseAdvice::DontNeed => libc::POSIX_FADV_DONTNEED,
            FadviseAdvice::NoReuse => libc::POSIX_FADV_NOREUSE,
        }
    }
}

impl fmt::Display for FadviseAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// OS-level file operations scoped to a volume
pub trait FileIoProvider: Send + Sync + fmt::Debug {
    /// Advises the OS about the expected use of `[offset, offset + len)` of
    /// the file behind `fd`. `identifier` names the file in logs.
    fn posix_fadvise(
        &self,
        volume: &FsVolume,
        identifier: &str,
        fd: NativeDescriptor,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()>;
}

/// [`FileIoProvider`] backed by the host's `posix_fadvise(2)`
///
/// Where the call does not exist (non-Linux hosts, or `ENOSYS`) the provider
/// logs once and turns every later advisory into a no-op.
#[derive(Debug)]
pub struct NativeFileIoProvider {
    fadvise_possible: AtomicBool,
}

impl Default for NativeFileIoProvider {
    fn default() -> Self {
        Self {
            fadvise_possible: AtomicBool::new(true),
        }
    }
}

impl NativeFileIoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether advisories still reach the OS.
    pub fn is_fadvise_possible(&self) -> bool {
        self.fadvise_possible.load(Ordering::Relaxed)
    }

    fn disable_fadvise(&self, identifier: &str, error: &io::Error) {
        if self.fadvise_possible.swap(false, Ordering::Relaxed) {
            observability::log_event(
                Event::FadviseUnsupported,
                &[("identifier", identifier), ("error", &error.to_string())],
            );
        }
    }
}

impl FileIoProvider for NativeFileIoProvider {
    fn posix_fadvise(
        &self,
        volume: &FsVolume,
        identifier: &str,
        fd: NativeDescriptor,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()> {
        if !self.is_fadvise_possible() {
            return Ok(());
        }

        let started = Instant::now();
        let metrics = observability::metrics();
        match sys_fadvise(fd, offset, len, advice) {
            Ok(()) => {
                metrics.increment_cache_advisories();
                if Logger::enabled(Severity::Trace) {
                    let elapsed = started.elapsed().as_micros().to_string();
                    observability::log_event(
                        Event::CacheAdvisory,
                        &[
                            ("identifier", identifier),
                            ("volume", volume.id()),
                            ("advice", advice.as_str()),
                            ("offset", &offset.to_string()),
                            ("len", &len.to_string()),
                            ("elapsed_us", &elapsed),
                        ],
                    );
                }
                Ok(())
            }
            Err(e) if is_unsupported(&e) => {
                self.disable_fadvise(identifier, &e);
                Ok(())
            }
            Err(e) => {
                metrics.increment_cache_advisory_failures();
                volume.request_disk_check();
                observability::log_event(
                    Event::CacheAdvisoryFailed,
                    &[
                        ("identifier", identifier),
                        ("volume", volume.id()),
                        ("error", &e.to_string()),
                    ],
                );
                Err(StreamError::advisory_failed(identifier, offset, len, e))
            }
        }
    }
}

fn is_unsupported(error: &io::Error) -> bool {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    if error.raw_os_error() == Some(libc::ENOSYS) {
        return true;
    }
    error.kind() == io::ErrorKind::Unsupported
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn sys_fadvise(fd: NativeDescriptor, offset: u64, len: u64, advice: FadviseAdvice) -> io::Result<()> {
    let out_of_range = |what: &str| io::Error::new(io::ErrorKind::InvalidInput, format!("{} out of range", what));
    let offset = libc::off_t::try_from(offset).map_err(|_| out_of_range("offset"))?;
    let len = libc::off_t::try_from(len).map_err(|_| out_of_range("len"))?;

    // SAFETY: posix_fadvise only reads its integer arguments; a stale
    // descriptor is reported as EBADF.
    let rc = unsafe { libc::posix_fadvise(fd.as_raw(), offset, len, advice.as_raw()) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn sys_fadvise(_fd: NativeDescriptor, _offset: u64, _len: u64, _advice: FadviseAdvice) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "posix_fadvise is not available on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture_logs;

    #[test]
    fn test_advice_serde_names() {
        let json = serde_json::to_string(&FadviseAdvice::DontNeed).unwrap();
        assert_eq!(json, "\"dont_need\"");
        let parsed: FadviseAdvice = serde_json::from_str("\"sequential\"").unwrap();
        assert_eq!(parsed, FadviseAdvice::Sequential);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dont_need_on_real_file() {
        use crate::streams::InputStream;
        use crate::streams::FileInputStream;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blk_2001");
        std::fs::write(&path, vec![0u8; 8192]).unwrap();
        let stream = FileInputStream::open(&path).unwrap();
        let fd = stream.native_descriptor().unwrap().unwrap();

        let volume = FsVolume::new("vol-0", dir.path());
        let provider = NativeFileIoProvider::new();
        provider
            .posix_fadvise(&volume, "blk_2001", fd, 0, 8192, FadviseAdvice::DontNeed)
            .unwrap();
        assert!(!volume.take_disk_check_request());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_bad_descriptor_fails_and_requests_disk_check() {
        use crate::streams::StreamErrorCode;

        let volume = FsVolume::new("vol-1", "/data/1");
        let provider = NativeFileIoProvider::new();
        let (result, lines) = capture_logs(|| {
            provider.posix_fadvise(
                &volume,
                "blk_2002",
                NativeDescriptor::from_raw(-1),
                0,
                4096,
                FadviseAdvice::DontNeed,
            )
        });

        let err = result.unwrap_err();
        assert_eq!(err.code(), StreamErrorCode::ReplicaAdvisoryFailed);
        assert_eq!(err.io_source().unwrap().raw_os_error(), Some(libc::EBADF));
        assert!(volume.take_disk_check_request());
        assert!(lines.iter().any(|l| l["event"] == "CACHE_ADVISORY_FAILED"));
        assert!(provider.is_fadvise_possible());
    }

    #[test]
    fn test_unsupported_disables_further_calls() {
        let provider = NativeFileIoProvider::new();
        let err = io::Error::new(io::ErrorKind::Unsupported, "nope");
        let ((), lines) = capture_logs(|| {
            provider.disable_fadvise("blk_2003", &err);
            provider.disable_fadvise("blk_2003", &err);
        });
        assert!(!provider.is_fadvise_possible());
        assert_eq!(lines.len(), 1);

        let volume = FsVolume::new("vol-2", "/data/2");
        provider
            .posix_fadvise(
                &volume,
                "blk_2003",
                NativeDescriptor::from_raw(-1),
                0,
                1,
                FadviseAdvice::DontNeed,
            )
            .unwrap();
    }
}
