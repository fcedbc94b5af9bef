//! Storage volumes and the references that pin them
//!
//! A volume may only finish removal once nobody reads from it. Every replica
//! read holds a [`VolumeReference`] for its whole lifetime; the volume keeps
//! a shared count of outstanding references.
//!
//! # Reference counting
//!
//! The count and the closed flag live in one atomic word, so `close` and
//! `obtain_reference` cannot interleave into a reference on a closed volume.
//! Releasing a reference decrements the shared count; it never closes the
//! volume.

mod errors;

pub use errors::{VolumeError, VolumeResult};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::{self, Event};

const CLOSED_BIT: u64 = 1 << 63;
const COUNT_MASK: u64 = CLOSED_BIT - 1;

/// A storage volume holding block replicas
#[derive(Debug)]
pub struct FsVolume {
    id: String,
    base_dir: PathBuf,
    /// Outstanding references, with `CLOSED_BIT` set once closed
    state: AtomicU64,
    disk_check_requested: AtomicBool,
}

impl FsVolume {
    /// Creates an open volume with no references.
    pub fn new(id: impl Into<String>, base_dir: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            base_dir: base_dir.into(),
            state: AtomicU64::new(0),
            disk_check_requested: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Pins the volume open.
    ///
    /// Fails with [`VolumeError::VolumeClosed`] once [`close`](Self::close)
    /// has been called.
    pub fn obtain_reference(self: &Arc<Self>) -> VolumeResult<VolumeReference> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                if state & CLOSED_BIT != 0 {
                    None
                } else {
                    Some(state + 1)
                }
            })
            .map_err(|_| VolumeError::VolumeClosed(self.id.clone()))?;

        Ok(VolumeReference {
            volume: Some(Arc::clone(self)),
        })
    }

    fn unreference(&self) -> VolumeResult<()> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                if state & COUNT_MASK == 0 {
                    None
                } else {
                    Some(state - 1)
                }
            })
            .map(|_| ())
            .map_err(|_| VolumeError::ReferenceUnderflow(self.id.clone()))
    }

    /// Number of outstanding references.
    pub fn reference_count(&self) -> u64 {
        self.state.load(Ordering::Acquire) & COUNT_MASK
    }

    /// Stops handing out references. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        self.state.fetch_or(CLOSED_BIT, Ordering::AcqRel) & CLOSED_BIT == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) & CLOSED_BIT != 0
    }

    /// Closed and no longer referenced: removal may complete.
    pub fn is_removable(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED_BIT
    }

    /// Flags the volume for a disk health check after a failed file operation.
    pub fn request_disk_check(&self) {
        if !self.disk_check_requested.swap(true, Ordering::AcqRel) {
            observability::log_event(Event::VolumeDiskCheckRequested, &[("volume", &self.id)]);
        }
    }

    /// Clears and returns the pending disk check request.
    pub fn take_disk_check_request(&self) -> bool {
        self.disk_check_requested.swap(false, Ordering::AcqRel)
    }
}

/// A counted pin on an [`FsVolume`]
///
/// Released at most once: by [`release`](Self::release), or on drop.
#[derive(Debug)]
pub struct VolumeReference {
    volume: Option<Arc<FsVolume>>,
}

impl VolumeReference {
    /// Wraps a volume without taking a count.
    #[cfg(test)]
    pub(crate) fn unaccounted(volume: Arc<FsVolume>) -> Self {
        Self {
            volume: Some(volume),
        }
    }

    /// The pinned volume, or `None` once released.
    pub fn volume(&self) -> Option<&FsVolume> {
        self.volume.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.volume.is_none()
    }

    /// Drops this pin. A second call is a no-op.
    pub fn release(&mut self) -> VolumeResult<()> {
        match self.volume.take() {
            Some(volume) => volume.unreference(),
            None => Ok(()),
        }
    }

    /// Drops this pin; a failure is counted and logged, never raised.
    pub fn release_quietly(&mut self) {
        let Some(volume_id) = self.volume.as_ref().map(|v| v.id.clone()) else {
            return;
        };
        let metrics = observability::metrics();
        match self.release() {
            Ok(()) => metrics.increment_volume_releases(),
            Err(e) => {
                metrics.increment_volume_release_failures();
                observability::log_event(
                    Event::VolumeReleaseFailed,
                    &[("volume", &volume_id), ("error", &e.to_string())],
                );
            }
        }
    }
}

impl Drop for VolumeReference {
    fn drop(&mut self) {
        self.release_quietly();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture_logs;

    #[test]
    fn test_reference_counting() {
        let volume = FsVolume::new("vol-0", "/data/0");
        let mut first = volume.obtain_reference().unwrap();
        let second = volume.obtain_reference().unwrap();
        assert_eq!(volume.reference_count(), 2);

        first.release().unwrap();
        assert_eq!(volume.reference_count(), 1);
        first.release().unwrap();
        assert_eq!(volume.reference_count(), 1);
        assert!(first.volume().is_none());

        drop(second);
        assert_eq!(volume.reference_count(), 0);
    }

    #[test]
    fn test_closed_volume_refuses_references() {
        let volume = FsVolume::new("vol-1", "/data/1");
        let reference = volume.obtain_reference().unwrap();

        assert!(volume.close());
        assert!(!volume.close());
        assert_eq!(
            volume.obtain_reference().unwrap_err(),
            VolumeError::VolumeClosed("vol-1".into())
        );
        assert!(!volume.is_removable());

        drop(reference);
        assert!(volume.is_removable());
    }

    #[test]
    fn test_underflow_is_reported() {
        let volume = FsVolume::new("vol-2", "/data/2");
        let mut reference = VolumeReference::unaccounted(Arc::clone(&volume));
        assert_eq!(
            reference.release().unwrap_err(),
            VolumeError::ReferenceUnderflow("vol-2".into())
        );
        assert!(reference.is_released());
    }

    #[test]
    fn test_release_quietly_logs_failure() {
        let volume = FsVolume::new("vol-3", "/data/3");
        let ((), lines) = capture_logs(|| {
            let mut reference = VolumeReference::unaccounted(Arc::clone(&volume));
            reference.release_quietly();
            reference.release_quietly();
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "VOLUME_RELEASE_FAILED");
        assert_eq!(lines[0]["volume"], "vol-3");
    }

    #[test]
    fn test_disk_check_request_is_taken_once() {
        let volume = FsVolume::new("vol-4", "/data/4");
        let ((), lines) = capture_logs(|| {
            volume.request_disk_check();
            volume.request_disk_check();
        });
        assert_eq!(lines.len(), 1);
        assert!(volume.take_disk_check_request());
        assert!(!volume.take_disk_check_request());
    }
}
