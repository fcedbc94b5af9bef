//! Replica read handles
//!
//! Everything one block read holds open, bundled so it is released exactly
//! once:
//!
//! - the block's data stream, and its native descriptor when file-backed
//! - the block's checksum stream (absent in [`DataOnlyReadHandles`])
//! - a reference pinning the volume the block lives on
//!
//! # Release
//!
//! `close_all` attempts every close and returns the first failure, with a
//! checksum failure taking precedence. `close_quietly` (and `Drop`) does the
//! same but logs. Both are idempotent, and the volume pin is released even
//! when stream closes fail.
//!
//! # Cache advisories
//!
//! Advisories go through the [`FileIoProvider`](crate::fileio::FileIoProvider)
//! given at construction, scoped to the pinned volume. [`CacheDropBehind`]
//! drives them during long sequential reads.

mod data;
mod data_only;
mod drop_behind;
mod read_handles;
#[cfg(test)]
pub(crate) mod testing;

pub use data_only::{ChecksumReleaseError, DataOnlyReadHandles};
pub use drop_behind::CacheDropBehind;
pub use read_handles::ReplicaReadHandles;

use crate::fileio::FadviseAdvice;
use crate::streams::{NativeDescriptor, StreamResult};

/// Data-side operations shared by [`ReplicaReadHandles`] and
/// [`DataOnlyReadHandles`].
pub trait DataReadHandles {
    /// Reads exactly `buf.len()` block bytes.
    fn read_data_exact(&mut self, buf: &mut [u8]) -> StreamResult<()>;

    /// Skips exactly `len` block bytes.
    fn skip_data_exact(&mut self, len: u64) -> StreamResult<()>;

    /// Descriptor of the data stream, if file-backed and still open.
    fn data_descriptor(&self) -> Option<NativeDescriptor>;

    fn advise_cache_drop(
        &self,
        identifier: &str,
        offset: u64,
        len: u64,
        advice: FadviseAdvice,
    ) -> StreamResult<()>;
}
