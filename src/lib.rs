//! replica-io - resource lifecycle for serving block replica reads
//!
//! A replica read holds a data stream, a checksum stream and a pin on the
//! volume the block lives on. This crate bundles them so they are released
//! exactly once, with close failures either propagated or logged, and
//! exposes the data file's descriptor for OS page cache advisories.

pub mod config;
pub mod fileio;
pub mod observability;
pub mod replica;
pub mod streams;
pub mod volume;

pub use config::CacheDropConfig;
pub use fileio::{FadviseAdvice, FileIoProvider, NativeFileIoProvider};
pub use replica::{
    CacheDropBehind, ChecksumReleaseError, DataOnlyReadHandles, DataReadHandles,
    ReplicaReadHandles,
};
pub use streams::{DuplexChannel, StreamError, StreamErrorCode, StreamResult};
pub use volume::{FsVolume, VolumeReference};
