//! Drop-behind for large sequential reads.
//!
//! While a block is streamed, every `drop_cache_interval_bytes` the pages
//! already sent are handed back to the OS with `POSIX_FADV_DONTNEED`, so a
//! long scan does not evict pages other readers still use.

use super::DataReadHandles;
use crate::config::CacheDropConfig;
use crate::fileio::FadviseAdvice;
use crate::streams::StreamResult;

/// Tracks how far behind the read position the cache has been dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDropBehind {
    enabled: bool,
    interval: u64,
    last_drop_offset: u64,
}

impl CacheDropBehind {
    /// A tracker for a read of `read_length` bytes starting at `start_offset`.
    pub fn new(config: &CacheDropConfig, start_offset: u64, read_length: u64) -> Self {
        Self {
            enabled: config.drops_behind(read_length),
            interval: config.drop_cache_interval_bytes.max(1),
            last_drop_offset: start_offset,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start of the range not yet dropped.
    pub fn last_drop_offset(&self) -> u64 {
        self.last_drop_offset
    }

    /// Called with the read position after each chunk is sent.
    ///
    /// Drops `[last_drop_offset, offset)` once at least one interval has
    /// been read since the previous drop. Returns whether an advisory was
    /// issued. Handles without a descriptor are skipped.
    pub fn after_read<H: DataReadHandles + ?Sized>(
        &mut self,
        handles: &H,
        identifier: &str,
        offset: u64,
    ) -> StreamResult<bool> {
        if !self.enabled || handles.data_descriptor().is_none() {
            return Ok(false);
        }
        if offset < self.last_drop_offset.saturating_add(self.interval) {
            return Ok(false);
        }
        self.drop_up_to(handles, identifier, offset)
    }

    /// Drops whatever was read since the last advisory, up to `end_offset`.
    ///
    /// Called once, before the handles are closed.
    pub fn finish<H: DataReadHandles + ?Sized>(
        &mut self,
        handles: &H,
        identifier: &str,
        end_offset: u64,
    ) -> StreamResult<bool> {
        if !self.enabled
            || handles.data_descriptor().is_none()
            || end_offset <= self.last_drop_offset
        {
            return Ok(false);
        }
        self.drop_up_to(handles, identifier, end_offset)
    }

    fn drop_up_to<H: DataReadHandles + ?Sized>(
        &mut self,
        handles: &H,
        identifier: &str,
        offset: u64,
    ) -> StreamResult<bool> {
        handles.advise_cache_drop(
            identifier,
            self.last_drop_offset,
            offset - self.last_drop_offset,
            FadviseAdvice::DontNeed,
        )?;
        self.last_drop_offset = offset;
        Ok(true)
    }
}
