//! Metrics registry for replica read resources
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics registry containing all resource lifecycle counters
///
/// All counters use Relaxed ordering; eventual consistency is fine here.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Streams that completed a close attempt
    streams_closed: AtomicU64,
    /// Close attempts that failed
    close_failures: AtomicU64,
    /// Close failures dropped in favour of an earlier one
    close_failures_suppressed: AtomicU64,
    /// Exact reads that hit end-of-stream
    short_reads: AtomicU64,
    /// Exact skips that hit end-of-stream
    incomplete_skips: AtomicU64,
    /// Cache advisories handed to the OS
    cache_advisories: AtomicU64,
    /// Cache advisories the OS rejected
    cache_advisory_failures: AtomicU64,
    /// Volume references released
    volume_releases: AtomicU64,
    /// Volume reference releases that failed
    volume_release_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Stream release

    /// Increment streams closed
    pub fn increment_streams_closed(&self) {
        self.streams_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment close failures
    pub fn increment_close_failures(&self) {
        self.close_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment suppressed close failures
    pub fn increment_close_failures_suppressed(&self) {
        self.close_failures_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    // Exact reads and skips

    /// Increment short reads
    pub fn increment_short_reads(&self) {
        self.short_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment incomplete skips
    pub fn increment_incomplete_skips(&self) {
        self.incomplete_skips.fetch_add(1, Ordering::Relaxed);
    }

    // Cache management

    /// Increment cache advisories issued
    pub fn increment_cache_advisories(&self) {
        self.cache_advisories.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment cache advisory failures
    pub fn increment_cache_advisory_failures(&self) {
        self.cache_advisory_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Volume references

    /// Increment volume references released
    pub fn increment_volume_releases(&self) {
        self.volume_releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment volume release failures
    pub fn increment_volume_release_failures(&self) {
        self.volume_release_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            streams_closed: self.streams_closed.load(Ordering::Relaxed),
            close_failures: self.close_failures.load(Ordering::Relaxed),
            close_failures_suppressed: self.close_failures_suppressed.load(Ordering::Relaxed),
            short_reads: self.short_reads.load(Ordering::Relaxed),
            incomplete_skips: self.incomplete_skips.load(Ordering::Relaxed),
            cache_advisories: self.cache_advisories.load(Ordering::Relaxed),
            cache_advisory_failures: self.cache_advisory_failures.load(Ordering::Relaxed),
            volume_releases: self.volume_releases.load(Ordering::Relaxed),
            volume_release_failures: self.volume_release_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub streams_closed: u64,
    pub close_failures: u64,
    pub close_failures_suppressed: u64,
    pub short_reads: u64,
    pub incomplete_skips: u64,
    pub cache_advisories: u64,
    pub cache_advisory_failures: u64,
    pub volume_releases: u64,
    pub volume_release_failures: u64,
}
