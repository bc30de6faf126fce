//! Segment configuration.

/// Limits and placement for a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentConfig {
    /// Store size at which the segment reports itself as maxed.
    ///
    /// The store never enforces this on its own.
    pub max_store_bytes: u64,

    /// Hard capacity of the index in bytes. The index file is grown to this
    /// size while open.
    pub max_index_bytes: u64,

    /// Base offset of the first segment.
    pub initial_offset: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_store_bytes: 64 * 1024 * 1024, // 64 MB
            max_index_bytes: 1024 * 1024,      // 1 MB
            initial_offset: 0,
        }
    }
}

/// Configuration for opening stores, indexes and segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Per-segment limits.
    pub segment: SegmentConfig,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store size at which a segment is considered full.
    #[must_use]
    pub const fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.segment.max_store_bytes = bytes;
        self
    }

    /// Sets the index capacity in bytes.
    #[must_use]
    pub const fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.segment.max_index_bytes = bytes;
        self
    }

    /// Sets the base offset of the first segment.
    #[must_use]
    pub const fn initial_offset(mut self, offset: u64) -> Self {
        self.segment.initial_offset = offset;
        self
    }
}
