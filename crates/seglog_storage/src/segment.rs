//! A single log segment: one store and one index driven together.
//!
//! The segment assigns absolute offsets starting at its base offset, writes
//! each record to the store and its position to the index, and resolves
//! offsets back to records. It never creates, rotates, or removes other
//! segments; [`Segment::is_maxed`] only tells the owner when to do so.
//!
//! ## Files
//!
//! ```text
//! {dir}/{base_offset:020}.store
//! {dir}/{base_offset:020}.index
//! ```

use crate::config::Config;
use crate::error::{StorageError, StorageResult};
use crate::index::Index;
use crate::store::Store;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of a segment's store file.
pub const STORE_EXTENSION: &str = "store";

/// Extension of a segment's index file.
pub const INDEX_EXTENSION: &str = "index";

/// Returns the store file path for the segment at `base_offset` in `dir`.
#[must_use]
pub fn store_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset:020}.{STORE_EXTENSION}"))
}

/// Returns the index file path for the segment at `base_offset` in `dir`.
#[must_use]
pub fn index_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset:020}.{INDEX_EXTENSION}"))
}

/// Point-in-time figures for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStats {
    /// First offset of the segment.
    pub base_offset: u64,
    /// Offset the next append will receive.
    pub next_offset: u64,
    /// Store size in bytes, buffered records included.
    pub store_bytes: u64,
    /// Number of index entries.
    pub index_entries: u64,
    /// Index capacity in bytes.
    pub index_capacity: u64,
    /// Whether the segment has reached either limit.
    pub maxed: bool,
}

/// One store and one index behind a single lock.
///
/// The index is not thread-safe on its own; the segment lock covers every
/// index access together with the matching store call, so store and index
/// entry counts move in lockstep.
///
/// # Example
///
/// ```no_run
/// use seglog_storage::{Config, Segment};
/// use std::path::Path;
///
/// let segment = Segment::open(Path::new("data"), 0, &Config::default()).unwrap();
/// let offset = segment.append(b"hello").unwrap();
/// assert_eq!(segment.read(offset).unwrap(), b"hello");
/// segment.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Segment {
    base_offset: u64,
    max_store_bytes: u64,
    store: Store,
    inner: Mutex<SegmentInner>,
}

#[derive(Debug)]
struct SegmentInner {
    index: Index,
    next_offset: u64,
}

impl Segment {
    /// Opens or creates the segment at `base_offset` inside `dir`.
    ///
    /// The next offset is recovered from the last index entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or either file cannot be opened, or
    /// if the index file is rejected by [`Index::open`]. Returns
    /// [`StorageError::InvalidConfig`] if the recovered next offset would
    /// overflow `u64`.
    pub fn open(dir: &Path, base_offset: u64, config: &Config) -> StorageResult<Self> {
        std::fs::create_dir_all(dir)?;

        let store = Store::open(&store_path(dir, base_offset))?;
        let index = Index::open(&index_path(dir, base_offset), config)?;

        let next_offset = match index.read(-1) {
            Ok((relative, _)) => base_offset
                .checked_add(u64::from(relative) + 1)
                .ok_or_else(|| {
                    StorageError::InvalidConfig(format!(
                        "base offset {base_offset} plus relative offset {relative} overflows u64"
                    ))
                })?,
            Err(StorageError::EntryNotFound { .. }) => base_offset,
            Err(e) => return Err(e),
        };

        debug!(
            dir = %dir.display(),
            base_offset,
            next_offset,
            store_bytes = store.size(),
            "opened segment"
        );

        Ok(Self {
            base_offset,
            max_store_bytes: config.segment.max_store_bytes,
            store,
            inner: Mutex::new(SegmentInner { index, next_offset }),
        })
    }

    /// Opens the segment at the configured initial offset.
    ///
    /// # Errors
    ///
    /// Same as [`Segment::open`].
    pub fn open_initial(dir: &Path, config: &Config) -> StorageResult<Self> {
        Self::open(dir, config.segment.initial_offset, config)
    }

    /// Appends a record and returns its absolute offset.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexFull`] if the index has no room or the
    /// offset space above `base_offset` is exhausted, or any I/O error from
    /// the store.
    pub fn append(&self, record: &[u8]) -> StorageResult<u64> {
        let mut inner = self.inner.lock();

        let full = |index: &Index| StorageError::IndexFull {
            capacity: index.capacity(),
        };
        if inner.index.is_maxed() {
            return Err(full(&inner.index));
        }
        let relative = u32::try_from(inner.next_offset - self.base_offset)
            .map_err(|_| full(&inner.index))?;
        // The offset after this one must still be representable.
        let next = inner
            .next_offset
            .checked_add(1)
            .ok_or_else(|| full(&inner.index))?;

        let (_, pos) = self.store.append(record)?;
        inner.index.write(relative, pos)?;

        let offset = inner.next_offset;
        inner.next_offset = next;
        Ok(offset)
    }

    /// Reads the record at absolute `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OffsetOutOfRange`] if the offset was not
    /// written to this segment, or any error from the index or store.
    pub fn read(&self, offset: u64) -> StorageResult<Vec<u8>> {
        let inner = self.inner.lock();

        if offset < self.base_offset || offset >= inner.next_offset {
            return Err(StorageError::OffsetOutOfRange {
                offset,
                base: self.base_offset,
                next: inner.next_offset,
            });
        }

        // Relative offsets fit in u32, so the selector cannot wrap.
        let (_, pos) = inner.index.read((offset - self.base_offset) as i64)?;
        self.store.read(pos)
    }

    /// Returns true once the store has reached `max_store_bytes` or the index
    /// has no room for another entry.
    #[must_use]
    pub fn is_maxed(&self) -> bool {
        let inner = self.inner.lock();
        self.store.size() >= self.max_store_bytes || inner.index.is_maxed()
    }

    /// Returns the first offset of the segment.
    #[must_use]
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Returns the offset the next append will receive.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.inner.lock().next_offset
    }

    /// Returns the path of the store file.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the path of the index file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.inner.lock().index.name().to_path_buf()
    }

    /// Returns current sizes and limits.
    #[must_use]
    pub fn stats(&self) -> SegmentStats {
        let inner = self.inner.lock();
        let store_bytes = self.store.size();
        SegmentStats {
            base_offset: self.base_offset,
            next_offset: inner.next_offset,
            store_bytes,
            index_entries: inner.index.entries(),
            index_capacity: inner.index.capacity(),
            maxed: store_bytes >= self.max_store_bytes || inner.index.is_maxed(),
        }
    }

    /// Closes the index and then the store.
    ///
    /// Both are closed even if the first fails.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub fn close(self) -> StorageResult<()> {
        let SegmentInner { index, next_offset } = self.inner.into_inner();
        let index_result = index.close();
        let store_result = self.store.close();

        debug!(base_offset = self.base_offset, next_offset, "closed segment");
        index_result.and(store_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ENT_WIDTH;
    use tempfile::tempdir;

    #[test]
    fn offsets_start_at_base() {
        let dir = tempdir().unwrap();
        let segment = Segment::open(dir.path(), 16, &Config::default()).unwrap();

        assert_eq!(segment.next_offset(), 16);
        assert_eq!(segment.append(b"first").unwrap(), 16);
        assert_eq!(segment.append(b"second").unwrap(), 17);
        assert_eq!(segment.next_offset(), 18);

        assert_eq!(segment.read(16).unwrap(), b"first");
        assert_eq!(segment.read(17).unwrap(), b"second");
    }

    #[test]
    fn file_names_use_padded_base_offset() {
        let dir = tempdir().unwrap();
        let segment = Segment::open(dir.path(), 42, &Config::default()).unwrap();

        assert_eq!(
            segment.store_path(),
            dir.path().join("00000000000000000042.store")
        );
        assert_eq!(
            segment.index_path(),
            dir.path().join("00000000000000000042.index")
        );
    }

    #[test]
    fn open_initial_uses_configured_offset() {
        let dir = tempdir().unwrap();
        let config = Config::new().initial_offset(7);
        let segment = Segment::open_initial(dir.path(), &config).unwrap();

        assert_eq!(segment.base_offset(), 7);
        assert_eq!(segment.append(b"x").unwrap(), 7);
    }

    #[test]
    fn read_out_of_range() {
        let dir = tempdir().unwrap();
        let segment = Segment::open(dir.path(), 10, &Config::default()).unwrap();
        segment.append(b"only").unwrap();

        let below = segment.read(9).unwrap_err();
        assert!(matches!(
            below,
            StorageError::OffsetOutOfRange {
                offset: 9,
                base: 10,
                next: 11
            }
        ));
        assert!(segment.read(11).unwrap_err().is_end_of_data());
    }

    #[test]
    fn refuses_append_when_index_full() {
        let dir = tempdir().unwrap();
        let config = Config::new().max_index_bytes(ENT_WIDTH * 2);
        let segment = Segment::open(dir.path(), 0, &config).unwrap();

        segment.append(b"a").unwrap();
        assert!(!segment.is_maxed());
        segment.append(b"b").unwrap();
        assert!(segment.is_maxed());

        let err = segment.append(b"c").unwrap_err();
        assert!(matches!(err, StorageError::IndexFull { .. }));
        assert_eq!(segment.stats().store_bytes, 18);
    }

    #[test]
    fn maxed_by_store_size() {
        let dir = tempdir().unwrap();
        let config = Config::new().max_store_bytes(20);
        let segment = Segment::open(dir.path(), 0, &config).unwrap();

        segment.append(b"0123456789").unwrap();
        assert!(!segment.is_maxed());
        segment.append(b"").unwrap();
        assert!(segment.is_maxed());

        // The store limit is advisory; appends still succeed.
        assert_eq!(segment.append(b"more").unwrap(), 2);
    }

    #[test]
    fn reopen_resumes_offsets() {
        let dir = tempdir().unwrap();

        {
            let segment = Segment::open(dir.path(), 100, &Config::default()).unwrap();
            segment.append(b"one").unwrap();
            segment.append(b"two").unwrap();
            segment.close().unwrap();
        }

        let segment = Segment::open(dir.path(), 100, &Config::default()).unwrap();
        assert_eq!(segment.next_offset(), 102);
        assert_eq!(segment.read(100).unwrap(), b"one");
        assert_eq!(segment.read(101).unwrap(), b"two");
        assert_eq!(segment.append(b"three").unwrap(), 102);
        assert_eq!(segment.read(102).unwrap(), b"three");
    }

    #[test]
    fn reopen_rejects_overflowing_next_offset() {
        let dir = tempdir().unwrap();
        let config = Config::default();

        {
            let mut index = Index::open(&index_path(dir.path(), u64::MAX), &config).unwrap();
            index.write(0, 0).unwrap();
            index.close().unwrap();
        }

        let result = Segment::open(dir.path(), u64::MAX, &config);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn append_refuses_offset_without_successor() {
        let dir = tempdir().unwrap();
        let segment = Segment::open(dir.path(), u64::MAX, &Config::default()).unwrap();

        let result = segment.append(b"last");
        assert!(matches!(result, Err(StorageError::IndexFull { .. })));
        assert_eq!(segment.next_offset(), u64::MAX);
        assert_eq!(segment.stats().store_bytes, 0);
    }

    #[test]
    fn stats_reflect_appends() {
        let dir = tempdir().unwrap();
        let config = Config::new().max_index_bytes(ENT_WIDTH * 4);
        let segment = Segment::open(dir.path(), 5, &config).unwrap();

        segment.append(b"hello").unwrap();
        segment.append(b"hi").unwrap();

        let stats = segment.stats();
        assert_eq!(
            stats,
            SegmentStats {
                base_offset: 5,
                next_offset: 7,
                store_bytes: 23,
                index_entries: 2,
                index_capacity: 48,
                maxed: false,
            }
        );
    }
}
