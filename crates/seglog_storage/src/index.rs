//! Memory-mapped offset index.
//!
//! ## Entry Format
//!
//! ```text
//! | relative_offset (4, big-endian) | position (8, big-endian) |
//! ```
//!
//! The relative offset counts records from the segment's base offset. The
//! position is the byte position of the record in the segment's store.
//!
//! While open, the file is grown to the configured capacity and mapped in
//! full. On close it is truncated back to the populated entries, so the file
//! on disk only ever holds real entries.

use crate::config::Config;
use crate::error::{StorageError, StorageResult};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bytes used for the relative offset of an entry.
pub const OFF_WIDTH: u64 = 4;

/// Bytes used for the store position of an entry.
pub const POS_WIDTH: u64 = 8;

/// Total width of one index entry.
pub const ENT_WIDTH: u64 = OFF_WIDTH + POS_WIDTH;

/// A fixed-capacity table of `(relative_offset, position)` entries.
///
/// Lookups read straight from the mapped region, with no file I/O.
///
/// # Thread Safety
///
/// The index does no locking of its own. Writes take `&mut self`; a caller
/// sharing an index across threads must wrap it, which is what
/// [`Segment`](crate::Segment) does.
///
/// # Teardown
///
/// [`close`](Self::close) flushes the map, syncs the file and truncates it to
/// the used size. Dropping an index without closing it runs the same steps
/// and logs any failure, since drop cannot report it.
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    file: File,
    mmap: MmapMut,
    /// Bytes of populated entries. Always a multiple of [`ENT_WIDTH`].
    size: u64,
    /// Mapped length, fixed at open.
    capacity: u64,
    closed: bool,
}

impl Index {
    /// Opens or creates an index at `path` with the configured capacity.
    ///
    /// The used size is taken from the file's current length, then the file
    /// is grown to `config.segment.max_index_bytes` and mapped read/write.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the capacity cannot hold a single entry or cannot be mapped
    /// - the existing file length is not a whole number of entries
    /// - the existing file holds more entries than the capacity
    /// - an I/O error occurs while opening, growing, or mapping the file
    pub fn open(path: &Path, config: &Config) -> StorageResult<Self> {
        let capacity = config.segment.max_index_bytes;
        if capacity < ENT_WIDTH {
            return Err(StorageError::InvalidConfig(format!(
                "max_index_bytes {capacity} cannot hold one {ENT_WIDTH}-byte entry"
            )));
        }
        if usize::try_from(capacity).is_err() {
            return Err(StorageError::InvalidConfig(format!(
                "max_index_bytes {capacity} exceeds the addressable size"
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();
        if size % ENT_WIDTH != 0 {
            return Err(StorageError::Corrupted(format!(
                "index {} has length {size}, not a multiple of {ENT_WIDTH}",
                path.display()
            )));
        }
        if size > capacity {
            return Err(StorageError::InvalidConfig(format!(
                "index {} holds {size} bytes but max_index_bytes is {capacity}",
                path.display()
            )));
        }

        let mmap = grow_and_map(&file, size, capacity, map_shared)?;

        debug!(path = %path.display(), size, capacity, "opened index");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap,
            size,
            capacity,
            closed: false,
        })
    }

    /// Reads an entry.
    ///
    /// `selector` is the zero-based entry number, or `-1` for the last entry.
    /// Returns the stored relative offset and store position.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EntryNotFound`] if the index is empty or the
    /// selected entry has not been written.
    pub fn read(&self, selector: i64) -> StorageResult<(u32, u64)> {
        let entries = self.entries();
        let not_found = || StorageError::EntryNotFound { selector, entries };

        if self.size == 0 {
            return Err(not_found());
        }

        let entry = match selector {
            -1 => entries - 1,
            s => u64::try_from(s).map_err(|_| not_found())?,
        };

        if entry >= entries {
            return Err(not_found());
        }

        let start = (entry * ENT_WIDTH) as usize;
        let bytes = &self.mmap[start..start + ENT_WIDTH as usize];
        Ok(decode_entry(bytes))
    }

    /// Appends an entry after the last populated one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexFull`] if there is no room for another
    /// entry. The owner is expected to move on to a new segment.
    pub fn write(&mut self, relative_offset: u32, position: u64) -> StorageResult<()> {
        if self.is_maxed() {
            return Err(StorageError::IndexFull {
                capacity: self.capacity,
            });
        }

        let start = self.size as usize;
        let off_end = start + OFF_WIDTH as usize;
        let ent_end = start + ENT_WIDTH as usize;
        self.mmap[start..off_end].copy_from_slice(&relative_offset.to_be_bytes());
        self.mmap[off_end..ent_end].copy_from_slice(&position.to_be_bytes());
        self.size += ENT_WIDTH;

        Ok(())
    }

    /// Returns true if another entry would not fit.
    #[must_use]
    pub fn is_maxed(&self) -> bool {
        self.capacity - self.size < ENT_WIDTH
    }

    /// Returns the path to the backing file.
    #[must_use]
    pub fn name(&self) -> &Path {
        &self.path
    }

    /// Returns the bytes of populated entries.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the mapped capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the number of entries written.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.size / ENT_WIDTH
    }

    /// Flushes the map, syncs the file, truncates it to the used size, and
    /// closes it.
    ///
    /// # Errors
    ///
    /// Returns the first failing step. The file may then be left padded or
    /// unsynced and needs outside recovery before it is reopened.
    pub fn close(mut self) -> StorageResult<()> {
        self.closed = true;
        self.finish()
    }

    fn finish(&mut self) -> StorageResult<()> {
        self.mmap.flush()?;
        self.file.sync_all()?;
        self.file.set_len(self.size)?;

        debug!(path = %self.path.display(), size = self.size, "closed index");
        Ok(())
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.finish() {
            warn!(path = %self.path.display(), error = %e, "index dropped without close and teardown failed");
        }
    }
}

#[allow(unsafe_code)]
fn map_shared(file: &File) -> io::Result<MmapMut> {
    // SAFETY: the index owns `file` for the life of the map and only shrinks
    // it in `finish`, after which the map is never read or written again.
    // Every access goes through a bounds check against `size`, which never
    // exceeds the mapped length.
    unsafe { MmapMut::map_mut(file) }
}

/// Grows `file` to `capacity` and maps it, shrinking it back to `size` if
/// the map cannot be created.
fn grow_and_map(
    file: &File,
    size: u64,
    capacity: u64,
    map: fn(&File) -> io::Result<MmapMut>,
) -> io::Result<MmapMut> {
    file.set_len(capacity)?;
    match map(file) {
        Ok(mmap) => Ok(mmap),
        Err(e) => {
            if let Err(restore) = file.set_len(size) {
                warn!(error = %restore, size, "failed to restore index length after map error");
            }
            Err(e)
        }
    }
}

fn decode_entry(bytes: &[u8]) -> (u32, u64) {
    let mut off = [0u8; OFF_WIDTH as usize];
    let mut pos = [0u8; POS_WIDTH as usize];
    off.copy_from_slice(&bytes[..OFF_WIDTH as usize]);
    pos.copy_from_slice(&bytes[OFF_WIDTH as usize..ENT_WIDTH as usize]);
    (u32::from_be_bytes(off), u64::from_be_bytes(pos))
}
