//! Append-only record store.
//!
//! ## Record Format
//!
//! ```text
//! | length (8, big-endian) | payload (length) |
//! ```
//!
//! There is no checksum and no header beyond the length. Integrity belongs
//! to the layers above.

use crate::error::StorageResult;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of bytes used to encode a record's length.
pub const LEN_WIDTH: u64 = 8;

/// An append-only file of length-prefixed records.
///
/// Appends go through an in-process [`BufWriter`], so a record may sit in
/// memory until the next read, [`flush`](Self::flush), or
/// [`close`](Self::close). Every read flushes first, so reads always see
/// prior appends.
///
/// # Thread Safety
///
/// One mutex guards the writer and the size counter. `append`, `read` and
/// `read_at` never run concurrently on the same store.
///
/// # Example
///
/// ```no_run
/// use seglog_storage::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("00000000000000000000.store")).unwrap();
/// let (written, pos) = store.append(b"hello").unwrap();
/// assert_eq!(written, 13);
/// assert_eq!(store.read(pos).unwrap(), b"hello");
/// store.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    buf: BufWriter<File>,
    /// Durable plus buffered length of the file.
    size: u64,
}

impl Store {
    /// Opens or creates a store at the given path.
    ///
    /// The file is opened for reading and appending. Existing records are
    /// kept and new records go after them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "opened store");

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(StoreInner {
                buf: BufWriter::new(file),
                size,
            }),
        })
    }

    /// Opens or creates a store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Appends one record.
    ///
    /// Returns the number of bytes written (`8 + payload.len()`) and the
    /// position the record starts at.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the buffered write fails. The size
    /// counter is left untouched in that case, but part of the frame may
    /// already sit in the write buffer, so the store must be treated as
    /// unusable after an append error.
    pub fn append(&self, payload: &[u8]) -> StorageResult<(u64, u64)> {
        let mut inner = self.inner.lock();

        let pos = inner.size;
        inner.buf.write_all(&(payload.len() as u64).to_be_bytes())?;
        inner.buf.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        Ok((written, pos))
    }

    /// Reads the record starting at `pos`.
    ///
    /// # Errors
    ///
    /// Returns an [`io::ErrorKind::UnexpectedEof`] error if `pos` does not
    /// start a complete record inside the store, or any other I/O error from
    /// the flush or the read.
    pub fn read(&self, pos: u64) -> StorageResult<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;
        let size = inner.size;

        let file = inner.buf.get_mut();
        file.seek(SeekFrom::Start(pos))?;

        let mut len_bytes = [0u8; LEN_WIDTH as usize];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_be_bytes(len_bytes);

        // A garbage length must not turn into a huge allocation.
        let in_bounds = match pos.checked_add(LEN_WIDTH).and_then(|s| s.checked_add(len)) {
            Some(end) => end <= size,
            None => false,
        };
        if !in_bounds {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record at {pos} with length {len} extends past store size {size}"),
            )
            .into());
        }

        let len = usize::try_from(len).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "record length exceeds usize")
        })?;
        let mut record = vec![0u8; len];
        file.read_exact(&mut record)?;

        Ok(record)
    }

    /// Reads raw bytes at `offset` into `buf`, flushing pending appends first.
    ///
    /// Either fills `buf` completely or fails; a read that runs into the end
    /// of the file is never reported as a short success.
    ///
    /// # Errors
    ///
    /// Returns an [`io::ErrorKind::UnexpectedEof`] error if fewer than
    /// `buf.len()` bytes exist at `offset`, or any other I/O error from the
    /// flush, seek, or read.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;

        let file = inner.buf.get_mut();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        if filled < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at {offset} hit end of store after {filled}",
                    buf.len()
                ),
            )
            .into());
        }

        Ok(filled)
    }

    /// Pushes buffered records to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> StorageResult<()> {
        self.inner.lock().buf.flush()?;
        Ok(())
    }

    /// Flushes buffered records and syncs the file to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the sync fails.
    pub fn sync(&self) -> StorageResult<()> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;
        inner.buf.get_ref().sync_all()?;
        Ok(())
    }

    /// Returns the size of the store in bytes, buffered records included.
    ///
    /// This is the position the next append will write at.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Returns the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes buffered records and closes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn close(self) -> StorageResult<()> {
        let StoreInner { buf, size } = self.inner.into_inner();
        let file = buf.into_inner().map_err(|e| e.into_error())?;
        drop(file);

        debug!(path = %self.path.display(), size, "closed store");
        Ok(())
    }
}
