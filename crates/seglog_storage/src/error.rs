//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    ///
    /// Reading a record past the end of the store surfaces here with
    /// [`io::ErrorKind::UnexpectedEof`].
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested index entry has not been written.
    #[error("no index entry for selector {selector} ({entries} entries written)")]
    EntryNotFound {
        /// The selector passed to the read (`-1` means "last entry").
        selector: i64,
        /// The number of entries currently in the index.
        entries: u64,
    },

    /// The index has no room for another entry.
    #[error("index is full: capacity {capacity} bytes")]
    IndexFull {
        /// The mapped capacity of the index in bytes.
        capacity: u64,
    },

    /// The requested offset does not belong to the segment.
    #[error("offset {offset} out of range: segment covers [{base}, {next})")]
    OffsetOutOfRange {
        /// The requested absolute offset.
        offset: u64,
        /// The first offset of the segment.
        base: u64,
        /// The offset the next append will receive.
        next: u64,
    },

    /// A backing file has an impossible layout.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The configuration cannot be honoured.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// Returns true if this error means "no data here yet".
    ///
    /// Covers missing index entries, segment lookups outside the written
    /// range, and short reads from the store. Callers decide from context
    /// whether that means "not yet written" or "stale reference".
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        match self {
            Self::EntryNotFound { .. } | Self::OffsetOutOfRange { .. } => true,
            Self::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_data_classification() {
        assert!(StorageError::EntryNotFound {
            selector: -1,
            entries: 0
        }
        .is_end_of_data());
        assert!(StorageError::OffsetOutOfRange {
            offset: 9,
            base: 0,
            next: 3
        }
        .is_end_of_data());
        assert!(StorageError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)).is_end_of_data());

        assert!(!StorageError::IndexFull { capacity: 12 }.is_end_of_data());
        assert!(!StorageError::Io(io::Error::from(io::ErrorKind::PermissionDenied)).is_end_of_data());
        assert!(!StorageError::Corrupted("bad".into()).is_end_of_data());
    }

    #[test]
    fn display_messages() {
        let err = StorageError::IndexFull { capacity: 36 };
        assert_eq!(err.to_string(), "index is full: capacity 36 bytes");

        let err = StorageError::OffsetOutOfRange {
            offset: 2,
            base: 5,
            next: 7,
        };
        assert_eq!(
            err.to_string(),
            "offset 2 out of range: segment covers [5, 7)"
        );
    }
}
