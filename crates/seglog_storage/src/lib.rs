//! # Seglog Storage
//!
//! The storage primitive underneath a segmented, append-only commit log.
//!
//! A segment is made of two files:
//!
//! - a [`Store`] that appends length-prefixed records and reads them back
//!   by byte position, and
//! - an [`Index`] that maps a record's offset, relative to the segment's
//!   base offset, to its byte position in the store. The index is a
//!   memory-mapped table of fixed-width entries, so a lookup is a bounds
//!   check and two loads.
//!
//! [`Segment`] drives one of each under a single lock and hands out
//! absolute offsets. Creating further segments, rotating, replication and
//! compaction belong to the layers above.
//!
//! ## Example
//!
//! ```rust
//! use seglog_storage::{Config, Index, Store};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = Store::open(&dir.path().join("0.store")).unwrap();
//! let mut index = Index::open(&dir.path().join("0.index"), &Config::default()).unwrap();
//!
//! let (_, pos) = store.append(b"hello").unwrap();
//! index.write(0, pos).unwrap();
//!
//! let (_, pos) = index.read(0).unwrap();
//! assert_eq!(store.read(pos).unwrap(), b"hello");
//!
//! index.close().unwrap();
//! store.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod index;
mod segment;
mod store;

pub use config::{Config, SegmentConfig};
pub use error::{StorageError, StorageResult};
pub use index::{Index, ENT_WIDTH, OFF_WIDTH, POS_WIDTH};
pub use segment::{
    index_path, store_path, Segment, SegmentStats, INDEX_EXTENSION, STORE_EXTENSION,
};
pub use store::{Store, LEN_WIDTH};
