//! Inspect command implementation.

use super::Target;
use seglog_storage::{Segment, SegmentStats};
use serde::Serialize;

/// Segment inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Segment directory.
    pub dir: String,
    /// First offset of the segment.
    pub base_offset: u64,
    /// Offset the next append will receive.
    pub next_offset: u64,
    /// Number of records in the segment.
    pub record_count: u64,
    /// Store size in bytes.
    pub store_bytes: u64,
    /// Store size at which the segment counts as full.
    pub max_store_bytes: u64,
    /// Bytes of index entries.
    pub index_bytes: u64,
    /// Index capacity in bytes.
    pub index_capacity: u64,
    /// Whether either limit has been reached.
    pub maxed: bool,
}

impl InspectResult {
    fn new(target: &Target, stats: SegmentStats) -> Self {
        Self {
            dir: target.dir().display().to_string(),
            base_offset: stats.base_offset,
            next_offset: stats.next_offset,
            record_count: stats.next_offset - stats.base_offset,
            store_bytes: stats.store_bytes,
            max_store_bytes: target.config().segment.max_store_bytes,
            index_bytes: stats.index_entries * seglog_storage::ENT_WIDTH,
            index_capacity: stats.index_capacity,
            maxed: stats.maxed,
        }
    }
}

/// Runs the inspect command.
pub fn run(target: &Target, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    target.require_existing()?;

    let segment = Segment::open(target.dir(), target.base_offset(), target.config())?;
    let result = InspectResult::new(target, segment.stats());
    segment.close()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Segment: {}", result.dir);
    println!("================");
    println!();
    println!(
        "Offsets:  [{}, {}) ({} records)",
        result.base_offset, result.next_offset, result.record_count
    );
    println!(
        "Store:    {} / {} bytes",
        result.store_bytes, result.max_store_bytes
    );
    println!(
        "Index:    {} / {} bytes",
        result.index_bytes, result.index_capacity
    );
    println!("Maxed:    {}", if result.maxed { "yes" } else { "no" });
}
