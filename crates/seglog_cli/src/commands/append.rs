//! Append command implementation.

use super::Target;
use seglog_storage::Segment;
use tracing::{info, warn};

/// Runs the append command.
pub fn run(target: &Target, values: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    info!("Appending {} records to {:?}", values.len(), target.dir());

    let segment = Segment::open(target.dir(), target.base_offset(), target.config())?;
    let offsets = append_values(&segment, values);
    let maxed = segment.is_maxed();
    segment.close()?;

    let offsets = offsets?;
    for (offset, value) in offsets.iter().zip(values) {
        println!("[{:08}] {}", offset, value);
    }
    if maxed {
        warn!("Segment {} is full", target.base_offset());
    }

    Ok(())
}

fn append_values(
    segment: &Segment,
    values: &[String],
) -> Result<Vec<u64>, seglog_storage::StorageError> {
    values
        .iter()
        .map(|value| segment.append(value.as_bytes()))
        .collect()
}
