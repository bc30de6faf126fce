//! Verify command implementation.

use super::Target;
use seglog_storage::{Index, Store, LEN_WIDTH};

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of index entries checked.
    pub entries_checked: u64,
    /// Number of entries pointing at a readable record.
    pub valid_records: u64,
    /// Store size in bytes.
    pub store_bytes: u64,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            entries_checked: 0,
            valid_records: 0,
            store_bytes: 0,
            errors: Vec::new(),
        }
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    target.require_existing()?;
    println!("Verifying segment {} in {:?}", target.base_offset(), target.dir());
    println!();

    let store = Store::open(&target.store_path())?;
    let index = Index::open(&target.index_path(), target.config())?;

    let result = verify_segment(&store, &index);

    index.close()?;
    store.close()?;

    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Segment verification passed");
        Ok(())
    } else {
        println!("✗ Segment verification failed");
        Err("Verification failed".into())
    }
}

/// Walks every index entry and checks it against the store.
///
/// Entries must carry relative offsets `0..n` in order and point at
/// contiguous records that together fill the store exactly.
pub fn verify_segment(store: &Store, index: &Index) -> VerifyResult {
    let mut result = VerifyResult::new();
    result.store_bytes = store.size();

    let mut expected_pos = 0u64;
    for entry in 0..index.entries() {
        result.entries_checked += 1;

        let (relative, pos) = match index.read(entry as i64) {
            Ok(e) => e,
            Err(e) => {
                result
                    .errors
                    .push(format!("Failed to read index entry {entry}: {e}"));
                break;
            }
        };

        if u64::from(relative) != entry {
            result.errors.push(format!(
                "Entry {entry} has relative offset {relative}, expected {entry}"
            ));
        }
        if pos != expected_pos {
            result.errors.push(format!(
                "Entry {entry} points at position {pos}, expected {expected_pos}"
            ));
        }

        match store.read(pos) {
            Ok(record) => {
                result.valid_records += 1;
                expected_pos = pos + LEN_WIDTH + record.len() as u64;
            }
            Err(e) => {
                result
                    .errors
                    .push(format!("Entry {entry} record at {pos} unreadable: {e}"));
                break;
            }
        }
    }

    if result.errors.is_empty() && expected_pos != result.store_bytes {
        result.errors.push(format!(
            "Store has {} bytes not covered by the index",
            result.store_bytes.saturating_sub(expected_pos)
        ));
    }

    result
}

fn print_result(result: &VerifyResult) {
    println!("  Entries checked: {}", result.entries_checked);
    println!("  Valid records:   {}", result.valid_records);
    println!("  Store bytes:     {}", result.store_bytes);

    if !result.errors.is_empty() {
        println!("  Errors:");
        for error in &result.errors {
            println!("    - {}", error);
        }
    }
}
