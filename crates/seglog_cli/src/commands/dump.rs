//! Dump command implementation.

use super::Target;
use seglog_storage::{Index, StorageError, Store};
use serde::Serialize;

/// Bytes of each record shown in the preview.
const PREVIEW_LEN: usize = 32;

/// Record representation for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Absolute offset of the record.
    pub offset: u64,
    /// Byte position of the record in the store.
    pub position: u64,
    /// Payload length in bytes.
    pub length: usize,
    /// Start of the payload, as text if printable and hex otherwise.
    pub preview: String,
}

/// Runs the dump command.
pub fn run(
    target: &Target,
    start_offset: Option<u64>,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    target.require_existing()?;

    let store = Store::open(&target.store_path())?;
    let index = Index::open(&target.index_path(), target.config())?;

    let start = start_offset.unwrap_or(target.base_offset());
    let records = read_records(&store, &index, target.base_offset(), start, limit);

    index.close()?;
    store.close()?;
    let records = records?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records);
        }
    }

    Ok(())
}

/// Reads up to `limit` records starting at absolute offset `start`.
pub fn read_records(
    store: &Store,
    index: &Index,
    base_offset: u64,
    start: u64,
    limit: Option<usize>,
) -> Result<Vec<RecordInfo>, StorageError> {
    let max_records = limit.unwrap_or(usize::MAX);
    let first = start.saturating_sub(base_offset);
    let mut records = Vec::new();

    for entry in first..index.entries() {
        if records.len() >= max_records {
            break;
        }

        let (relative, position) = index.read(entry as i64)?;
        let payload = store.read(position)?;

        records.push(RecordInfo {
            offset: base_offset + u64::from(relative),
            position,
            length: payload.len(),
            preview: preview(&payload),
        });
    }

    Ok(records)
}

fn preview(payload: &[u8]) -> String {
    let head = &payload[..payload.len().min(PREVIEW_LEN)];
    let mut text = match std::str::from_utf8(head) {
        Ok(s) if !s.chars().any(char::is_control) => s.to_string(),
        _ => hex_encode(head),
    };
    if payload.len() > PREVIEW_LEN {
        text.push_str("...");
    }
    text
}

fn print_text_output(records: &[RecordInfo]) {
    println!("Records ({} total)", records.len());
    println!("================");
    println!();

    for record in records {
        println!(
            "[{:08}] pos={} len={} {}",
            record.offset, record.position, record.length, record.preview
        );
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use seglog_storage::Config;
    use tempfile::tempdir;

    #[test]
    fn reads_from_start_with_limit() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("10.store")).unwrap();
        let mut index = Index::open(&dir.path().join("10.index"), &Config::default()).unwrap();

        for (i, record) in [&b"zero"[..], b"one", b"two", b"three"].iter().enumerate() {
            let (_, pos) = store.append(record).unwrap();
            index.write(i as u32, pos).unwrap();
        }

        let records = read_records(&store, &index, 10, 11, Some(2)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 11);
        assert_eq!(records[0].position, 12);
        assert_eq!(records[0].preview, "one");
        assert_eq!(records[1].offset, 12);
        assert_eq!(records[1].length, 3);
    }

    #[test]
    fn start_past_end_is_empty() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();
        let index = Index::open(&dir.path().join("0.index"), &Config::default()).unwrap();

        assert!(read_records(&store, &index, 0, 5, None).unwrap().is_empty());
    }

    #[test]
    fn preview_formats() {
        assert_eq!(preview(b"plain text"), "plain text");
        assert_eq!(preview(&[0x00, 0xff]), "00ff");
        assert_eq!(preview(&[b'a'; 40]), format!("{}...", "a".repeat(32)));
    }
}
