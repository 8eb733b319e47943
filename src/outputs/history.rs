//! Append-only search history on disk.
//!
//! The file holds a single JSON array. Every completed search appends one
//! [`HistoryRecord`] and rewrites the file pretty-printed.
//!
//! # Recovery
//!
//! A missing file starts a new array. A file that cannot be read or does not
//! parse as a JSON array is logged and replaced; earlier entries are lost.

use crate::models::HistoryRecord;
use serde_json::Value;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Append `record` to the JSON array stored at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), keyword = %record.keyword))]
pub async fn append_record(path: &Path, record: &HistoryRecord) -> Result<(), Box<dyn Error>> {
    let mut entries = read_entries(path).await;
    entries.push(serde_json::to_value(record)?);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(path, json).await?;
    info!(entries = entries.len(), "Wrote search history");
    Ok(())
}

async fn read_entries(path: &Path) -> Vec<Value> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "History file unreadable; starting over");
            return Vec::new();
        }
    };
    serde_json::from_str::<Vec<Value>>(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "History file is not a JSON array; starting over");
        Vec::new()
    })
}
