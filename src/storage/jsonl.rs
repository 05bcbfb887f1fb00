//! JSON Lines record sink

use crate::extract::JobRecord;
use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Appends one JSON object per line, flushing after every record
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Opens `path` for appending, creating it if needed
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl RecordSink for JsonlSink {
    fn append(&self, record: &JobRecord) -> StorageResult<()> {
        let line = serde_json::to_string(record)?;

        let mut writer = self.writer.lock().map_err(|_| StorageError::Poisoned)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
