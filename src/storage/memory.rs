//! In-memory record sink for tests and library callers

use crate::extract::JobRecord;
use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use std::sync::Mutex;

/// Keeps every appended record in a vector
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<JobRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records appended so far
    pub fn records(&self) -> Vec<JobRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.records.lock() {
            Ok(records) => records.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn append(&self, record: &JobRecord) -> StorageResult<()> {
        let mut records = self.records.lock().map_err(|_| StorageError::Poisoned)?;
        records.push(record.clone());
        Ok(())
    }
}
