//! Record sink trait and error types

use crate::extract::JobRecord;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record already stored: {0}")]
    Duplicate(String),

    #[error("Sink lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for emitted job records
///
/// Appends may come from several workers at once, so implementations
/// synchronize internally. Ordering between appends is not guaranteed.
pub trait RecordSink: Send + Sync {
    /// Durably stores one record
    ///
    /// Returns [`StorageError::Duplicate`] when the sink already holds a
    /// record for the same URL and enforces uniqueness.
    fn append(&self, record: &JobRecord) -> StorageResult<()>;
}
