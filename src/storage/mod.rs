//! Storage module for persisting emitted job records
//!
//! Records go to a [`RecordSink`]. Two durable sinks are provided:
//! - JSON Lines, one record per line (the default)
//! - SQLite, a `jobs` table with a unique `url` column
//!
//! [`MemorySink`] keeps records in memory for tests and embedding.

mod jsonl;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use jsonl::JsonlSink;
pub use memory::MemorySink;
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteSink;
pub use traits::{RecordSink, StorageError, StorageResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;
use std::sync::Arc;

/// Opens the sink selected by the output configuration
pub fn open_sink(output: &OutputConfig) -> StorageResult<Arc<dyn RecordSink>> {
    let path = Path::new(&output.records_path);
    tracing::debug!("Opening {} sink at {}", output.format, path.display());

    Ok(match output.format {
        OutputFormat::Jsonl => Arc::new(JsonlSink::new(path)?),
        OutputFormat::Sqlite => Arc::new(SqliteSink::new(path)?),
    })
}
