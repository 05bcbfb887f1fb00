//! SQLite record sink

use crate::extract::JobRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::Mutex;

/// Stores records in a `jobs` table with a unique `url` column
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored records
    pub fn count(&self) -> StorageResult<usize> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All stored records in insertion order
    pub fn records(&self) -> StorageResult<Vec<JobRecord>> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let mut stmt = conn.prepare("SELECT payload FROM jobs ORDER BY id")?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(StorageError::from))
            .collect()
    }
}

impl RecordSink for SqliteSink {
    fn append(&self, record: &JobRecord) -> StorageResult<()> {
        let payload = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let result = conn.execute(
            "INSERT INTO jobs (url, title, company, email, location, expiration_date, external_id, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.url,
                record.title,
                record.company,
                record.email,
                record.location,
                record.expiration_date,
                record.external_id,
                payload,
                now
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::Duplicate(record.url.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
