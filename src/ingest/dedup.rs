//! Content-addressed record deduplication
//!
//! A record's digest is SHA-256 over the canonical (stably key-ordered)
//! serialization of its scalar fields. Nested object/array values are
//! excluded, and system columns are stamped only after hashing, so
//! re-processing the same logical record always reproduces the same
//! digest regardless of field order or processing time.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::schema_catalog::table_schema::{CREATED_AT_COLUMN, HASH_COLUMN, UPDATED_AT_COLUMN};
use crate::storage::{Row, RowId, StorageBackend, StorageError};

pub struct Deduplicator;

impl Deduplicator {
    /// Compute the content digest of a record's scalar fields
    pub fn digest(record: &Row) -> String {
        let canonical: BTreeMap<&str, &Value> = record
            .iter()
            .filter(|(_, value)| !matches!(value, Value::Object(_) | Value::Array(_)))
            .map(|(key, value)| (key.as_str(), value))
            .collect();

        let payload =
            serde_json::to_string(&canonical).expect("scalar JSON fields always serialize");
        hex::encode(Sha256::digest(payload.as_bytes()))
    }

    /// Insert a record unless a row with the same digest already exists
    ///
    /// Returns the row id and whether a new row was written. On a digest
    /// hit the existing id is returned without mutation, making replay of
    /// an unchanged corpus a no-op at the row level.
    pub fn insert_if_absent<S: StorageBackend>(
        storage: &mut S,
        table: &str,
        mut record: Row,
    ) -> Result<(RowId, bool), StorageError> {
        let digest = Self::digest(&record);

        if let Some(existing) = storage.find_by_hash(table, &digest)? {
            log::debug!("Duplicate record in `{}` (row {})", table, existing);
            return Ok((existing, false));
        }

        let now = chrono::Utc::now().to_rfc3339();
        record.insert(HASH_COLUMN.to_string(), Value::String(digest));
        record.insert(CREATED_AT_COLUMN.to_string(), Value::String(now.clone()));
        record.insert(UPDATED_AT_COLUMN.to_string(), Value::String(now));

        let id = storage.insert(table, record)?;
        Ok((id, true))
    }
}
