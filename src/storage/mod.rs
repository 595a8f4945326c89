//! Storage backend contract
//!
//! The engine persists rows through this minimal trait so the inference
//! and loading logic stays independent of any concrete database. The
//! contract is: `ensure_table`, `find_by_hash`, `insert` - plus
//! document-transaction hooks giving the loader its unit of atomicity
//! (one input document).

pub mod memory;

use serde_json::Value;
use thiserror::Error;

use crate::schema_catalog::TableDefinition;

pub use memory::MemoryBackend;

/// Surrogate row identifier assigned by the backend at insert time
pub type RowId = i64;

/// A flat record: ordered column name -> scalar value
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("No table found for `{table}`")]
    UnknownTable { table: String },

    #[error(
        "Foreign key violation on `{table}.{column}`: no row {parent_id} in `{parent_table}`"
    )]
    ForeignKeyViolation {
        table: String,
        column: String,
        parent_table: String,
        parent_id: RowId,
    },

    #[error("Row id {id} already exists in `{table}`")]
    DuplicateRowId { table: String, id: RowId },
}

/// Minimal persistence contract for inferred-schema rows
///
/// Referential integrity is enforced at insert time: a row whose
/// foreign-key column references a missing parent id must be rejected,
/// not deferred.
pub trait StorageBackend {
    /// Create the table if absent, or refresh its definition after
    /// additive schema evolution
    fn ensure_table(&mut self, definition: &TableDefinition) -> Result<(), StorageError>;

    /// Look up a row id by content digest
    fn find_by_hash(&self, table: &str, digest: &str) -> Result<Option<RowId>, StorageError>;

    /// Insert a row, returning its surrogate id
    ///
    /// A row carrying an integer `id` value keeps it as its row id (the
    /// source document named its own key); otherwise the backend assigns
    /// the next free id.
    fn insert(&mut self, table: &str, row: Row) -> Result<RowId, StorageError>;

    /// Whether a row with the given id exists
    fn contains(&self, table: &str, id: RowId) -> Result<bool, StorageError>;

    fn row_count(&self, table: &str) -> Result<usize, StorageError>;

    /// Open the transaction bracketing one input document
    fn begin_document(&mut self);

    /// Commit the current document's writes
    fn commit_document(&mut self);

    /// Undo the current document's writes
    fn rollback_document(&mut self);

    /// Flush buffered writes (batch boundary); no-op by default
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}
