//! # Ingestion Error Types
//!
//! Taxonomy of per-document failures. None of these abort the run: the
//! engine records the failure, rolls the document back, and continues.
//! Only configuration errors (unreadable input directory) are fatal at
//! startup.

use thiserror::Error;

use crate::config::ConfigError;
use crate::schema_catalog::CatalogError;
use crate::storage::{RowId, StorageError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed JSON in document {label}: {source}")]
    Parse {
        label: String,
        source: serde_json::Error,
    },

    #[error("I/O failure reading {path} after {attempts} attempt(s): {source}")]
    Io {
        path: String,
        attempts: usize,
        source: std::io::Error,
    },

    #[error("Document root must be an object or an array of objects")]
    UnsupportedRoot,

    #[error("Document nesting exceeds the configured depth bound ({max_depth})")]
    DepthExceeded { max_depth: usize },

    #[error(
        "Referential integrity failure inserting into `{table}`: no parent row {parent_id} in `{parent_table}`"
    )]
    Integrity {
        table: String,
        parent_table: String,
        parent_id: RowId,
    },

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ForeignKeyViolation {
                table,
                parent_table,
                parent_id,
                ..
            } => IngestError::Integrity {
                table,
                parent_table,
                parent_id,
            },
            other => IngestError::Storage(other),
        }
    }
}
