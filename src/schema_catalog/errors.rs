//! # Schema Catalog Error Types
//!
//! Error handling for table discovery, relationship registration, and
//! catalog lookups.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("No table definition found for `{table}`")]
    UnknownTable { table: String },
    #[error("Self-referential relationship rejected for table `{table}` (field `{field}`)")]
    SelfReferential { table: String, field: String },
}
