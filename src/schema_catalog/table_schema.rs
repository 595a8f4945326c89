//! Table definition value objects
//!
//! A `TableDefinition` is the generic, runtime-built replacement for a
//! per-table compiled type: an ordered column list plus foreign-key
//! metadata, identified by a lowercase name derived from the JSON key it
//! was discovered under.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::column_type::{infer_column_type, ColumnType};

/// Surrogate primary key column present on every table
pub const ID_COLUMN: &str = "id";
/// Creation timestamp column present on every table
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Modification timestamp column present on every table
pub const UPDATED_AT_COLUMN: &str = "updated_at";
/// Unique content-hash column used for deduplication
pub const HASH_COLUMN: &str = "hash";

/// A single column of a discovered table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
}

impl ColumnDef {
    fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.into(),
            column_type,
            nullable: true,
            unique: false,
        }
    }
}

/// A foreign-key column referencing another table's surrogate id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Column on this table holding the reference
    pub column: String,
    /// Table whose `id` column the reference points at
    pub references_table: String,
}

/// Definition of a discovered table
///
/// Always carries the surrogate `id`, `created_at`/`updated_at`
/// timestamps, and the unique `hash` column; tables discovered as nested
/// children additionally carry a nullable `<parent>_id` foreign key.
/// Column evolution is additive: columns found in later samples are
/// appended, but an existing column is never removed or retyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl TableDefinition {
    /// Create a definition seeded from a sample document
    ///
    /// Fields named in `relationship_fields` become child tables rather
    /// than columns and are skipped here; nested values outside that set
    /// (scalar lists, irregular substructures) stay inline as json
    /// columns.
    pub fn from_sample(
        name: &str,
        sample: &serde_json::Map<String, Value>,
        parent: Option<&str>,
        relationship_fields: &HashSet<String>,
        long_text_threshold: usize,
    ) -> Self {
        let mut def = TableDefinition {
            name: name.to_string(),
            columns: vec![
                ColumnDef {
                    name: ID_COLUMN.to_string(),
                    column_type: ColumnType::Integer,
                    nullable: false,
                    unique: true,
                },
                ColumnDef::new(CREATED_AT_COLUMN, ColumnType::Timestamp),
                ColumnDef::new(UPDATED_AT_COLUMN, ColumnType::Timestamp),
                ColumnDef {
                    name: HASH_COLUMN.to_string(),
                    column_type: ColumnType::String,
                    nullable: true,
                    unique: true,
                },
            ],
            foreign_keys: Vec::new(),
        };

        if let Some(parent) = parent {
            def.add_foreign_key(parent);
        }

        def.absorb_sample(sample, relationship_fields, long_text_threshold);
        def
    }

    /// Create an empty junction table linking two tables by id
    pub fn junction(name: &str, left_table: &str, right_table: &str) -> Self {
        let mut def = TableDefinition {
            name: name.to_string(),
            columns: vec![
                ColumnDef {
                    name: ID_COLUMN.to_string(),
                    column_type: ColumnType::Integer,
                    nullable: false,
                    unique: true,
                },
                ColumnDef::new(CREATED_AT_COLUMN, ColumnType::Timestamp),
                ColumnDef::new(UPDATED_AT_COLUMN, ColumnType::Timestamp),
                ColumnDef {
                    name: HASH_COLUMN.to_string(),
                    column_type: ColumnType::String,
                    nullable: true,
                    unique: true,
                },
            ],
            foreign_keys: Vec::new(),
        };
        def.add_foreign_key(left_table);
        def.add_foreign_key(right_table);
        def
    }

    /// Add columns found in `sample` that are not yet present
    ///
    /// Additive schema evolution: never removes or retypes a column.
    pub fn absorb_sample(
        &mut self,
        sample: &serde_json::Map<String, Value>,
        relationship_fields: &HashSet<String>,
        long_text_threshold: usize,
    ) {
        for (key, value) in sample {
            if relationship_fields.contains(key) {
                continue;
            }
            if !self.has_column(key) {
                self.columns
                    .push(ColumnDef::new(key, infer_column_type(value, long_text_threshold)));
            }
        }
    }

    /// Register a nullable foreign-key column `<table>_id` referencing `table`
    pub fn add_foreign_key(&mut self, table: &str) {
        let column = foreign_key_column(table);
        if self.has_column(&column) {
            return;
        }
        self.columns.push(ColumnDef::new(&column, ColumnType::Integer));
        self.foreign_keys.push(ForeignKeyDef {
            column,
            references_table: table.to_string(),
        });
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Derive a table name from a JSON key
///
/// Keys are lowercased and whitespace is folded to underscores so the
/// same field always re-derives the same table name.
pub fn table_name_from_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Foreign-key column name for a reference to `table`
pub fn foreign_key_column(table: &str) -> String {
    format!("{}_id", table)
}
