//! In-memory reference backend
//!
//! Holds rows in per-table maps with a digest index for dedup lookups.
//! Document transactions are journaled: every insert records an undo
//! entry, and rollback removes the journaled rows again. Rows keep an
//! integer source `id` when the document carried one; assigned ids are
//! monotonic per table and never reused, so a rolled-back document
//! leaves id gaps rather than ambiguity.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::{Row, RowId, StorageBackend, StorageError};
use crate::schema_catalog::table_schema::{HASH_COLUMN, ID_COLUMN};
use crate::schema_catalog::TableDefinition;

#[derive(Debug)]
struct TableStore {
    definition: TableDefinition,
    rows: BTreeMap<RowId, Row>,
    by_hash: HashMap<String, RowId>,
    next_id: RowId,
}

impl TableStore {
    fn new(definition: TableDefinition) -> Self {
        TableStore {
            definition,
            rows: BTreeMap::new(),
            by_hash: HashMap::new(),
            next_id: 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: HashMap<String, TableStore>,
    /// Undo log for the open document transaction
    journal: Option<Vec<(String, RowId)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed and in-flight rows of a table, in id order
    pub fn rows(&self, table: &str) -> Result<Vec<(RowId, Row)>, StorageError> {
        let store = self.store(table)?;
        Ok(store.rows.iter().map(|(id, row)| (*id, row.clone())).collect())
    }

    pub fn get(&self, table: &str, id: RowId) -> Result<Option<Row>, StorageError> {
        Ok(self.store(table)?.rows.get(&id).cloned())
    }

    fn store(&self, table: &str) -> Result<&TableStore, StorageError> {
        self.tables.get(table).ok_or_else(|| StorageError::UnknownTable {
            table: table.to_string(),
        })
    }

    /// Reject rows whose foreign-key values reference missing parents
    fn check_foreign_keys(&self, table: &str, row: &Row) -> Result<(), StorageError> {
        let definition = &self.store(table)?.definition;
        for fk in &definition.foreign_keys {
            let Some(value) = row.get(&fk.column) else {
                continue;
            };
            let Some(parent_id) = value.as_i64() else {
                continue;
            };
            let parent_exists = self
                .tables
                .get(&fk.references_table)
                .map(|store| store.rows.contains_key(&parent_id))
                .unwrap_or(false);
            if !parent_exists {
                return Err(StorageError::ForeignKeyViolation {
                    table: table.to_string(),
                    column: fk.column.clone(),
                    parent_table: fk.references_table.clone(),
                    parent_id,
                });
            }
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn ensure_table(&mut self, definition: &TableDefinition) -> Result<(), StorageError> {
        match self.tables.get_mut(&definition.name) {
            Some(store) => {
                // Definition may have grown new columns since last seen
                store.definition = definition.clone();
            }
            None => {
                self.tables
                    .insert(definition.name.clone(), TableStore::new(definition.clone()));
            }
        }
        Ok(())
    }

    fn find_by_hash(&self, table: &str, digest: &str) -> Result<Option<RowId>, StorageError> {
        Ok(self.store(table)?.by_hash.get(digest).copied())
    }

    fn insert(&mut self, table: &str, mut row: Row) -> Result<RowId, StorageError> {
        self.check_foreign_keys(table, &row)?;

        let store = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StorageError::UnknownTable {
                table: table.to_string(),
            })?;

        let id = match row.get(ID_COLUMN).and_then(Value::as_i64) {
            Some(requested) => {
                if store.rows.contains_key(&requested) {
                    return Err(StorageError::DuplicateRowId {
                        table: table.to_string(),
                        id: requested,
                    });
                }
                store.next_id = store.next_id.max(requested + 1);
                requested
            }
            None => {
                let id = store.next_id;
                store.next_id += 1;
                id
            }
        };
        row.insert(ID_COLUMN.to_string(), Value::from(id));

        if let Some(Value::String(digest)) = row.get(HASH_COLUMN) {
            store.by_hash.insert(digest.clone(), id);
        }
        store.rows.insert(id, row);

        if let Some(journal) = self.journal.as_mut() {
            journal.push((table.to_string(), id));
        }

        Ok(id)
    }

    fn contains(&self, table: &str, id: RowId) -> Result<bool, StorageError> {
        Ok(self.store(table)?.rows.contains_key(&id))
    }

    fn row_count(&self, table: &str) -> Result<usize, StorageError> {
        Ok(self.store(table)?.rows.len())
    }

    fn begin_document(&mut self) {
        self.journal = Some(Vec::new());
    }

    fn commit_document(&mut self) {
        self.journal = None;
    }

    fn rollback_document(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for (table, id) in journal.into_iter().rev() {
            if let Some(store) = self.tables.get_mut(&table) {
                if let Some(row) = store.rows.remove(&id) {
                    if let Some(Value::String(digest)) = row.get(HASH_COLUMN) {
                        store.by_hash.remove(digest);
                    }
                }
            }
        }
        log::debug!("Rolled back document transaction");
    }
}
