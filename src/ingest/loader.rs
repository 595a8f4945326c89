//! Document loader
//!
//! Walks one input document, materializes tables and relationship edges
//! in the registry, and writes deduplicated rows depth-first: the parent
//! row is inserted (and its surrogate id known) before any child row that
//! references it. Array-valued documents are processed in fixed-size
//! batches with a flush per batch; batching changes only the write
//! cadence, never the resulting row set.

use std::collections::HashSet;

use serde_json::Value;

use super::dedup::Deduplicator;
use super::errors::IngestError;
use crate::config::EngineConfig;
use crate::schema_catalog::{
    foreign_key_column, junction_table_name, CatalogError, RelationshipDetector, RelationshipEdge,
    RelationshipKind, TableDefinition, TableRegistry,
};
use crate::storage::{Row, RowId, StorageBackend};

/// Row-level counters for one loaded document
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub inserted: usize,
    pub duplicates: usize,
}

pub struct Loader<'a, S: StorageBackend> {
    registry: &'a mut TableRegistry,
    storage: &'a mut S,
    detector: RelationshipDetector,
    config: &'a EngineConfig,
}

impl<'a, S: StorageBackend> Loader<'a, S> {
    pub fn new(
        registry: &'a mut TableRegistry,
        storage: &'a mut S,
        config: &'a EngineConfig,
    ) -> Self {
        Loader {
            registry,
            storage,
            detector: RelationshipDetector::new(
                config.foreign_key_suffixes.clone(),
                config.junction_fk_threshold,
            ),
            config,
        }
    }

    /// Load one top-level document into `table`
    ///
    /// The caller brackets this in a storage transaction: any error here
    /// means the document's partial writes must be rolled back.
    pub fn load_document(&mut self, table: &str, document: &Value) -> Result<LoadStats, IngestError> {
        let mut stats = LoadStats::default();
        match document {
            Value::Object(map) => {
                self.insert_tree(table, map, None, 0, &mut stats)?;
            }
            Value::Array(items) => {
                self.load_batches(table, items, &mut stats)?;
            }
            _ => return Err(IngestError::UnsupportedRoot),
        }
        Ok(stats)
    }

    /// Process an array document in fixed-size batches, flushing after
    /// each batch so memory stays bounded
    fn load_batches(
        &mut self,
        table: &str,
        items: &[Value],
        stats: &mut LoadStats,
    ) -> Result<(), IngestError> {
        for batch in items.chunks(self.config.batch_size) {
            for item in batch {
                let Value::Object(map) = item else {
                    return Err(IngestError::UnsupportedRoot);
                };
                self.insert_tree(table, map, None, 0, stats)?;
            }
            self.storage.flush()?;
            log::debug!("Flushed batch of {} record(s) into `{}`", batch.len(), table);
        }
        Ok(())
    }

    /// Insert one record and recurse into its detected relationships
    ///
    /// `parent` carries the parent table and row id for nested children;
    /// the foreign key is injected into the record before hashing, so a
    /// child's digest is bound to its parent row.
    fn insert_tree(
        &mut self,
        table: &str,
        document: &serde_json::Map<String, Value>,
        parent: Option<(&str, RowId)>,
        depth: usize,
        stats: &mut LoadStats,
    ) -> Result<RowId, IngestError> {
        if depth >= self.config.max_document_depth {
            return Err(IngestError::DepthExceeded {
                max_depth: self.config.max_document_depth,
            });
        }

        let edges = self.detect_and_register(table, document)?;
        let relationship_fields: HashSet<String> =
            edges.iter().map(|edge| edge.field.clone()).collect();

        let definition = self
            .registry
            .ensure_table(
                table,
                document,
                parent.map(|(parent_table, _)| parent_table),
                &relationship_fields,
                self.config.long_text_threshold,
            )
            .clone();
        self.storage.ensure_table(&definition)?;

        let mut record = Row::new();
        for (key, value) in document {
            if relationship_fields.contains(key) {
                continue;
            }
            record.insert(key.clone(), value.clone());
        }
        if let Some((parent_table, parent_id)) = parent {
            record.insert(foreign_key_column(parent_table), Value::from(parent_id));
        }

        let (row_id, inserted) = Deduplicator::insert_if_absent(self.storage, table, record)?;
        if !inserted {
            // Replay of an already-loaded record: its subtree was loaded
            // with it the first time around
            stats.duplicates += 1;
            return Ok(row_id);
        }
        stats.inserted += 1;

        for edge in &edges {
            let Some(value) = document.get(&edge.field) else {
                continue;
            };
            match edge.kind {
                RelationshipKind::OneToOne => {
                    if let Value::Object(child) = value {
                        self.insert_tree(&edge.to_table, child, Some((table, row_id)), depth + 1, stats)?;
                    }
                }
                RelationshipKind::OneToMany => {
                    if let Value::Array(items) = value {
                        for item in items {
                            let Value::Object(child) = item else {
                                log::warn!(
                                    "Skipping non-object element under `{}.{}`",
                                    table,
                                    edge.field
                                );
                                continue;
                            };
                            self.insert_tree(
                                &edge.to_table,
                                child,
                                Some((table, row_id)),
                                depth + 1,
                                stats,
                            )?;
                        }
                    }
                }
                RelationshipKind::ManyToMany => {
                    if let Value::Array(items) = value {
                        let junction = edge
                            .junction_table
                            .clone()
                            .unwrap_or_else(|| junction_table_name(&edge.field));
                        for item in items {
                            let Value::Object(child) = item else {
                                log::warn!(
                                    "Skipping non-object element under `{}.{}`",
                                    table,
                                    edge.field
                                );
                                continue;
                            };
                            let child_id =
                                self.insert_tree(&edge.to_table, child, None, depth + 1, stats)?;
                            self.link_junction(&junction, table, row_id, &edge.to_table, child_id, stats)?;
                        }
                    }
                }
            }
        }

        Ok(row_id)
    }

    /// Detect this document's relationships and record them in the
    /// registry, dropping self-referential edges with a warning
    fn detect_and_register(
        &mut self,
        table: &str,
        document: &serde_json::Map<String, Value>,
    ) -> Result<Vec<RelationshipEdge>, IngestError> {
        let mut kept = Vec::new();
        for edge in self.detector.detect(table, document) {
            match self.registry.register_relationship(edge.clone()) {
                Ok(()) => kept.push(edge),
                Err(CatalogError::SelfReferential { table, field }) => {
                    log::warn!(
                        "Dropping self-referential relationship `{}.{}`; value stays inline",
                        table,
                        field
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }
        Ok(kept)
    }

    /// Write the junction row linking a many-to-many pair of surrogate ids
    fn link_junction(
        &mut self,
        junction: &str,
        left_table: &str,
        left_id: RowId,
        right_table: &str,
        right_id: RowId,
        stats: &mut LoadStats,
    ) -> Result<(), IngestError> {
        let definition = self
            .registry
            .ensure_table_definition(TableDefinition::junction(junction, left_table, right_table))
            .clone();
        self.storage.ensure_table(&definition)?;

        let mut row = Row::new();
        row.insert(foreign_key_column(left_table), Value::from(left_id));
        row.insert(foreign_key_column(right_table), Value::from(right_id));

        let (_, inserted) = Deduplicator::insert_if_absent(self.storage, junction, row)?;
        if inserted {
            stats.inserted += 1;
        } else {
            stats.duplicates += 1;
        }
        Ok(())
    }
}
