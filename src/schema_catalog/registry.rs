//! Mutable catalog of discovered tables and their relationship graph
//!
//! The registry is constructed explicitly per ingestion run and passed by
//! reference to the loader and planner; there is no ambient singleton.
//! Table lookup is O(1) by name and edge enumeration is proportional to a
//! table's degree via the adjacency index.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use super::errors::CatalogError;
use super::relationship::RelationshipEdge;
use super::table_schema::TableDefinition;

#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, TableDefinition>,
    /// Insertion order of table names, for stable exports
    table_order: Vec<String>,
    edges: Vec<RelationshipEdge>,
    /// Table name -> indexes into `edges` incident to that table
    adjacency: HashMap<String, Vec<usize>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or extend the definition for `name`
    ///
    /// Re-deriving a name that is already registered reuses the existing
    /// definition, absorbing any new columns from `sample` (additive
    /// evolution only). A parent passed on a later call adds the
    /// foreign-key column if the table did not have one yet.
    pub fn ensure_table(
        &mut self,
        name: &str,
        sample: &serde_json::Map<String, Value>,
        parent: Option<&str>,
        relationship_fields: &HashSet<String>,
        long_text_threshold: usize,
    ) -> &TableDefinition {
        if !self.tables.contains_key(name) {
            log::debug!("Registering table `{}`", name);
            self.tables.insert(
                name.to_string(),
                TableDefinition::from_sample(
                    name,
                    sample,
                    parent,
                    relationship_fields,
                    long_text_threshold,
                ),
            );
            self.table_order.push(name.to_string());
        } else {
            let def = self.tables.get_mut(name).expect("table just checked");
            def.absorb_sample(sample, relationship_fields, long_text_threshold);
            if let Some(parent) = parent {
                def.add_foreign_key(parent);
            }
        }
        &self.tables[name]
    }

    /// Register a pre-built definition (junction tables)
    pub fn ensure_table_definition(&mut self, definition: TableDefinition) -> &TableDefinition {
        let name = definition.name.clone();
        if !self.tables.contains_key(&name) {
            log::debug!("Registering table `{}`", name);
            self.tables.insert(name.clone(), definition);
            self.table_order.push(name.clone());
        }
        &self.tables[&name]
    }

    /// Append a relationship edge to the adjacency structure
    ///
    /// Self-loops are rejected: a table referencing itself has no valid
    /// insertion order (the parent id must exist before the child row).
    /// Duplicate edges (same endpoints and field) collapse silently.
    pub fn register_relationship(&mut self, edge: RelationshipEdge) -> Result<(), CatalogError> {
        if edge.from_table == edge.to_table {
            return Err(CatalogError::SelfReferential {
                table: edge.from_table,
                field: edge.field,
            });
        }

        let duplicate = self.edges.iter().any(|e| {
            e.from_table == edge.from_table && e.to_table == edge.to_table && e.field == edge.field
        });
        if duplicate {
            return Ok(());
        }

        let index = self.edges.len();
        self.adjacency
            .entry(edge.from_table.clone())
            .or_default()
            .push(index);
        self.adjacency
            .entry(edge.to_table.clone())
            .or_default()
            .push(index);
        self.edges.push(edge);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn get_table(&self, name: &str) -> Result<&TableDefinition, CatalogError> {
        self.tables.get(name).ok_or_else(|| CatalogError::UnknownTable {
            table: name.to_string(),
        })
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.table_order.iter().map(String::as_str)
    }

    /// All edges incident to `table`, in registration order
    pub fn edges_incident(&self, table: &str) -> impl Iterator<Item = &RelationshipEdge> {
        self.adjacency
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&i| &self.edges[i])
    }

    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.edges
    }

    /// Serializable view of the discovered schema: table definitions in
    /// discovery order plus the relationship edge list
    pub fn export(&self) -> SchemaExport {
        SchemaExport {
            tables: self
                .table_order
                .iter()
                .map(|name| self.tables[name].clone())
                .collect(),
            relationships: self.edges.clone(),
        }
    }
}

/// Schema output consumable by downstream query planners or migration
/// generators
#[derive(Debug, Clone, Serialize)]
pub struct SchemaExport {
    pub tables: Vec<TableDefinition>,
    pub relationships: Vec<RelationshipEdge>,
}
