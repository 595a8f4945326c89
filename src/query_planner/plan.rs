//! Query-plan request/response boundary
//!
//! An external collaborator (whatever turns user intent into a
//! structured request) supplies the main table, target tables, filters,
//! and requested fields; the planner resolves the join paths and hands
//! back an ordered join plan. Filters and fields pass through untouched -
//! executing the plan is out of scope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::PlanError;
use super::join_path::find_join_path;
use crate::schema_catalog::table_schema::{foreign_key_column, ID_COLUMN};
use crate::schema_catalog::{RelationshipEdge, RelationshipKind, TableRegistry};

/// One `(column, operator, value)` filter condition, passed through to
/// the downstream executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: String,
    pub value: Value,
}

/// Structured query-plan request from the external collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPlanRequest {
    pub main_table: String,
    #[serde(default)]
    pub target_tables: Vec<String>,
    #[serde(default)]
    pub filter_conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub requested_fields: Vec<String>,
}

/// One concrete join: `from_table.from_column = to_table.to_column`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinStep {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub kind: RelationshipKind,
}

/// Resolved multi-table join plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPlan {
    pub main_table: String,
    pub joins: Vec<JoinStep>,
    pub filters: Vec<FilterCondition>,
    pub fields: Vec<String>,
}

/// Resolve a join plan connecting the request's main table to every
/// target table
///
/// Paths for separate targets are concatenated with duplicate steps
/// removed, so targets sharing a path prefix do not repeat joins. An
/// unknown table or an unconnected target is a hard failure.
pub fn build_plan(
    registry: &TableRegistry,
    request: &QueryPlanRequest,
) -> Result<QueryPlan, PlanError> {
    require_table(registry, &request.main_table)?;

    let mut joins: Vec<JoinStep> = Vec::new();
    for target in &request.target_tables {
        require_table(registry, target)?;
        if target == &request.main_table {
            continue;
        }

        let path = find_join_path(registry, &request.main_table, target);
        if path.is_empty() {
            return Err(PlanError::UnreachableJoin {
                from: request.main_table.clone(),
                to: target.clone(),
            });
        }

        for edge in path {
            for step in render_edge(edge) {
                if !joins.contains(&step) {
                    joins.push(step);
                }
            }
        }
    }

    Ok(QueryPlan {
        main_table: request.main_table.clone(),
        joins,
        filters: request.filter_conditions.clone(),
        fields: request.requested_fields.clone(),
    })
}

fn require_table(registry: &TableRegistry, table: &str) -> Result<(), PlanError> {
    if registry.contains_table(table) || registry.edges_incident(table).next().is_some() {
        Ok(())
    } else {
        Err(PlanError::UnknownTable {
            table: table.to_string(),
        })
    }
}

/// Render a relationship edge as concrete join steps
///
/// One-to-one/one-to-many: the child's foreign key equals the parent id.
/// Many-to-many: two steps through the junction table, one per side.
fn render_edge(edge: &RelationshipEdge) -> Vec<JoinStep> {
    match edge.kind {
        RelationshipKind::OneToOne | RelationshipKind::OneToMany => vec![JoinStep {
            from_table: edge.to_table.clone(),
            from_column: foreign_key_column(&edge.from_table),
            to_table: edge.from_table.clone(),
            to_column: ID_COLUMN.to_string(),
            kind: edge.kind,
        }],
        RelationshipKind::ManyToMany => {
            let junction = edge
                .junction_table
                .clone()
                .unwrap_or_else(|| format!("{}_junction", edge.to_table));
            vec![
                JoinStep {
                    from_table: junction.clone(),
                    from_column: foreign_key_column(&edge.from_table),
                    to_table: edge.from_table.clone(),
                    to_column: ID_COLUMN.to_string(),
                    kind: edge.kind,
                },
                JoinStep {
                    from_table: junction,
                    from_column: foreign_key_column(&edge.to_table),
                    to_table: edge.to_table.clone(),
                    to_column: ID_COLUMN.to_string(),
                    kind: edge.kind,
                },
            ]
        }
    }
}
