//! Join-path resolution over the relationship graph
//!
//! Tables are nodes and relationship edges are undirected connections (a
//! foreign-key join is usable in either direction). Depth-first search
//! with a visited set finds the first path between two tables; the
//! visited set bounds the search so it terminates on cyclic graphs and
//! never revisits a node. No shortest-path guarantee.

use std::collections::HashSet;

use crate::schema_catalog::{RelationshipEdge, TableRegistry};

/// Find a sequence of relationship edges connecting `start` to `target`
///
/// Returns the edges in traversal order, or an empty list when the
/// tables are not joinably connected (callers must treat that as a hard
/// failure, never as an implicit cross join).
pub fn find_join_path<'a>(
    registry: &'a TableRegistry,
    start: &str,
    target: &str,
) -> Vec<&'a RelationshipEdge> {
    if start == target {
        return Vec::new();
    }

    let mut visited = HashSet::new();
    let mut path = Vec::new();
    if dfs(registry, start, target, &mut visited, &mut path) {
        path
    } else {
        Vec::new()
    }
}

fn dfs<'a>(
    registry: &'a TableRegistry,
    current: &str,
    target: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<&'a RelationshipEdge>,
) -> bool {
    if current == target {
        return true;
    }
    visited.insert(current.to_string());

    for edge in registry.edges_incident(current) {
        let next = if edge.from_table == current {
            edge.to_table.as_str()
        } else {
            edge.from_table.as_str()
        };
        if visited.contains(next) {
            continue;
        }
        path.push(edge);
        if dfs(registry, next, target, visited, path) {
            return true;
        }
        path.pop();
    }

    false
}
