//! Relationship cardinality detection
//!
//! Classifies each nested field of a document as an embedded child table
//! (one-to-one for objects, one-to-many for object lists), a many-to-many
//! junction relationship, or no relationship at all (scalar and
//! heterogeneous lists stay inline as a json column).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::table_schema::table_name_from_key;

/// Cardinality of a relationship between a parent and child table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// A directed foreign-key edge from a parent table to a child table
///
/// One-to-one/one-to-many edges correspond to exactly one foreign-key
/// column on the child referencing the parent's surrogate id; a
/// many-to-many edge corresponds to a junction table holding one foreign
/// key per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub from_table: String,
    pub to_table: String,
    /// JSON field the relationship was discovered under
    pub field: String,
    pub kind: RelationshipKind,
    /// Junction table name, present only for many-to-many edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junction_table: Option<String>,
}

/// Heuristic relationship detector
///
/// The many-to-many rule counts foreign-key-shaped fields (names ending
/// in one of the configured suffixes) in the first list element. The
/// suffix set and threshold are configurable because the heuristic is
/// coarse and can misclassify.
#[derive(Debug, Clone)]
pub struct RelationshipDetector {
    foreign_key_suffixes: Vec<String>,
    junction_fk_threshold: usize,
}

impl RelationshipDetector {
    pub fn new(foreign_key_suffixes: Vec<String>, junction_fk_threshold: usize) -> Self {
        RelationshipDetector {
            foreign_key_suffixes,
            junction_fk_threshold,
        }
    }

    /// Classify every nested field of `document` into relationship edges
    ///
    /// Edge cases never raise: empty lists, scalar lists, and lists whose
    /// first element is not an object degrade to "no relationship" and
    /// are left inline for the type inferencer.
    pub fn detect(
        &self,
        parent_table: &str,
        document: &serde_json::Map<String, Value>,
    ) -> Vec<RelationshipEdge> {
        let mut edges = Vec::new();

        for (key, value) in document {
            let child_table = table_name_from_key(key);
            if child_table.is_empty() {
                continue;
            }

            match value {
                Value::Object(_) => edges.push(RelationshipEdge {
                    from_table: parent_table.to_string(),
                    to_table: child_table,
                    field: key.clone(),
                    kind: RelationshipKind::OneToOne,
                    junction_table: None,
                }),
                Value::Array(items) => {
                    let Some(Value::Object(first)) = items.first() else {
                        continue;
                    };
                    if self.count_foreign_key_fields(first) >= self.junction_fk_threshold {
                        edges.push(RelationshipEdge {
                            from_table: parent_table.to_string(),
                            to_table: child_table,
                            field: key.clone(),
                            kind: RelationshipKind::ManyToMany,
                            junction_table: Some(junction_table_name(key)),
                        });
                    } else {
                        edges.push(RelationshipEdge {
                            from_table: parent_table.to_string(),
                            to_table: child_table,
                            field: key.clone(),
                            kind: RelationshipKind::OneToMany,
                            junction_table: None,
                        });
                    }
                }
                _ => {}
            }
        }

        edges
    }

    /// Count fields of a list element whose name looks like a foreign key
    fn count_foreign_key_fields(&self, element: &serde_json::Map<String, Value>) -> usize {
        element
            .keys()
            .filter(|name| {
                self.foreign_key_suffixes
                    .iter()
                    .any(|suffix| name.ends_with(suffix.as_str()))
            })
            .count()
    }
}

/// Junction table name for a many-to-many field
pub fn junction_table_name(field: &str) -> String {
    format!("{}_junction", table_name_from_key(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detector() -> RelationshipDetector {
        RelationshipDetector::new(vec!["_id".to_string()], 2)
    }

    fn detect_one(doc: serde_json::Value) -> Vec<RelationshipEdge> {
        detector().detect("companies", doc.as_object().unwrap())
    }

    #[test]
    fn test_object_field_is_one_to_one() {
        let edges = detect_one(json!({"address": {"street": "Main"}}));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, RelationshipKind::OneToOne);
        assert_eq!(edges[0].to_table, "address");
        assert_eq!(edges[0].junction_table, None);
    }

    #[test]
    fn test_object_list_is_one_to_many() {
        let edges = detect_one(json!({"locations": [{"id": 10, "name": "HQ"}]}));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, RelationshipKind::OneToMany);
        assert_eq!(edges[0].from_table, "companies");
        assert_eq!(edges[0].to_table, "locations");
    }

    #[test]
    fn test_multiple_fk_fields_is_many_to_many() {
        let edges = detect_one(json!({
            "memberships": [{"user_id": 1, "group_id": 2, "since": "2024-01-01"}]
        }));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, RelationshipKind::ManyToMany);
        assert_eq!(
            edges[0].junction_table.as_deref(),
            Some("memberships_junction")
        );
    }

    #[test]
    fn test_single_fk_field_is_one_to_many() {
        let edges = detect_one(json!({"locations": [{"company_id": 1, "name": "HQ"}]}));
        assert_eq!(edges[0].kind, RelationshipKind::OneToMany);
    }

    #[test]
    fn test_scalar_list_is_no_relationship() {
        assert!(detect_one(json!({"tags": ["a", "b"]})).is_empty());
    }

    #[test]
    fn test_empty_list_is_no_relationship() {
        assert!(detect_one(json!({"tags": []})).is_empty());
    }

    #[test]
    fn test_mixed_list_follows_first_element() {
        // First element scalar: degrade to inline json blob
        assert!(detect_one(json!({"mixed": [1, {"id": 2}]})).is_empty());
    }

    #[test]
    fn test_custom_suffixes() {
        let det = RelationshipDetector::new(vec!["_id".to_string(), "_key".to_string()], 2);
        let doc = json!({"links": [{"user_key": 1, "item_id": 2}]});
        let edges = det.detect("root", doc.as_object().unwrap());
        assert_eq!(edges[0].kind, RelationshipKind::ManyToMany);
    }

    #[test]
    fn test_scalar_fields_ignored() {
        let edges = detect_one(json!({"name": "Acme", "count": 3}));
        assert!(edges.is_empty());
    }
}
