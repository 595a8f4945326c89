//! Schema drift validation across a document corpus
//!
//! The first document processed seeds a reference snapshot (field name to
//! JSON shape name). Every later document is compared field-by-field
//! against that snapshot; any drift is reported per field and the
//! document fails validation. The snapshot is only ever mutated by an
//! explicit seed/reseed, never by a failed validation, so one malformed
//! document cannot silently shift the reference for the rest of the run.

use std::collections::HashMap;

use serde_json::Value;

/// A single difference between a document and the reference snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaMismatch {
    /// Field present in the document but not in the snapshot
    NewField { field: String, actual: String },
    /// Field present in the snapshot but missing from the document
    MissingField { field: String, expected: String },
    /// Field present in both with different shapes
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

/// Validates shape consistency of documents against a running snapshot
#[derive(Debug, Default)]
pub struct SchemaValidator {
    snapshot: Option<HashMap<String, String>>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator { snapshot: None }
    }

    /// Validate a document against the reference snapshot
    ///
    /// The first call seeds the snapshot and returns true. Later calls
    /// return false on any drift, logging each difference; the caller
    /// decides the skip policy. Array documents are represented by their
    /// first element (the input contract declares arrays homogeneous).
    pub fn validate(&mut self, document: &Value, label: &str) -> bool {
        let current = fingerprint(document);

        let Some(reference) = &self.snapshot else {
            self.snapshot = Some(current);
            return true;
        };

        let mismatches = diff(reference, &current);
        if mismatches.is_empty() {
            return true;
        }

        log::warn!("Schema mismatch in document {}", label);
        for mismatch in &mismatches {
            match mismatch {
                SchemaMismatch::NewField { field, actual } => {
                    log::warn!("New field found: {} ({})", field, actual)
                }
                SchemaMismatch::MissingField { field, expected } => {
                    log::warn!("Missing field: {} (expected {})", field, expected)
                }
                SchemaMismatch::TypeMismatch {
                    field,
                    expected,
                    actual,
                } => log::warn!(
                    "Type mismatch for {}: expected {}, got {}",
                    field,
                    expected,
                    actual
                ),
            }
        }
        false
    }

    /// List the differences between a document and the snapshot without
    /// mutating anything
    pub fn differences(&self, document: &Value) -> Vec<SchemaMismatch> {
        match &self.snapshot {
            Some(reference) => diff(reference, &fingerprint(document)),
            None => Vec::new(),
        }
    }

    /// Replace the reference snapshot with this document's shape
    pub fn reseed(&mut self, document: &Value) {
        self.snapshot = Some(fingerprint(document));
    }

    pub fn is_seeded(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Shape name of a JSON value, used for drift detection
fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Field-name to shape-name map for a document
fn fingerprint(document: &Value) -> HashMap<String, String> {
    let object = match document {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    };

    object
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), json_shape(v).to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn diff(reference: &HashMap<String, String>, current: &HashMap<String, String>) -> Vec<SchemaMismatch> {
    let mut mismatches = Vec::new();

    let mut fields: Vec<&String> = reference.keys().chain(current.keys()).collect();
    fields.sort();
    fields.dedup();

    for field in fields {
        match (reference.get(field), current.get(field)) {
            (None, Some(actual)) => mismatches.push(SchemaMismatch::NewField {
                field: field.clone(),
                actual: actual.clone(),
            }),
            (Some(expected), None) => mismatches.push(SchemaMismatch::MissingField {
                field: field.clone(),
                expected: expected.clone(),
            }),
            (Some(expected), Some(actual)) if expected != actual => {
                mismatches.push(SchemaMismatch::TypeMismatch {
                    field: field.clone(),
                    expected: expected.clone(),
                    actual: actual.clone(),
                })
            }
            _ => {}
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_document_seeds_and_passes() {
        let mut validator = SchemaValidator::new();
        assert!(!validator.is_seeded());
        assert!(validator.validate(&json!({"id": 1, "name": "Acme"}), "a.json"));
        assert!(validator.is_seeded());
    }

    #[test]
    fn test_matching_document_passes() {
        let mut validator = SchemaValidator::new();
        validator.validate(&json!({"id": 1, "name": "Acme"}), "a.json");
        assert!(validator.validate(&json!({"id": 2, "name": "Umbrella"}), "b.json"));
    }

    #[test]
    fn test_missing_field_fails() {
        let mut validator = SchemaValidator::new();
        validator.validate(&json!({"id": 1, "name": "Acme"}), "a.json");
        assert!(!validator.validate(&json!({"id": 2}), "b.json"));

        let diffs = validator.differences(&json!({"id": 2}));
        assert_eq!(
            diffs,
            vec![SchemaMismatch::MissingField {
                field: "name".to_string(),
                expected: "string".to_string(),
            }]
        );
    }

    #[test]
    fn test_new_field_fails() {
        let mut validator = SchemaValidator::new();
        validator.validate(&json!({"id": 1}), "a.json");
        assert!(!validator.validate(&json!({"id": 2, "extra": true}), "b.json"));
    }

    #[test]
    fn test_type_drift_fails() {
        let mut validator = SchemaValidator::new();
        validator.validate(&json!({"id": 1}), "a.json");
        assert!(!validator.validate(&json!({"id": "one"}), "b.json"));

        let diffs = validator.differences(&json!({"id": "one"}));
        assert_eq!(
            diffs,
            vec![SchemaMismatch::TypeMismatch {
                field: "id".to_string(),
                expected: "int".to_string(),
                actual: "string".to_string(),
            }]
        );
    }

    #[test]
    fn test_failed_validation_does_not_mutate_snapshot() {
        let mut validator = SchemaValidator::new();
        validator.validate(&json!({"id": 1}), "a.json");
        validator.validate(&json!({"id": 1, "extra": true}), "b.json");

        // The drifted shape must still mismatch: the snapshot was not
        // silently merged
        assert!(!validator.validate(&json!({"id": 2, "extra": false}), "c.json"));
    }

    #[test]
    fn test_reseed_replaces_snapshot() {
        let mut validator = SchemaValidator::new();
        validator.validate(&json!({"id": 1}), "a.json");
        validator.reseed(&json!({"id": 1, "extra": true}));
        assert!(validator.validate(&json!({"id": 2, "extra": false}), "c.json"));
    }

    #[test]
    fn test_array_document_uses_first_element() {
        let mut validator = SchemaValidator::new();
        validator.validate(&json!([{"id": 1, "name": "Acme"}]), "a.json");
        assert!(validator.validate(&json!({"id": 2, "name": "Umbrella"}), "b.json"));
        assert!(!validator.validate(&json!([{"id": 3}]), "c.json"));
    }
}
