//! Query-plan resolution over an ingested corpus

use std::fs;
use std::path::Path;

use json2rel::config::EngineConfig;
use json2rel::engine::Engine;
use json2rel::query_planner::{FilterCondition, PlanError, QueryPlanRequest};
use json2rel::storage::{MemoryBackend, StorageBackend};
use serde_json::{json, Value};

fn write_doc(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn ingested_engine(dir: &Path) -> Engine<MemoryBackend> {
    write_doc(
        dir,
        "acme.json",
        &json!({
            "id": 1,
            "name": "Acme",
            "locations": [
                {"id": 10, "name": "HQ", "rooms": [{"id": 100, "name": "Lab"}]}
            ]
        }),
    );

    let config = EngineConfig {
        input_dir: dir.to_string_lossy().into_owned(),
        root_table: "companies".to_string(),
        ..EngineConfig::default()
    };
    let mut engine = Engine::in_memory(config);
    engine.ingest_dir().unwrap();
    engine
}

#[test]
fn plan_spans_discovered_join_chain() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ingested_engine(dir.path());

    let request = QueryPlanRequest {
        main_table: "companies".to_string(),
        target_tables: vec!["rooms".to_string()],
        filter_conditions: vec![FilterCondition {
            column: "name".to_string(),
            operator: "=".to_string(),
            value: json!("Acme"),
        }],
        requested_fields: vec!["rooms.name".to_string()],
    };

    let plan = engine.plan_query(&request).unwrap();
    assert_eq!(plan.main_table, "companies");
    assert_eq!(plan.joins.len(), 2);
    assert_eq!(plan.joins[0].from_table, "locations");
    assert_eq!(plan.joins[0].from_column, "companies_id");
    assert_eq!(plan.joins[1].from_table, "rooms");
    assert_eq!(plan.joins[1].from_column, "locations_id");
    assert_eq!(plan.filters, request.filter_conditions);
    assert_eq!(plan.fields, request.requested_fields);
}

#[test]
fn plan_works_from_child_toward_parent() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ingested_engine(dir.path());

    let request = QueryPlanRequest {
        main_table: "rooms".to_string(),
        target_tables: vec!["companies".to_string()],
        filter_conditions: vec![],
        requested_fields: vec![],
    };

    let plan = engine.plan_query(&request).unwrap();
    assert_eq!(plan.joins.len(), 2);
}

#[test]
fn unknown_table_is_a_structured_failure() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ingested_engine(dir.path());

    let request = QueryPlanRequest {
        main_table: "companies".to_string(),
        target_tables: vec!["warehouses".to_string()],
        filter_conditions: vec![],
        requested_fields: vec![],
    };

    assert_eq!(
        engine.plan_query(&request).unwrap_err(),
        PlanError::UnknownTable {
            table: "warehouses".to_string()
        }
    );
}

#[test]
fn many_to_many_plan_routes_through_junction_table() {
    let dir = tempfile::tempdir().unwrap();
    write_doc(
        dir.path(),
        "acme.json",
        &json!({
            "id": 1,
            "name": "Acme",
            "memberships": [
                {"user_id": 7, "group_id": 8},
                {"user_id": 7, "group_id": 9}
            ]
        }),
    );

    let config = EngineConfig {
        input_dir: dir.path().to_string_lossy().into_owned(),
        root_table: "companies".to_string(),
        ..EngineConfig::default()
    };
    let mut engine = Engine::in_memory(config);
    engine.ingest_dir().unwrap();

    assert_eq!(
        engine.storage().row_count("memberships_junction").unwrap(),
        2
    );

    let request = QueryPlanRequest {
        main_table: "companies".to_string(),
        target_tables: vec!["memberships".to_string()],
        filter_conditions: vec![],
        requested_fields: vec![],
    };
    let plan = engine.plan_query(&request).unwrap();
    assert_eq!(plan.joins.len(), 2);
    assert!(plan
        .joins
        .iter()
        .all(|step| step.from_table == "memberships_junction"));
}
