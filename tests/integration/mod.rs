mod ingest_scenarios;
mod plan_scenarios;
