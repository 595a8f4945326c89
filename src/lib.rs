//! json2rel - Relational-schema inference over schemaless JSON corpora
//!
//! This crate provides dynamic schema discovery for JSON document corpora through:
//! - Column type inference across heterogeneous samples
//! - Relationship cardinality detection (one-to-one, one-to-many, many-to-many)
//! - Content-hash deduplicated, per-document-transactional loading
//! - Join-path resolution over the discovered foreign-key graph

pub mod config;
pub mod engine;
pub mod ingest;
pub mod query_planner;
pub mod schema_catalog;
pub mod storage;
