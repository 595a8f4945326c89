//! Per-run ingestion engine
//!
//! Owns the table registry, schema validator, storage backend, and
//! configuration for one ingestion run. All state is constructed
//! explicitly and passed by reference to the components, so isolated
//! runs (and tests) never share schema or rows.
//!
//! The engine is a single writer: ingestion takes `&mut self`. Planning
//! reads the registry's current state through `&self`; callers that want
//! concurrent planners while ingestion is in flight should wrap the
//! engine in an `RwLock` so reads are serialized against schema
//! mutations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::ingest::{document_label, DocumentSource, IngestError, LoadStats, Loader};
use crate::query_planner::{build_plan, PlanError, QueryPlan, QueryPlanRequest};
use crate::schema_catalog::{SchemaExport, SchemaValidator, TableRegistry};
use crate::storage::{MemoryBackend, StorageBackend};

/// Outcome of ingesting one document
#[derive(Debug)]
pub enum DocumentStatus {
    Loaded(LoadStats),
    SkippedMismatch,
    Failed(IngestError),
}

/// Aggregated counters for one ingestion run
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents_processed: usize,
    pub rows_inserted: usize,
    pub duplicates: usize,
    pub skipped_mismatch: usize,
    /// Document label and failure reason, in encounter order
    pub failures: Vec<(String, String)>,
    /// True when the run ended early via the stop flag
    pub stopped: bool,
}

pub struct Engine<S: StorageBackend> {
    config: EngineConfig,
    registry: TableRegistry,
    validator: SchemaValidator,
    storage: S,
    stop: Arc<AtomicBool>,
}

impl Engine<MemoryBackend> {
    /// Engine backed by the in-memory reference storage
    pub fn in_memory(config: EngineConfig) -> Self {
        Engine::new(config, MemoryBackend::new())
    }
}

impl<S: StorageBackend> Engine<S> {
    pub fn new(config: EngineConfig, storage: S) -> Self {
        Engine {
            config,
            registry: TableRegistry::new(),
            validator: SchemaValidator::new(),
            storage,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between document boundaries; setting it stops the
    /// run after the in-flight document completes
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Ingest every `.json` file in the configured input directory
    ///
    /// Per-document failures are recorded in the report and the run
    /// continues; only an unreadable input directory is fatal.
    pub fn ingest_dir(&mut self) -> Result<IngestReport, IngestError> {
        self.config.validate_input_dir()?;
        log::info!("Starting ingestion from {}", self.config.input_dir);

        let source = DocumentSource::new(&self.config.input_dir, self.config.io_retries);
        let files = source.list_files()?;

        let mut report = IngestReport::default();
        for path in files {
            if self.stop.load(Ordering::SeqCst) {
                log::info!("Stop requested; ending run at a document boundary");
                report.stopped = true;
                break;
            }

            let label = document_label(&path);
            let document = match source.read_document(&path) {
                Ok(document) => document,
                Err(err) => {
                    log::error!("Error processing {}: {}", label, err);
                    report.failures.push((label, err.to_string()));
                    continue;
                }
            };

            match self.ingest_document(&label, &document) {
                DocumentStatus::Loaded(stats) => {
                    report.documents_processed += 1;
                    report.rows_inserted += stats.inserted;
                    report.duplicates += stats.duplicates;
                    log::info!("Successfully processed {}", label);
                }
                DocumentStatus::SkippedMismatch => {
                    report.skipped_mismatch += 1;
                    log::warn!("Skipping {} due to schema mismatch", label);
                }
                DocumentStatus::Failed(err) => {
                    log::error!("Error processing {}: {}", label, err);
                    report.failures.push((label, err.to_string()));
                }
            }
        }

        log::info!(
            "Ingestion finished: {} processed, {} rows, {} duplicate(s), {} mismatch-skipped, {} failed",
            report.documents_processed,
            report.rows_inserted,
            report.duplicates,
            report.skipped_mismatch,
            report.failures.len()
        );
        Ok(report)
    }

    /// Validate and load one document inside its own transaction
    ///
    /// The unit of atomicity is the document: on any error its partial
    /// writes roll back and previously committed documents are
    /// untouched.
    pub fn ingest_document(&mut self, label: &str, document: &Value) -> DocumentStatus {
        if !self.validator.validate(document, label) {
            return DocumentStatus::SkippedMismatch;
        }

        self.storage.begin_document();
        let root_table = self.config.root_table.clone();
        let mut loader = Loader::new(&mut self.registry, &mut self.storage, &self.config);
        match loader.load_document(&root_table, document) {
            Ok(stats) => {
                self.storage.commit_document();
                DocumentStatus::Loaded(stats)
            }
            Err(err) => {
                self.storage.rollback_document();
                DocumentStatus::Failed(err)
            }
        }
    }

    /// Resolve a join plan against the discovered relationship graph
    pub fn plan_query(&self, request: &QueryPlanRequest) -> Result<QueryPlan, PlanError> {
        build_plan(&self.registry, request)
    }

    /// Serializable view of the discovered schema
    pub fn schema_export(&self) -> SchemaExport {
        self.registry.export()
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
