//! JSON corpus directory source
//!
//! Lists `.json` files in deterministic order and reads them with a
//! bounded retry policy: transient I/O failures are retried a small fixed
//! number of times with a short backoff, then surfaced as a document
//! failure. Malformed JSON is a local data error and is never retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use super::errors::IngestError;

/// Backoff between I/O retry attempts
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

pub struct DocumentSource {
    dir: PathBuf,
    io_retries: usize,
}

impl DocumentSource {
    pub fn new(dir: impl Into<PathBuf>, io_retries: usize) -> Self {
        DocumentSource {
            dir: dir.into(),
            io_retries,
        }
    }

    /// List the corpus `.json` files, sorted by file name
    pub fn list_files(&self) -> Result<Vec<PathBuf>, IngestError> {
        let entries = read_dir_with_retry(&self.dir, self.io_retries)?;
        let mut files: Vec<PathBuf> = entries
            .into_iter()
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Read and parse one document
    pub fn read_document(&self, path: &Path) -> Result<Value, IngestError> {
        let content = read_with_retry(path, self.io_retries)?;
        serde_json::from_str(&content).map_err(|source| IngestError::Parse {
            label: document_label(path),
            source,
        })
    }
}

/// File name used to identify a document in logs and reports
pub fn document_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_with_retry(path: &Path, retries: usize) -> Result<String, IngestError> {
    let attempts = retries + 1;
    let mut last_error = None;

    for attempt in 1..=attempts {
        match std::fs::read_to_string(path) {
            Ok(content) => return Ok(content),
            Err(err) => {
                log::warn!(
                    "Read attempt {}/{} failed for {}: {}",
                    attempt,
                    attempts,
                    path.display(),
                    err
                );
                last_error = Some(err);
                if attempt < attempts {
                    std::thread::sleep(RETRY_BACKOFF);
                }
            }
        }
    }

    Err(IngestError::Io {
        path: path.display().to_string(),
        attempts,
        source: last_error.expect("at least one attempt was made"),
    })
}

fn read_dir_with_retry(dir: &Path, retries: usize) -> Result<Vec<PathBuf>, IngestError> {
    let attempts = retries + 1;
    let mut last_error = None;

    for attempt in 1..=attempts {
        match std::fs::read_dir(dir) {
            Ok(entries) => {
                return Ok(entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .collect())
            }
            Err(err) => {
                log::warn!(
                    "Directory listing attempt {}/{} failed for {}: {}",
                    attempt,
                    attempts,
                    dir.display(),
                    err
                );
                last_error = Some(err);
                if attempt < attempts {
                    std::thread::sleep(RETRY_BACKOFF);
                }
            }
        }
    }

    Err(IngestError::Io {
        path: dir.display().to_string(),
        attempts,
        source: last_error.expect("at least one attempt was made"),
    })
}
