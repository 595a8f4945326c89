use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Input directory does not exist or is not readable: {path}")]
    InputDir { path: String },
}

/// Engine configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the JSON corpus
    #[validate(length(min = 1, message = "Input directory cannot be empty"))]
    pub input_dir: String,

    /// Table name for root-level documents
    #[validate(length(min = 1, message = "Root table name cannot be empty"))]
    pub root_table: String,

    /// Rows per flush when loading array-valued documents
    #[validate(range(
        min = 1,
        max = 1_000_000,
        message = "Batch size must be between 1 and 1000000"
    ))]
    pub batch_size: usize,

    /// String length above which a column is classified as long text
    #[validate(range(
        min = 1,
        max = 65535,
        message = "Long-text threshold must be between 1 and 65535"
    ))]
    pub long_text_threshold: usize,

    /// Maximum nesting depth followed when loading a document subtree
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Max document depth must be between 1 and 1000"
    ))]
    pub max_document_depth: usize,

    /// Retry attempts for transient I/O failures while reading the corpus
    #[validate(range(min = 0, max = 10, message = "I/O retries must be between 0 and 10"))]
    pub io_retries: usize,

    /// Column-name suffixes treated as foreign-key-shaped by the
    /// many-to-many heuristic
    #[validate(length(min = 1, message = "At least one foreign-key suffix is required"))]
    pub foreign_key_suffixes: Vec<String>,

    /// Minimum count of foreign-key-shaped fields in a list element for
    /// the list to classify as a many-to-many relationship
    #[validate(range(
        min = 2,
        max = 16,
        message = "Junction FK threshold must be between 2 and 16"
    ))]
    pub junction_fk_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_dir: "./json".to_string(),
            root_table: "root".to_string(),
            batch_size: 1000,
            long_text_threshold: 255,
            max_document_depth: 32,
            io_retries: 3,
            foreign_key_suffixes: vec!["_id".to_string()],
            junction_fk_threshold: 2,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            input_dir: env::var("JSON2REL_INPUT_DIR").unwrap_or_else(|_| "./json".to_string()),
            root_table: env::var("JSON2REL_ROOT_TABLE").unwrap_or_else(|_| "root".to_string()),
            batch_size: parse_env_var("JSON2REL_BATCH_SIZE", "1000")?,
            long_text_threshold: parse_env_var("JSON2REL_LONG_TEXT_THRESHOLD", "255")?,
            max_document_depth: parse_env_var("JSON2REL_MAX_DOCUMENT_DEPTH", "32")?,
            io_retries: parse_env_var("JSON2REL_IO_RETRIES", "3")?,
            foreign_key_suffixes: parse_suffix_list(
                env::var("JSON2REL_FK_SUFFIXES").unwrap_or_else(|_| "_id".to_string()),
            ),
            junction_fk_threshold: parse_env_var("JSON2REL_JUNCTION_FK_THRESHOLD", "2")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            input_dir: cli.input_dir,
            root_table: cli.root_table,
            batch_size: cli.batch_size,
            long_text_threshold: cli.long_text_threshold,
            max_document_depth: cli.max_document_depth,
            io_retries: cli.io_retries,
            foreign_key_suffixes: cli.foreign_key_suffixes,
            junction_fk_threshold: cli.junction_fk_threshold,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the configured input directory exists before a run starts
    pub fn validate_input_dir(&self) -> Result<(), ConfigError> {
        let path = std::path::Path::new(&self.input_dir);
        if !path.is_dir() {
            return Err(ConfigError::InputDir {
                path: self.input_dir.clone(),
            });
        }
        Ok(())
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub input_dir: String,
    pub root_table: String,
    pub batch_size: usize,
    pub long_text_threshold: usize,
    pub max_document_depth: usize,
    pub io_retries: usize,
    pub foreign_key_suffixes: Vec<String>,
    pub junction_fk_threshold: usize,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

/// Split a comma-separated suffix list, dropping empty entries
fn parse_suffix_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
