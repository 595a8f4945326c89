use anyhow::Context;
use clap::Parser;
use json2rel::engine::Engine;
use json2rel::query_planner::QueryPlanRequest;
use json2rel::{config, engine};

/// json2rel - Relational-schema inference over schemaless JSON corpora
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the JSON corpus
    #[arg(long, default_value = "./json")]
    input_dir: String,

    /// Table name for root-level documents
    #[arg(long, default_value = "root")]
    root_table: String,

    /// Rows per flush when loading array-valued documents
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// String length above which a column is classified as long text
    #[arg(long, default_value_t = 255)]
    long_text_threshold: usize,

    /// Maximum nesting depth followed when loading a document subtree
    #[arg(long, default_value_t = 32)]
    max_document_depth: usize,

    /// Retry attempts for transient I/O failures
    #[arg(long, default_value_t = 3)]
    io_retries: usize,

    /// Column-name suffixes treated as foreign-key-shaped
    #[arg(long, value_delimiter = ',', default_value = "_id")]
    fk_suffixes: Vec<String>,

    /// Minimum FK-shaped field count for a many-to-many classification
    #[arg(long, default_value_t = 2)]
    junction_fk_threshold: usize,

    /// Load configuration from a YAML file instead of the flags above
    #[arg(long)]
    config_file: Option<String>,

    /// Print the join path from this table to --join-to after ingestion
    #[arg(long, requires = "join_to")]
    join_from: Option<String>,

    /// Target table for --join-from
    #[arg(long, requires = "join_from")]
    join_to: Option<String>,
}

impl From<Cli> for config::CliConfig {
    fn from(cli: Cli) -> Self {
        config::CliConfig {
            input_dir: cli.input_dir,
            root_table: cli.root_table,
            batch_size: cli.batch_size,
            long_text_threshold: cli.long_text_threshold,
            max_document_depth: cli.max_document_depth,
            io_retries: cli.io_retries,
            foreign_key_suffixes: cli.fk_suffixes,
            junction_fk_threshold: cli.junction_fk_threshold,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let join = match (&cli.join_from, &cli.join_to) {
        (Some(from), Some(to)) => Some((from.clone(), to.clone())),
        _ => None,
    };

    let config_file = cli.config_file.clone();
    let config = match config_file {
        Some(path) => config::EngineConfig::from_yaml_file(path),
        None => config::EngineConfig::from_cli(cli.into()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let mut engine = Engine::in_memory(config);
    let report = engine.ingest_dir().context("ingestion run failed")?;
    print_report(&report);

    let schema = serde_json::to_string_pretty(&engine.schema_export())
        .context("schema export serialization failed")?;
    println!("{}", schema);

    if let Some((from, to)) = join {
        let request = QueryPlanRequest {
            main_table: from.clone(),
            target_tables: vec![to.clone()],
            filter_conditions: vec![],
            requested_fields: vec![],
        };
        let plan = engine
            .plan_query(&request)
            .with_context(|| format!("no executable join plan from `{from}` to `{to}`"))?;
        for step in &plan.joins {
            println!(
                "JOIN {} ON {}.{} = {}.{}",
                step.from_table, step.from_table, step.from_column, step.to_table, step.to_column
            );
        }
    }

    Ok(())
}

fn print_report(report: &engine::IngestReport) {
    println!(
        "Processed {} document(s): {} row(s) inserted, {} duplicate(s), {} skipped on mismatch, {} failed",
        report.documents_processed,
        report.rows_inserted,
        report.duplicates,
        report.skipped_mismatch,
        report.failures.len()
    );
    for (label, reason) in &report.failures {
        println!("  failed {}: {}", label, reason);
    }
}
