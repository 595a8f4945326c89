//! # Query Planner Error Types

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanError {
    #[error("Unknown table `{table}` in query-plan request")]
    UnknownTable { table: String },
    #[error("No join path connects `{from}` to `{to}`")]
    UnreachableJoin { from: String, to: String },
}
