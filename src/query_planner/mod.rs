pub mod errors;
pub mod join_path;
pub mod plan;

// Re-export commonly used types
pub use errors::PlanError;
pub use join_path::find_join_path;
pub use plan::{build_plan, FilterCondition, JoinStep, QueryPlan, QueryPlanRequest};
