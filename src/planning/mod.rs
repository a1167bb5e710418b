//! Task Planning Module
//!
//! Turns a natural-language goal into a validated, dependency-ordered graph of
//! tool invocations, falling back to a fixed plan when completion fails.

pub mod error;
pub mod fallback;
pub mod ordering;
pub mod planner;
pub mod registry;
pub mod sanitizer;
pub mod types;
pub mod validator;

pub use error::PlanningError;
pub use fallback::fallback_plan;
pub use ordering::{execution_levels, topological_order};
pub use planner::{compose_prompt, parse_task_graph, PlanOutcome, PlanSource, Planner};
pub use registry::{ToolRegistry, ToolSpec};
pub use sanitizer::sanitize;
pub use types::{FailurePolicy, PlanRecord, Task, TaskGraph};
pub use validator::validate;
