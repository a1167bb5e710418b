//! Planning error taxonomy

use thiserror::Error;

/// Everything that can go wrong between a goal and a usable task graph.
///
/// Standalone callers of `validate` and `topological_order` see these directly.
/// Inside `Planner::plan` every variant is absorbed and replaced by the fallback plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    /// A task (or a direct registry lookup) names a tool the registry does not have
    #[error("unknown tool '{}'{}", .tool, task_suffix(.task_id))]
    UnknownTool {
        task_id: Option<String>,
        tool: String,
    },

    /// Two tasks share the same task_id
    #[error("duplicate task_id '{task_id}'")]
    DuplicateTaskId { task_id: String },

    /// A depends_on entry has no matching task in the graph
    #[error("task '{task_id}' depends on missing task '{missing_dep}'")]
    DanglingDependency {
        task_id: String,
        missing_dep: String,
    },

    /// No task depends on any other task
    #[error("plan has no dependencies between tasks")]
    NoOrderingConstraint,

    /// The dependency relation loops back on itself
    #[error("cycle detected at task '{task_id}'")]
    CycleDetected { task_id: String },

    /// Completion output was not a task graph
    #[error("failed to parse plan: {0}")]
    PlanParseFailure(String),

    /// The completion call failed, timed out or returned nothing usable
    #[error("completion failed: {0}")]
    CompletionFailure(String),
}

fn task_suffix(task_id: &Option<String>) -> String {
    match task_id {
        Some(id) => format!(" in task '{}'", id),
        None => String::new(),
    }
}

impl PlanningError {
    /// Short machine-friendly name of the variant, used in logs and fallback reasons
    pub fn kind(&self) -> &'static str {
        match self {
            PlanningError::UnknownTool { .. } => "unknown_tool",
            PlanningError::DuplicateTaskId { .. } => "duplicate_task_id",
            PlanningError::DanglingDependency { .. } => "dangling_dependency",
            PlanningError::NoOrderingConstraint => "no_ordering_constraint",
            PlanningError::CycleDetected { .. } => "cycle_detected",
            PlanningError::PlanParseFailure(_) => "plan_parse_failure",
            PlanningError::CompletionFailure(_) => "completion_failure",
        }
    }
}
