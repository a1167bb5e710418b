//! Core types for task planning

use std::collections::HashSet;
use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// What an executor should do when a task fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole plan
    Abort,
    /// Mark the task skipped and keep going
    Skip,
    /// Try the task again
    #[default]
    Retry,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Skip => "skip",
            FailurePolicy::Retry => "retry",
        }
    }
}

/// A single tool invocation in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID within the graph
    pub task_id: String,
    /// Display title
    pub title: String,
    /// Why this task exists
    pub intent: String,
    /// Registry name of the tool to invoke (e.g. "calendar_agent.read")
    pub tool: String,
    /// Tool-specific arguments, passed through untouched
    pub inputs: Map<String, Value>,
    /// Names of the outputs the tool must produce
    pub expected_outputs: Vec<String>,
    /// Task IDs that must finish before this one may run
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,
    /// Unset until the sanitizer fills it in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,
    /// Estimated duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_duration_min: Option<NonZeroU32>,
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        title: impl Into<String>,
        tool: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            title: title.into(),
            intent: String::new(),
            tool: tool.into(),
            inputs: Map::new(),
            expected_outputs: Vec::new(),
            depends_on: Vec::new(),
            success_criteria: None,
            failure_policy: None,
            est_duration_min: None,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    pub fn with_outputs(mut self, outputs: &[&str]) -> Self {
        self.expected_outputs = outputs.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.depends_on = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn with_success_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.success_criteria = Some(criteria.into());
        self
    }

    pub fn with_estimate(mut self, minutes: NonZeroU32) -> Self {
        self.est_duration_min = Some(minutes);
        self
    }

    /// The policy an executor should apply, treating unset as retry
    pub fn effective_failure_policy(&self) -> FailurePolicy {
        self.failure_policy.unwrap_or_default()
    }

    pub fn has_dependencies(&self) -> bool {
        !self.depends_on.is_empty()
    }
}

/// The full set of tasks for one planning request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskGraph {
    pub tasks: Vec<Task>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn task_ids(&self) -> HashSet<&str> {
        self.tasks.iter().map(|t| t.task_id.as_str()).collect()
    }

    /// Number of dependency edges (task -> dep) in the graph
    pub fn edge_count(&self) -> usize {
        self.tasks.iter().map(|t| t.depends_on.len()).sum()
    }

    /// Tasks that directly depend on `task_id`
    pub fn dependents_of<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .iter()
            .filter(move |t| t.depends_on.iter().any(|d| d == task_id))
    }

    /// Sum of the estimates that are present, in minutes
    pub fn estimated_minutes(&self) -> u32 {
        self.tasks
            .iter()
            .filter_map(|t| t.est_duration_min)
            .map(NonZeroU32::get)
            .sum()
    }
}

/// A plan as handed to a caller for persistence or display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    /// Opaque plan identifier
    pub plan_id: Uuid,
    /// Original goal text
    pub goal: String,
    pub plan: TaskGraph,
    pub created_at: DateTime<Utc>,
}

impl PlanRecord {
    pub fn new(goal: impl Into<String>, plan: TaskGraph) -> Self {
        Self {
            plan_id: Uuid::new_v4(),
            goal: goal.into(),
            plan,
            created_at: Utc::now(),
        }
    }
}
