//! Completion-based task planner
//!
//! Turns a goal into a validated task graph: compose a prompt from the tool catalog,
//! ask the completer, parse, sanitize and validate. If any of that fails the caller
//! still gets a usable plan, the fixed fallback.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::llm::Completer;

use super::error::PlanningError;
use super::fallback::fallback_plan;
use super::registry::ToolRegistry;
use super::sanitizer::sanitize;
use super::types::TaskGraph;
use super::validator::validate;

const PLANNING_PREAMBLE: &str = "You are a planning agent. Available tools:";

const RESPONSE_FORMAT: &str = r#"Return a JSON object with tasks, dependencies, and tool usage.
Respond with ONLY the JSON object (no markdown, no explanation):
{
  "tasks": [
    {
      "task_id": "t1",
      "title": "Short display title",
      "intent": "Why this task is needed",
      "tool": "one of the tool names listed above",
      "inputs": {"input_name": "value"},
      "expected_outputs": ["output_name"],
      "depends_on": [],
      "success_criteria": "optional",
      "failure_policy": "abort | skip | retry",
      "est_duration_min": 15
    }
  ]
}
At least one task must depend on another. Every depends_on entry must be a task_id from the same plan."#;

/// Where a returned plan came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    /// Parsed from completion output and validated
    Completion,
    /// The fixed fallback, with the reason completion-based planning failed
    Fallback { reason: String },
}

/// A plan together with its provenance
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub graph: TaskGraph,
    pub source: PlanSource,
}

impl PlanOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PlanSource::Fallback { .. })
    }
}

/// Planner engine. Holds no per-request state, so one instance can serve
/// concurrent requests.
#[derive(Clone)]
pub struct Planner {
    registry: Arc<ToolRegistry>,
    completer: Arc<dyn Completer>,
    timeout: Option<Duration>,
    log_prompts: bool,
}

impl Planner {
    pub fn new(registry: Arc<ToolRegistry>, completer: Arc<dyn Completer>) -> Self {
        Self {
            registry,
            completer,
            timeout: None,
            log_prompts: false,
        }
    }

    /// Treat a completion that takes longer than `timeout` as failed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Log every composed prompt at debug level
    pub fn with_prompt_logging(mut self, enabled: bool) -> Self {
        self.log_prompts = enabled;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Plan for `goal`. Never fails: any planning error yields the fallback plan.
    pub async fn plan(&self, goal: &str, context: Option<&Map<String, Value>>) -> TaskGraph {
        self.plan_with_outcome(goal, context).await.graph
    }

    /// Like [`Planner::plan`], but reports whether the fallback was used
    pub async fn plan_with_outcome(
        &self,
        goal: &str,
        context: Option<&Map<String, Value>>,
    ) -> PlanOutcome {
        match self.try_plan(goal, context).await {
            Ok(graph) => PlanOutcome {
                graph,
                source: PlanSource::Completion,
            },
            Err(err) => {
                tracing::warn!(
                    kind = err.kind(),
                    error = %err,
                    "Planning failed, using fallback plan"
                );
                PlanOutcome {
                    graph: fallback_plan(),
                    source: PlanSource::Fallback {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    /// Run the planning pipeline and surface the first error instead of falling back
    pub async fn try_plan(
        &self,
        goal: &str,
        context: Option<&Map<String, Value>>,
    ) -> Result<TaskGraph, PlanningError> {
        let prompt = compose_prompt(&self.registry, goal, context);
        if self.log_prompts {
            tracing::debug!(prompt = %prompt, "Composed planning prompt");
        }

        let raw = self.complete(&prompt).await?;
        let graph = parse_task_graph(&raw)?;
        tracing::debug!(tasks = graph.len(), "Parsed plan from completion");

        let graph = validate(sanitize(graph), &self.registry)?;
        tracing::info!(
            tasks = graph.len(),
            edges = graph.edge_count(),
            "Plan validated"
        );
        Ok(graph)
    }

    async fn complete(&self, prompt: &str) -> Result<String, PlanningError> {
        tracing::debug!(completer = self.completer.name(), "Requesting plan completion");

        let call = self.completer.complete(prompt);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                PlanningError::CompletionFailure(format!("timed out after {:?}", limit))
            })?,
            None => call.await,
        };

        let text = result.map_err(|e| PlanningError::CompletionFailure(format!("{:#}", e)))?;
        if text.trim().is_empty() {
            return Err(PlanningError::CompletionFailure(
                "empty completion output".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Build the completion prompt: preamble, tool catalog in registry order, goal,
/// optional context and the expected response format.
pub fn compose_prompt(
    registry: &ToolRegistry,
    goal: &str,
    context: Option<&Map<String, Value>>,
) -> String {
    let mut prompt = String::from(PLANNING_PREAMBLE);
    prompt.push('\n');
    for tool in registry.all_tools() {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }

    prompt.push_str(&format!("\nGoal: {}\n", goal));
    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        // A Map of Values always serializes
        let rendered = serde_json::to_string(ctx).unwrap_or_default();
        prompt.push_str(&format!("Context: {}\n", rendered));
    }

    prompt.push('\n');
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

/// Parse completion output into a task graph, tolerating markdown fences and
/// surrounding prose
///
/// Every `{` is tried as the start of a plan object, so braces in leading prose do
/// not hide the plan that follows. Trailing text after the object is ignored.
pub fn parse_task_graph(text: &str) -> Result<TaskGraph, PlanningError> {
    let mut first_error = None;
    for (pos, _) in text.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&text[pos..]).into_iter::<TaskGraph>();
        match values.next() {
            Some(Ok(graph)) => return Ok(graph),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    let reason = match first_error {
        Some(e) => e.to_string(),
        None => "no JSON object in response".to_string(),
    };
    let preview: String = text.chars().take(200).collect();
    Err(PlanningError::PlanParseFailure(format!(
        "{} (response was: {})",
        reason, preview
    )))
}
