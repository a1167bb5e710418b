//! Catalog of tools the planner may schedule

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::error::PlanningError;

/// Declared shape of an invocable tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Dotted registry key, e.g. "calendar_agent.read"
    pub name: String,
    /// Used verbatim when listing capabilities in the planning prompt
    pub description: String,
    /// Input name -> type hint. Descriptive only, never enforced.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inputs: BTreeMap::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: &str, type_hint: &str) -> Self {
        self.inputs.insert(name.to_string(), type_hint.to_string());
        self
    }

    pub fn with_outputs(mut self, outputs: &[&str]) -> Self {
        self.outputs = outputs.iter().map(|o| o.to_string()).collect();
        self
    }
}

/// Immutable tool catalog, kept in insertion order
///
/// Built once at startup and shared behind an `Arc`; there is no way to mutate it
/// afterwards, so concurrent planners can read it freely. Every public constructor
/// starts from the built-in tools, which the fallback plan relies on.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry from specs. A repeated name replaces the earlier spec in place.
    pub(crate) fn new(specs: impl IntoIterator<Item = ToolSpec>) -> Self {
        let mut registry = Self {
            tools: Vec::new(),
            index: HashMap::new(),
        };
        for spec in specs {
            registry.insert(spec);
        }
        registry
    }

    /// The built-in calendar, booking and email tools
    pub fn builtin() -> Self {
        Self::new(builtin_tools())
    }

    /// Built-in tools followed by `extra`. An extra tool sharing a built-in name
    /// replaces its description and shape but keeps the name registered.
    pub fn with_extra_tools(extra: impl IntoIterator<Item = ToolSpec>) -> Self {
        Self::new(builtin_tools().into_iter().chain(extra))
    }

    fn insert(&mut self, spec: ToolSpec) {
        match self.index.get(&spec.name) {
            Some(&pos) => self.tools[pos] = spec,
            None => {
                self.index.insert(spec.name.clone(), self.tools.len());
                self.tools.push(spec);
            }
        }
    }

    pub fn get_tool(&self, name: &str) -> Result<&ToolSpec, PlanningError> {
        self.index
            .get(name)
            .map(|&pos| &self.tools[pos])
            .ok_or_else(|| PlanningError::UnknownTool {
                task_id: None,
                tool: name.to_string(),
            })
    }

    /// Every tool in catalog order
    pub fn all_tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "calendar_agent.read",
            "Read calendar events and free time blocks.",
        )
        .with_input("window_days", "int")
        .with_outputs(&["events", "free_blocks"]),
        ToolSpec::new(
            "scheduler_agent.block_plan",
            "Generate a weekly plan given events, free blocks, and preferences.",
        )
        .with_input("events", "list")
        .with_input("free_blocks", "list")
        .with_input("prefs", "dict")
        .with_outputs(&["weekly_plan"]),
        ToolSpec::new(
            "booking_agent.search_providers",
            "Search for providers (e.g., dentists) given insurance, location, and window.",
        )
        .with_input("insurance", "str")
        .with_input("location", "str")
        .with_input("window_days", "int")
        .with_outputs(&["provider_options"]),
        ToolSpec::new("booking_agent.propose", "Propose ranked appointment slots.")
            .with_input("options", "list")
            .with_input("free_blocks", "list")
            .with_outputs(&["ranked_slot_proposals"]),
        ToolSpec::new("email_agent.draft_batch", "Draft email replies in batch.")
            .with_input("inbox_filter", "dict")
            .with_input("tone", "str")
            .with_outputs(&["drafts"]),
    ]
}
