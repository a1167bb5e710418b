//! Structural validation of task graphs
//!
//! Reference errors are reported before ordering is attempted, since an order over a
//! graph with dangling edges or unknown tools means nothing.

use std::collections::HashSet;

use super::error::PlanningError;
use super::ordering::topological_order;
use super::registry::ToolRegistry;
use super::types::TaskGraph;

/// Check every task graph invariant and hand the graph back unchanged.
///
/// Checks run in a fixed order and stop at the first failure:
/// duplicate ids, dangling dependencies, unknown tools, missing ordering
/// constraint, cycles.
pub fn validate(graph: TaskGraph, registry: &ToolRegistry) -> Result<TaskGraph, PlanningError> {
    check_unique_ids(&graph)?;
    check_dependencies_exist(&graph)?;
    check_tools_registered(&graph, registry)?;
    check_has_ordering(&graph)?;
    topological_order(&graph.tasks)?;
    Ok(graph)
}

fn check_unique_ids(graph: &TaskGraph) -> Result<(), PlanningError> {
    let mut seen = HashSet::with_capacity(graph.len());
    for task in &graph.tasks {
        if !seen.insert(task.task_id.as_str()) {
            return Err(PlanningError::DuplicateTaskId {
                task_id: task.task_id.clone(),
            });
        }
    }
    Ok(())
}

fn check_dependencies_exist(graph: &TaskGraph) -> Result<(), PlanningError> {
    let task_ids = graph.task_ids();
    for task in &graph.tasks {
        if let Some(missing) = task
            .depends_on
            .iter()
            .find(|dep| !task_ids.contains(dep.as_str()))
        {
            return Err(PlanningError::DanglingDependency {
                task_id: task.task_id.clone(),
                missing_dep: missing.clone(),
            });
        }
    }
    Ok(())
}

fn check_tools_registered(graph: &TaskGraph, registry: &ToolRegistry) -> Result<(), PlanningError> {
    match graph.tasks.iter().find(|t| !registry.contains(&t.tool)) {
        Some(task) => Err(PlanningError::UnknownTool {
            task_id: Some(task.task_id.clone()),
            tool: task.tool.clone(),
        }),
        None => Ok(()),
    }
}

fn check_has_ordering(graph: &TaskGraph) -> Result<(), PlanningError> {
    if graph.tasks.iter().any(|t| t.has_dependencies()) {
        Ok(())
    } else {
        Err(PlanningError::NoOrderingConstraint)
    }
}
