//! Dependency ordering for task graphs
//!
//! Depth-first traversal with three-color marking. The traversal keeps its own stack
//! instead of recursing, so arbitrarily deep dependency chains are fine.
//!
//! Dependencies that name a task outside the slice are ignored here; reporting them is
//! the validator's job.

use std::collections::HashMap;

use super::error::PlanningError;
use super::types::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Order tasks so every task comes after all of its dependencies.
///
/// Roots are visited in input order and dependencies in `depends_on` order, so the
/// result is deterministic. Fails with `CycleDetected` naming the task that was
/// reached again while still on the traversal path.
pub fn topological_order(tasks: &[Task]) -> Result<Vec<&Task>, PlanningError> {
    let index: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.task_id.as_str(), i))
        .collect();

    let mut marks = vec![Mark::Unvisited; tasks.len()];
    let mut order = Vec::with_capacity(tasks.len());
    // (task index, next depends_on position to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..tasks.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (current, next_dep) = *frame;
            let deps = &tasks[current].depends_on;

            if next_dep < deps.len() {
                frame.1 += 1;
                let Some(&dep) = index.get(deps[next_dep].as_str()) else {
                    continue;
                };
                match marks[dep] {
                    Mark::InProgress => {
                        return Err(PlanningError::CycleDetected {
                            task_id: tasks[dep].task_id.clone(),
                        });
                    }
                    Mark::Done => {}
                    Mark::Unvisited => {
                        marks[dep] = Mark::InProgress;
                        stack.push((dep, 0));
                    }
                }
            } else {
                marks[current] = Mark::Done;
                order.push(&tasks[current]);
                stack.pop();
            }
        }
    }

    Ok(order)
}

/// Group tasks into waves that can run in parallel.
///
/// Wave 0 holds tasks with no (resolvable) dependencies; every later task sits one wave
/// after its deepest dependency. Within a wave tasks keep their topological order.
pub fn execution_levels(tasks: &[Task]) -> Result<Vec<Vec<&Task>>, PlanningError> {
    let ordered = topological_order(tasks)?;
    let mut level_of: HashMap<&str, usize> = HashMap::with_capacity(ordered.len());
    let mut levels: Vec<Vec<&Task>> = Vec::new();

    for task in ordered {
        let level = task
            .depends_on
            .iter()
            .filter_map(|dep| level_of.get(dep.as_str()))
            .map(|l| l + 1)
            .max()
            .unwrap_or(0);
        level_of.insert(task.task_id.as_str(), level);

        if levels.len() <= level {
            levels.resize_with(level + 1, Vec::new);
        }
        levels[level].push(task);
    }

    Ok(levels)
}
