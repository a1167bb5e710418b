//! Default-filling pass applied before validation
//!
//! Sanitizing never rejects a graph. Each rule fills in one kind of missing value;
//! structural checks live in the validator.

use super::types::{FailurePolicy, Task, TaskGraph};

type Rule = fn(&mut Task);

const RULES: &[Rule] = &[default_failure_policy];

/// Apply every normalization rule to every task
pub fn sanitize(mut graph: TaskGraph) -> TaskGraph {
    for task in &mut graph.tasks {
        for &rule in RULES {
            rule(task);
        }
    }
    graph
}

fn default_failure_policy(task: &mut Task) {
    if task.failure_policy.is_none() {
        task.failure_policy = Some(FailurePolicy::Retry);
    }
}
