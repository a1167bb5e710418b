//! Deterministic plan returned when completion-based planning fails

use serde_json::json;

use super::types::{FailurePolicy, Task, TaskGraph};

/// Fixed three-task plan: read the week's calendar, then book a dentist and draft
/// replies in parallel. Independent of the goal and always valid against the
/// built-in registry.
pub fn fallback_plan() -> TaskGraph {
    let t1 = Task::new("t1", "Read calendar for the week", "calendar_agent.read")
        .with_intent("Get all events and free time blocks for the week")
        .with_input("window_days", json!(7))
        .with_outputs(&["events", "free_blocks"])
        .with_failure_policy(FailurePolicy::Retry);

    let t2 = Task::new("t2", "Book dentist appointment", "booking_agent.search_providers")
        .with_intent("Find and propose dentist appointments")
        .with_input("insurance", json!("user_insurance"))
        .with_input("location", json!("user_location"))
        .with_input("window_days", json!(14))
        .with_outputs(&["provider_options"])
        .with_dependencies(&["t1"])
        .with_failure_policy(FailurePolicy::Retry);

    let t3 = Task::new("t3", "Draft email replies", "email_agent.draft_batch")
        .with_intent("Draft replies to important emails")
        .with_input("inbox_filter", json!({"unread": true, "important": true}))
        .with_input("tone", json!("professional"))
        .with_outputs(&["drafts"])
        .with_dependencies(&["t1"])
        .with_failure_policy(FailurePolicy::Retry);

    TaskGraph::new(vec![t1, t2, t3])
}
