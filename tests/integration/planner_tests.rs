use crate::common::*;
use inbox_planner::planning::{
    fallback_plan, topological_order, validate, FailurePolicy, PlanSource, Planner, PlanningError,
    ToolRegistry, ToolSpec,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn planner_with(completer: Arc<ScriptedCompleter>) -> Planner {
    Planner::new(Arc::new(ToolRegistry::builtin()), completer)
}

#[tokio::test]
async fn test_completion_failure_returns_fallback() {
    let completer = Arc::new(ScriptedCompleter::failing("service unavailable"));
    let planner = planner_with(completer.clone());

    let graph = planner
        .plan("Plan my week, book dentist, draft replies", None)
        .await;

    assert_eq!(graph, fallback_plan());
    assert_eq!(completer.call_count(), 1);

    let ids: Vec<_> = graph.tasks.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    assert_eq!(graph.tasks[0].tool, "calendar_agent.read");
    assert!(graph.tasks[0].depends_on.is_empty());
    assert_eq!(graph.tasks[1].tool, "booking_agent.search_providers");
    assert_eq!(graph.tasks[1].depends_on, vec!["t1"]);
    assert_eq!(graph.tasks[2].tool, "email_agent.draft_batch");
    assert_eq!(graph.tasks[2].depends_on, vec!["t1"]);

    let order = topological_order(&graph.tasks).unwrap();
    assert_eq!(order[0].task_id, "t1");
    assert_eq!(order.len(), 3);
}

#[tokio::test]
async fn test_fallback_guarantee_properties() {
    let planner = planner_with(Arc::new(ScriptedCompleter::failing("boom")));
    let registry = ToolRegistry::builtin();

    let graph = planner.plan("anything at all", None).await;

    assert!(graph.len() >= 3);
    assert!(graph.tasks.iter().any(|t| !t.depends_on.is_empty()));
    assert!(graph.tasks.iter().all(|t| registry.contains(&t.tool)));
}

#[tokio::test]
async fn test_valid_completion_is_used() {
    let completer = Arc::new(ScriptedCompleter::replying(VALID_PLAN_JSON));
    let planner = planner_with(completer);

    let outcome = planner.plan_with_outcome("Plan my week", None).await;

    assert_eq!(outcome.source, PlanSource::Completion);
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.graph.len(), 4);

    // unset policies are sanitized, explicit ones kept
    let plan_task = outcome.graph.get("plan").unwrap();
    assert_eq!(plan_task.failure_policy, Some(FailurePolicy::Abort));
    for id in ["read", "dentist", "propose"] {
        assert_eq!(
            outcome.graph.get(id).unwrap().failure_policy,
            Some(FailurePolicy::Retry)
        );
    }
    assert_eq!(outcome.graph.estimated_minutes(), 2);
}

#[tokio::test]
async fn test_markdown_wrapped_completion_is_used() {
    let wrapped = format!("Sure! Here's your plan:\n```json\n{}\n```", VALID_PLAN_JSON);
    let planner = planner_with(Arc::new(ScriptedCompleter::replying(&wrapped)));

    let outcome = planner.plan_with_outcome("Plan my week", None).await;
    assert_eq!(outcome.source, PlanSource::Completion);
}

#[tokio::test]
async fn test_prompt_contains_catalog_goal_and_context() {
    let completer = Arc::new(ScriptedCompleter::replying(VALID_PLAN_JSON));
    let planner = planner_with(completer.clone());
    let context = json!({"user": "sam", "timezone": "UTC"});

    planner
        .plan("Book a dentist next week", context.as_object())
        .await;

    let prompt = completer.last_prompt().unwrap();
    assert!(prompt.starts_with("You are a planning agent. Available tools:"));
    assert!(prompt.contains("- calendar_agent.read: Read calendar events and free time blocks."));
    assert!(prompt.contains("- email_agent.draft_batch: Draft email replies in batch."));
    assert!(prompt.contains("Goal: Book a dentist next week"));
    assert!(prompt.contains("Context: "));
    assert!(prompt.contains("\"timezone\":\"UTC\""));
}

#[tokio::test]
async fn test_malformed_completion_falls_back() {
    let planner = planner_with(Arc::new(ScriptedCompleter::replying("no plan today")));

    let outcome = planner.plan_with_outcome("goal", None).await;
    assert!(outcome.is_fallback());
    assert_eq!(outcome.graph, fallback_plan());

    let err = planner.try_plan("goal", None).await.unwrap_err();
    assert!(matches!(err, PlanningError::PlanParseFailure(_)));
}

#[tokio::test]
async fn test_empty_completion_is_a_completion_failure() {
    let planner = planner_with(Arc::new(ScriptedCompleter::replying("   \n")));

    let err = planner.try_plan("goal", None).await.unwrap_err();
    assert!(matches!(err, PlanningError::CompletionFailure(_)));
}

#[tokio::test]
async fn test_invalid_completion_plans_fall_back() {
    let cases = [
        (
            r#"{"tasks": [{"task_id": "a", "title": "A", "intent": "", "tool": "calendar_agent.read",
                "inputs": {}, "expected_outputs": []}]}"#,
            "no_ordering_constraint",
        ),
        (
            r#"{"tasks": [
                {"task_id": "a", "title": "A", "intent": "", "tool": "calendar_agent.read",
                 "inputs": {}, "expected_outputs": [], "depends_on": ["b"]},
                {"task_id": "b", "title": "B", "intent": "", "tool": "calendar_agent.read",
                 "inputs": {}, "expected_outputs": [], "depends_on": ["a"]}]}"#,
            "cycle_detected",
        ),
        (
            r#"{"tasks": [
                {"task_id": "a", "title": "A", "intent": "", "tool": "calendar_agent.read",
                 "inputs": {}, "expected_outputs": []},
                {"task_id": "b", "title": "B", "intent": "", "tool": "travel_agent.book_flight",
                 "inputs": {}, "expected_outputs": [], "depends_on": ["a"]}]}"#,
            "unknown_tool",
        ),
        (
            r#"{"tasks": [
                {"task_id": "a", "title": "A", "intent": "", "tool": "calendar_agent.read",
                 "inputs": {}, "expected_outputs": [], "depends_on": ["zzz"]}]}"#,
            "dangling_dependency",
        ),
    ];

    for (response, kind) in cases {
        let planner = planner_with(Arc::new(ScriptedCompleter::replying(response)));

        let err = planner.try_plan("goal", None).await.unwrap_err();
        assert_eq!(err.kind(), kind);

        let graph = planner.plan("goal", None).await;
        assert_eq!(graph, fallback_plan());
    }
}

#[tokio::test]
async fn test_slow_completion_times_out_to_fallback() {
    let completer = Arc::new(
        ScriptedCompleter::replying(VALID_PLAN_JSON).with_delay(Duration::from_millis(500)),
    );
    let planner = planner_with(completer).with_timeout(Duration::from_millis(20));

    let outcome = planner.plan_with_outcome("goal", None).await;
    match outcome.source {
        PlanSource::Fallback { reason } => assert!(reason.contains("timed out")),
        PlanSource::Completion => panic!("expected fallback"),
    }
}

#[tokio::test]
async fn test_no_retry_on_failure() {
    let completer = Arc::new(ScriptedCompleter::failing("rate limited"));
    let planner = planner_with(completer.clone());

    planner.plan("goal", None).await;
    planner.plan("goal", None).await;

    assert_eq!(completer.call_count(), 2);
}

#[tokio::test]
async fn test_extra_tools_are_accepted() {
    let registry = ToolRegistry::with_extra_tools(vec![ToolSpec::new(
        "notes_agent.write",
        "Write a note to the user's notebook.",
    )
    .with_outputs(&["note_id"])]);
    let response = r#"{"tasks": [
        {"task_id": "a", "title": "A", "intent": "", "tool": "calendar_agent.read",
         "inputs": {}, "expected_outputs": ["events"]},
        {"task_id": "b", "title": "B", "intent": "", "tool": "notes_agent.write",
         "inputs": {}, "expected_outputs": ["note_id"], "depends_on": ["a"]}]}"#;
    let completer = Arc::new(ScriptedCompleter::replying(response));
    let planner = Planner::new(Arc::new(registry), completer.clone());

    let outcome = planner.plan_with_outcome("Write down my week", None).await;

    assert_eq!(outcome.source, PlanSource::Completion);
    assert!(completer
        .last_prompt()
        .unwrap()
        .contains("- notes_agent.write: Write a note to the user's notebook."));
}

#[tokio::test]
async fn test_fallback_valid_against_extended_registry() {
    let registry = ToolRegistry::with_extra_tools(vec![
        ToolSpec::new("notes_agent.write", "Write a note."),
        ToolSpec::new("notes_agent.read", "Read notes."),
        ToolSpec::new("calendar_agent.read", "Read the shared team calendar."),
    ]);
    let completer = Arc::new(ScriptedCompleter::failing("service unavailable"));
    let planner = Planner::new(Arc::new(registry), completer);

    let graph = planner.plan("goal", None).await;

    assert_eq!(graph, fallback_plan());
    assert!(validate(graph, planner.registry()).is_ok());
}

#[tokio::test]
async fn test_concurrent_planning_requests() {
    let planner = planner_with(Arc::new(ScriptedCompleter::replying(VALID_PLAN_JSON)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let planner = planner.clone();
            tokio::spawn(async move { planner.plan(&format!("goal {}", i), None).await })
        })
        .collect();

    for handle in handles {
        let graph = handle.await.unwrap();
        assert_eq!(graph.len(), 4);
    }
}

#[test]
fn test_validate_twice_is_identical() {
    let registry = ToolRegistry::builtin();
    let first = validate(fallback_plan(), &registry).unwrap();
    let second = validate(first.clone(), &registry).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_accepted_graph_orders_every_task_once() {
    let registry = ToolRegistry::builtin();
    let graph = inbox_planner::planning::parse_task_graph(VALID_PLAN_JSON).unwrap();
    let graph = validate(graph, &registry).unwrap();

    let order = topological_order(&graph.tasks).unwrap();
    assert_eq!(order.len(), graph.len());

    let position = |id: &str| order.iter().position(|t| t.task_id == id).unwrap();
    for task in &graph.tasks {
        for dep in &task.depends_on {
            assert!(position(dep) < position(&task.task_id));
        }
    }
}
