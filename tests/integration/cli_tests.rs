use crate::common::*;
use anyhow::Result;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_cli_help() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run(&["--help"]).await?;

    assert_success(&output);
    assert!(output_to_string(&output).contains("inbox-planner"));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_cli_fallback_prints_plan() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run(&["fallback"]).await?;

    assert_success(&output);
    let plan: serde_json::Value = serde_json::from_str(&output_to_string(&output))?;
    assert_eq!(plan["tasks"].as_array().map(|t| t.len()), Some(3));
    assert_eq!(plan["tasks"][0]["task_id"], "t1");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_cli_plan_offline_returns_fallback_record() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env
        .run(&[
            "plan",
            "Plan my week, book dentist, draft replies",
            "--context",
            r#"{"timezone": "UTC"}"#,
        ])
        .await?;

    assert_success(&output);
    let record: serde_json::Value = serde_json::from_str(&output_to_string(&output))?;
    assert_eq!(record["goal"], "Plan my week, book dentist, draft replies");
    assert!(record["plan_id"].as_str().is_some());
    assert_eq!(record["plan"]["tasks"][1]["depends_on"][0], "t1");
    assert!(stderr_to_string(&output).contains("fallback"));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_cli_plan_strict_fails_offline() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run(&["plan", "anything", "--strict"]).await?;

    assert!(!output.status.success());
    assert!(stderr_to_string(&output).contains("Planning failed"));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_cli_plan_rejects_non_object_context() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run(&["plan", "goal", "--context", "[1, 2]"]).await?;

    assert!(!output.status.success());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_cli_tools_lists_catalog() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = env.run(&["tools"]).await?;

    assert_success(&output);
    let stdout = output_to_string(&output);
    for name in [
        "calendar_agent.read",
        "scheduler_agent.block_plan",
        "booking_agent.search_providers",
        "booking_agent.propose",
        "email_agent.draft_batch",
    ] {
        assert!(stdout.contains(name), "missing {} in {}", name, stdout);
    }
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_cli_validate_good_and_bad_graphs() -> Result<()> {
    let env = TestEnvironment::new()?;

    let good = env.write_file("good.json", VALID_PLAN_JSON)?;
    let output = env.run(&["validate", good.to_str().unwrap()]).await?;
    assert_success(&output);
    let stdout = output_to_string(&output);
    assert!(stdout.contains("Execution order"));
    assert!(stdout.contains("1. read"));

    let cyclic = env.write_file(
        "cyclic.json",
        r#"{"tasks": [
            {"task_id": "a", "title": "A", "intent": "", "tool": "calendar_agent.read",
             "inputs": {}, "expected_outputs": [], "depends_on": ["b"]},
            {"task_id": "b", "title": "B", "intent": "", "tool": "calendar_agent.read",
             "inputs": {}, "expected_outputs": [], "depends_on": ["a"]}]}"#,
    )?;
    let output = env.run(&["validate", cyclic.to_str().unwrap()]).await?;
    assert!(!output.status.success());
    assert!(stderr_to_string(&output).contains("cycle detected"));
    Ok(())
}
