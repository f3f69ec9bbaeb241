//! 运行层集成测试：脚本化客户端 + 手动时钟

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use scout::client::{OperationResult, ScriptedClient};
    use scout::core::{Budget, ManualClock};
    use scout::planner::{Plan, Task, TaskKind};
    use scout::runner::{RunOptions, Runner, StopReason};

    fn runner(client: &Arc<ScriptedClient>, clock: &Arc<ManualClock>) -> Runner {
        Runner::with_clock(client.clone(), clock.clone())
    }

    fn ample() -> Budget {
        Budget::from_secs(3600, 60)
    }

    #[tokio::test]
    async fn test_explanatory_request_sends_detailed_prompt() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::new());
        let result = runner(&client, &clock)
            .run(
                "How does authentication work?",
                Some(Path::new("/tmp")),
                &RunOptions::query(ample()),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.plan.tasks.len(), 1);
        assert_eq!(result.stop_reason, Some(StopReason::Completed));

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, TaskKind::Query);
        assert_eq!(
            calls[0].parameters["query"],
            "Explain in detail: How does authentication work?"
        );
        assert_eq!(calls[0].working_directory.as_deref(), Some(Path::new("/tmp")));
        assert_eq!(calls[0].timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_failed_first_query_aborts_run() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::with_responses([OperationResult::failure(
            "model unavailable",
            Some(1),
        )]));
        let result = runner(&client, &clock)
            .run(
                "Explain the architecture and structure",
                None,
                &RunOptions::query(ample()),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.plan.tasks.len(), 2);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.stop_reason, Some(StopReason::CriticalFailure));
        assert_eq!(client.call_count(), 1);
        assert!(result.report.contains("Stopped early: a critical task failed"));
    }

    #[tokio::test]
    async fn test_budget_stops_before_task_that_cannot_fit() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::new().advancing(clock.clone(), Duration::from_secs(60)));
        // t=0 剩余 150，t=60 剩余 90，t=120 剩余 30 < 60
        let result = runner(&client, &clock)
            .run(
                "Fix the login bug",
                None,
                &RunOptions::editing(Budget::from_secs(150, 60), false),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.plan.tasks.len(), 3);
        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(result.stop_reason, Some(StopReason::BudgetExhausted));
        assert!(result.outcomes.iter().all(|o| o.duration_ms == 60_000));
    }

    #[tokio::test]
    async fn test_outcomes_never_exceed_plan_for_any_budget() {
        for total in [0u64, 30, 59, 60, 61, 119, 120, 500] {
            let clock = Arc::new(ManualClock::new());
            let client = Arc::new(ScriptedClient::new().advancing(clock.clone(), Duration::from_secs(30)));
            let result = runner(&client, &clock)
                .run(
                    "Show me the architecture and structure",
                    None,
                    &RunOptions::query(Budget::from_secs(total, 60)),
                )
                .await;
            assert!(result.outcomes.len() <= result.plan.tasks.len(), "total={}", total);
            if total < 60 {
                assert!(result.outcomes.is_empty(), "total={}", total);
            }
        }
    }

    #[tokio::test]
    async fn test_adaptive_cap_limits_outcomes() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::new());
        let plan = Plan::manual(
            "five steps",
            (1..=5).map(|i| Task::structure(format!("step {}", i))).collect(),
            "manual",
        );
        let result = runner(&client, &clock)
            .execute_plan(plan, None, &RunOptions::query(ample()).adaptive(3))
            .await;

        assert_eq!(result.outcomes.len(), 3);
        assert_eq!(result.stop_reason, Some(StopReason::IterationCap));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_adaptive_search_appends_follow_up_query() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::with_responses([OperationResult::ok(
            "src/handlers/login.rs:42 pub async fn login_handler",
        )]));
        let result = runner(&client, &clock)
            .run(
                "Find the login handler",
                None,
                &RunOptions::query(ample()).adaptive(5),
            )
            .await;

        assert_eq!(result.plan.tasks.len(), 2);
        assert_eq!(result.plan.tasks[0].kind, TaskKind::Search);
        assert_eq!(result.plan.tasks[1].kind, TaskKind::Query);
        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(result.stop_reason, Some(StopReason::Completed));
        let follow_up = &client.calls()[1];
        assert!(follow_up.parameters["query"]
            .as_str()
            .unwrap()
            .contains("src/handlers/login.rs:42"));
    }

    #[tokio::test]
    async fn test_appended_task_unreached_when_iteration_cap_hits_first() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::with_responses([OperationResult::ok("login.rs:1")]));
        let result = runner(&client, &clock)
            .run(
                "Find the login handler",
                None,
                &RunOptions::query(ample()).adaptive(1),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.plan.tasks.len(), 2);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.stop_reason, Some(StopReason::IterationCap));
    }

    #[tokio::test]
    async fn test_adaptive_also_respects_budget() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::new().advancing(clock.clone(), Duration::from_secs(50)));
        let plan = Plan::manual(
            "many",
            (1..=5).map(|i| Task::structure(format!("step {}", i))).collect(),
            "manual",
        );
        let result = runner(&client, &clock)
            .execute_plan(plan, None, &RunOptions::query(Budget::from_secs(100, 50)).adaptive(10))
            .await;

        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(result.stop_reason, Some(StopReason::BudgetExhausted));
    }

    #[tokio::test]
    async fn test_empty_request_fails_without_calling_tool() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::new());
        let result = runner(&client, &clock)
            .run("   ", None, &RunOptions::query(ample()))
            .await;

        assert!(!result.success);
        assert!(result.outcomes.is_empty());
        assert!(result.plan.tasks.is_empty());
        assert!(result.error.is_some());
        assert!(result.stop_reason.is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_tool_not_found_is_recorded_not_raised() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(
            ScriptedClient::new().with_fallback(OperationResult::failure("auggie CLI not found", Some(127))),
        );
        let result = runner(&client, &clock)
            .run("Find the login handler", None, &RunOptions::query(ample()))
            .await;

        assert!(result.success);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.outcomes[0].result.exit_code, Some(127));
        assert!(result.report.contains("❌ **Failed**"));
    }

    #[tokio::test]
    async fn test_missing_parameter_fails_task_but_run_continues() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::new());
        let plan = Plan::manual(
            "manual",
            vec![Task::new(TaskKind::Usages, "no identifier"), Task::structure("structure")],
            "manual",
        );
        let result = runner(&client, &clock)
            .execute_plan(plan, None, &RunOptions::query(ample()))
            .await;

        assert_eq!(result.outcomes.len(), 2);
        assert!(!result.outcomes[0].result.success);
        assert!(result.outcomes[1].result.success);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_editing_run_collects_changed_files_and_dry_run_flag() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::with_responses([
            OperationResult::ok("Found the bug in src/auth.rs"),
            OperationResult::ok("Modified: src/auth.rs")
                .with_files_changed(vec!["src/auth.rs".to_string()]),
            OperationResult::ok("All good"),
        ]));
        let result = runner(&client, &clock)
            .run(
                "Fix the login bug",
                None,
                &RunOptions::editing(ample(), true),
            )
            .await;

        assert_eq!(result.outcomes.len(), 3);
        assert!(client.calls().iter().all(|c| c.dry_run));
        assert!(result.report.contains("### All Changed Files:\n- src/auth.rs\n"));
        assert!(result.report.contains("- [ ] Check for breaking changes"));
        assert!(result.report.contains("This was a dry run"));
    }

    #[tokio::test]
    async fn test_report_is_identical_across_runs() {
        let mut reports = Vec::new();
        for _ in 0..2 {
            let clock = Arc::new(ManualClock::new());
            let client = Arc::new(ScriptedClient::with_responses([
                OperationResult::ok("structure"),
                OperationResult::ok("architecture"),
            ]));
            let result = runner(&client, &clock)
                .run("Show me the project structure", None, &RunOptions::query(ample()))
                .await;
            reports.push(result.report);
        }
        assert_eq!(reports[0], reports[1]);
    }

    #[tokio::test]
    async fn test_run_result_serializes() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(ScriptedClient::new());
        let result = runner(&client, &clock)
            .run("What is this project?", None, &RunOptions::query(ample()))
            .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["stop_reason"], "completed");
        assert_eq!(value["outcomes"][0]["task"]["kind"], "query");
        assert!(value["run_id"].as_str().unwrap().len() >= 32);
        assert!(value.get("error").is_none());
    }
}
