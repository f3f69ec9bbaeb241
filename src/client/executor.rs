//! 操作执行器
//!
//! 持有 OperationClient 与时钟，execute(task) 构造请求、调用客户端并计时；
//! 参数缺失时不调用客户端直接返回失败结果；每次调用输出结构化审计日志（JSON）。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{OperationClient, OperationRequest, OperationResult};
use crate::core::error::{EXIT_TIMEOUT, EXIT_TOOL_NOT_FOUND};
use crate::core::Clock;
use crate::planner::Task;

/// 带耗时的调用结果
#[derive(Debug, Clone)]
pub struct TimedResult {
    pub result: OperationResult,
    pub duration: Duration,
}

/// 操作执行器：对每次调用计时并记录审计日志
pub struct OperationExecutor {
    client: Arc<dyn OperationClient>,
    clock: Arc<dyn Clock>,
    working_directory: Option<PathBuf>,
    timeout: Duration,
    dry_run: bool,
}

impl OperationExecutor {
    pub fn new(
        client: Arc<dyn OperationClient>,
        clock: Arc<dyn Clock>,
        working_directory: Option<PathBuf>,
        timeout: Duration,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            clock,
            working_directory,
            timeout,
            dry_run,
        }
    }

    pub async fn execute(&self, task: &Task) -> TimedResult {
        let start = self.clock.now();
        let request = OperationRequest::for_task(
            task,
            self.working_directory.as_deref(),
            self.timeout,
            self.dry_run,
        );

        let (result, preview) = match request.invocation() {
            Ok(invocation) => (
                self.client.run_operation(&request).await,
                invocation.preview(),
            ),
            Err(e) => (OperationResult::from_error(&e), String::new()),
        };

        let duration = self.clock.now().saturating_duration_since(start);
        let audit = serde_json::json!({
            "event": "operation_audit",
            "client": self.client.name(),
            "kind": task.kind.as_str(),
            "ok": result.success,
            "outcome": audit_outcome(&result),
            "exit_code": result.exit_code,
            "duration_ms": duration.as_millis() as u64,
            "instruction_preview": instruction_preview(&preview),
        });
        tracing::info!(audit = %audit.to_string(), "operation");

        TimedResult { result, duration }
    }
}

fn audit_outcome(result: &OperationResult) -> &'static str {
    match (result.success, result.exit_code) {
        (true, _) => "ok",
        (false, Some(EXIT_TOOL_NOT_FOUND)) => "not_found",
        (false, Some(EXIT_TIMEOUT)) => "timeout",
        (false, _) => "error",
    }
}

fn instruction_preview(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}
