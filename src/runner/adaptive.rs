//! 自适应执行器
//!
//! 在预算执行器的基础上增加迭代上限，并按下标遍历计划：
//! 成功且输出非空的 search 任务若恰好位于计划末尾，则在尾部追加一个深入分析的 query 任务，
//! 每次运行最多追加一次。每个任务边界先检查迭代上限，再检查时间预算。

use std::sync::Arc;

use crate::client::OperationExecutor;
use crate::core::{Budget, Clock, Deadline};
use crate::planner::{Plan, Task, TaskKind};
use crate::runner::{ExecutionTrace, StepOutcome, StopReason};

/// 跟进 query 中引用的搜索结果最大字符数
const FINDINGS_SNIPPET_CHARS: usize = 1500;

pub struct AdaptiveExecutor {
    ops: OperationExecutor,
    clock: Arc<dyn Clock>,
    max_iterations: usize,
}

impl AdaptiveExecutor {
    pub fn new(ops: OperationExecutor, clock: Arc<dyn Clock>, max_iterations: usize) -> Self {
        Self {
            ops,
            clock,
            max_iterations,
        }
    }

    /// 执行计划；plan 只会在尾部追加
    pub async fn execute(&self, plan: &mut Plan, budget: Budget) -> ExecutionTrace {
        let deadline = Deadline::start(self.clock.as_ref(), budget);
        let mut outcomes: Vec<StepOutcome> = Vec::new();
        let mut appended = false;
        let mut index = 0;

        while index < plan.tasks.len() {
            if outcomes.len() >= self.max_iterations {
                tracing::info!(
                    max_iterations = self.max_iterations,
                    unexecuted = plan.tasks.len() - index,
                    "iteration limit reached"
                );
                return ExecutionTrace {
                    outcomes,
                    stop_reason: StopReason::IterationCap,
                };
            }
            if !deadline.admits_next() {
                tracing::warn!(
                    remaining_ms = deadline.remaining().as_millis() as u64,
                    unexecuted = plan.tasks.len() - index,
                    "budget exhausted, stopping before next task"
                );
                return ExecutionTrace {
                    outcomes,
                    stop_reason: StopReason::BudgetExhausted,
                };
            }

            let task = plan.tasks[index].clone();
            tracing::info!(
                iteration = outcomes.len() + 1,
                kind = %task.kind,
                "executing task: {}",
                task.description
            );
            let timed = self.ops.execute(&task).await;

            let is_tail = index + 1 == plan.tasks.len();
            if !appended
                && is_tail
                && task.kind == TaskKind::Search
                && timed.result.success
                && !timed.result.output.trim().is_empty()
            {
                let follow_up = follow_up_for(&task, &timed.result.output);
                tracing::info!(description = %follow_up.description, "appending follow-up task");
                plan.push_follow_up(follow_up);
                appended = true;
            }

            let failed_critical = !timed.result.success && task.kind.is_critical();
            outcomes.push(StepOutcome {
                task,
                result: timed.result,
                duration_ms: timed.duration.as_millis() as u64,
            });
            if failed_critical {
                tracing::warn!("critical task failed, stopping execution");
                return ExecutionTrace {
                    outcomes,
                    stop_reason: StopReason::CriticalFailure,
                };
            }

            index += 1;
        }

        ExecutionTrace {
            outcomes,
            stop_reason: StopReason::Completed,
        }
    }
}

/// 根据 search 结果构造深入分析的 query
fn follow_up_for(search: &Task, findings: &str) -> Task {
    let pattern = search.param_str("search_pattern").unwrap_or_default();
    let findings = findings.trim();
    let snippet: String = findings.chars().take(FINDINGS_SNIPPET_CHARS).collect();
    let ellipsis = if findings.chars().count() > FINDINGS_SNIPPET_CHARS {
        "\n..."
    } else {
        ""
    };
    Task::query(
        "Analyze search findings in depth",
        format!(
            "Based on the search results for \"{}\", provide a detailed analysis and explanation.\n\nSearch results:\n{}{}",
            pattern, snippet, ellipsis
        ),
    )
}
