//! 预算执行器
//!
//! 每个任务开始前做准入检查：remaining = max_total_time - elapsed，
//! remaining < per_task_timeout 时停止（不启动该任务）。关键任务（query / edit）失败立即停止。

use std::sync::Arc;

use crate::client::OperationExecutor;
use crate::core::{Budget, Clock, Deadline};
use crate::planner::Plan;
use crate::runner::{ExecutionTrace, StepOutcome, StopReason};

pub struct BudgetedExecutor {
    ops: OperationExecutor,
    clock: Arc<dyn Clock>,
}

impl BudgetedExecutor {
    pub fn new(ops: OperationExecutor, clock: Arc<dyn Clock>) -> Self {
        Self { ops, clock }
    }

    pub async fn execute(&self, plan: &Plan, budget: Budget) -> ExecutionTrace {
        let deadline = Deadline::start(self.clock.as_ref(), budget);
        let mut outcomes = Vec::with_capacity(plan.tasks.len());

        for (index, task) in plan.tasks.iter().enumerate() {
            if !deadline.admits_next() {
                tracing::warn!(
                    remaining_ms = deadline.remaining().as_millis() as u64,
                    skipped = plan.tasks.len() - index,
                    "budget exhausted, stopping before next task"
                );
                return ExecutionTrace {
                    outcomes,
                    stop_reason: StopReason::BudgetExhausted,
                };
            }

            tracing::info!(
                step = index + 1,
                total = plan.tasks.len(),
                kind = %task.kind,
                "executing task: {}",
                task.description
            );
            let timed = self.ops.execute(task).await;
            let failed_critical = !timed.result.success && task.kind.is_critical();
            outcomes.push(StepOutcome {
                task: task.clone(),
                result: timed.result,
                duration_ms: timed.duration.as_millis() as u64,
            });

            if failed_critical {
                tracing::warn!(kind = %task.kind, "critical task failed, stopping execution");
                return ExecutionTrace {
                    outcomes,
                    stop_reason: StopReason::CriticalFailure,
                };
            }
        }

        ExecutionTrace {
            outcomes,
            stop_reason: StopReason::Completed,
        }
    }
}
