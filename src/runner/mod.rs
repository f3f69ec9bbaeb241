//! 运行层：规划 → 预算内顺序执行 → 汇总报告
//!
//! - **executor**: 受全局墙钟与单任务超时约束的顺序执行器，关键任务失败即停
//! - **adaptive**: 额外受迭代次数约束，可根据中间结果在计划尾部追加跟进任务
//! - **report**: 把 (task, result) 序列渲染成结构化 Markdown 报告
//!
//! 任务严格串行：外部工具把工作目录当作共享可变状态，重叠的编辑无法保证顺序。

pub mod adaptive;
pub mod executor;
pub mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::{OperationClient, OperationExecutor, OperationResult};
use crate::core::{Budget, Clock, PilotError, SystemClock};
use crate::planner::{generate_editing_plan, generate_plan, Plan, Task};

pub use adaptive::AdaptiveExecutor;
pub use executor::BudgetedExecutor;
pub use report::{collect_changed_files, render, synthesize, ReportNotes};

/// 选择哪个规划器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Query,
    Editing,
}

/// 一次运行的选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: RunMode,
    pub budget: Budget,
    /// Some(n) 时使用自适应执行器
    pub max_iterations: Option<usize>,
    pub dry_run: bool,
}

impl RunOptions {
    pub fn query(budget: Budget) -> Self {
        Self {
            mode: RunMode::Query,
            budget,
            max_iterations: None,
            dry_run: false,
        }
    }

    pub fn editing(budget: Budget, dry_run: bool) -> Self {
        Self {
            mode: RunMode::Editing,
            budget,
            max_iterations: None,
            dry_run,
        }
    }

    pub fn adaptive(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

/// 单个已执行任务的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub task: Task,
    pub result: OperationResult,
    pub duration_ms: u64,
}

/// 执行结束的原因；outcomes 少于 tasks 本身不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    BudgetExhausted,
    CriticalFailure,
    IterationCap,
}

impl StopReason {
    pub fn describe(self) -> &'static str {
        match self {
            StopReason::Completed => "all tasks completed",
            StopReason::BudgetExhausted => "time budget exhausted before the next task",
            StopReason::CriticalFailure => "a critical task failed",
            StopReason::IterationCap => "iteration limit reached",
        }
    }
}

/// 执行器输出
#[derive(Debug, Clone)]
pub struct ExecutionTrace {
    pub outcomes: Vec<StepOutcome>,
    pub stop_reason: StopReason,
}

/// 一次运行的最终结果，返回后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    /// Unix 毫秒
    pub started_at: i64,
    pub success: bool,
    pub plan: Plan,
    pub outcomes: Vec<StepOutcome>,
    pub report: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
}

impl RunResult {
    fn failed(run_id: String, started_at: i64, request: &str, err: &PilotError) -> Self {
        Self {
            run_id,
            started_at,
            success: false,
            plan: Plan::empty(request),
            outcomes: Vec::new(),
            report: String::new(),
            error: Some(err.to_string()),
            stop_reason: None,
        }
    }
}

/// 运行入口：持有外部客户端与时钟
pub struct Runner {
    client: Arc<dyn OperationClient>,
    clock: Arc<dyn Clock>,
}

impl Runner {
    pub fn new(client: Arc<dyn OperationClient>) -> Self {
        Self::with_clock(client, Arc::new(SystemClock))
    }

    pub fn with_clock(client: Arc<dyn OperationClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    /// 规划并执行；只有规划失败会得到 success=false
    pub async fn run(
        &self,
        request: &str,
        working_directory: Option<&Path>,
        options: &RunOptions,
    ) -> RunResult {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().timestamp_millis();

        let planned = match options.mode {
            RunMode::Query => generate_plan(request),
            RunMode::Editing => generate_editing_plan(request),
        };
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "plan generation failed");
                return RunResult::failed(run_id, started_at, request, &e);
            }
        };

        tracing::info!(
            run_id = %run_id,
            mode = ?options.mode,
            tasks = plan.tasks.len(),
            reasoning = %plan.reasoning,
            "plan generated"
        );

        self.execute_with_id(run_id, started_at, plan, working_directory, options)
            .await
    }

    /// 执行手工构造的计划（如单条 slash command）
    pub async fn execute_plan(
        &self,
        plan: Plan,
        working_directory: Option<&Path>,
        options: &RunOptions,
    ) -> RunResult {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().timestamp_millis();
        self.execute_with_id(run_id, started_at, plan, working_directory, options)
            .await
    }

    async fn execute_with_id(
        &self,
        run_id: String,
        started_at: i64,
        mut plan: Plan,
        working_directory: Option<&Path>,
        options: &RunOptions,
    ) -> RunResult {
        let ops = OperationExecutor::new(
            self.client.clone(),
            self.clock.clone(),
            working_directory.map(PathBuf::from),
            options.budget.per_task_timeout,
            options.dry_run,
        );

        let trace = match options.max_iterations {
            Some(max_iterations) => {
                AdaptiveExecutor::new(ops, self.clock.clone(), max_iterations)
                    .execute(&mut plan, options.budget)
                    .await
            }
            None => {
                BudgetedExecutor::new(ops, self.clock.clone())
                    .execute(&plan, options.budget)
                    .await
            }
        };

        tracing::info!(
            run_id = %run_id,
            executed = trace.outcomes.len(),
            planned = plan.tasks.len(),
            stop_reason = ?trace.stop_reason,
            "run finished"
        );

        let notes = ReportNotes {
            dry_run: options.dry_run,
            stop_reason: Some(trace.stop_reason),
        };
        let report = render(&plan, &trace.outcomes, &notes);

        RunResult {
            run_id,
            started_at,
            success: true,
            plan,
            outcomes: trace.outcomes,
            report,
            error: None,
            stop_reason: Some(trace.stop_reason),
        }
    }
}
