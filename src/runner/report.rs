//! 结果汇总：把执行结果渲染成 Markdown 报告
//!
//! 纯函数，无时间戳和随机内容：相同 (plan, outcomes) 得到逐字节相同的文本。

use crate::planner::{Intent, Plan};
use crate::runner::{StepOutcome, StopReason};

/// 报告附加信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportNotes {
    pub dry_run: bool,
    /// 非 Completed 时输出 "Stopped early" 提示
    pub stop_reason: Option<StopReason>,
}

/// 仅依据计划与结果生成报告
pub fn synthesize(plan: &Plan, outcomes: &[StepOutcome]) -> String {
    render(plan, outcomes, &ReportNotes::default())
}

pub fn render(plan: &Plan, outcomes: &[StepOutcome], notes: &ReportNotes) -> String {
    let editing = plan.is_editing();
    let mut output = String::new();

    if editing {
        output.push_str("# Autonomous Editing Agent Results\n\n");
        output.push_str(&format!("**Original Request:** {}\n\n", plan.original_request));
        if let Intent::Editing(task_type) = plan.intent {
            output.push_str(&format!("**Task Type:** {}\n\n", task_type));
        }
        output.push_str(&format!("**Reasoning:** {}\n\n", plan.reasoning));
        let mode = if notes.dry_run {
            "DRY RUN (Preview Only)"
        } else {
            "EDITING MODE"
        };
        output.push_str(&format!("**Mode:** {}\n\n", mode));
    } else {
        output.push_str("# Autonomous Agent Analysis Results\n\n");
        output.push_str(&format!("**Initial Query:** {}\n\n", plan.original_request));
        output.push_str(&format!("**Reasoning:** {}\n\n", plan.reasoning));
        output.push_str(&format!("**Tasks Executed:** {}\n\n", outcomes.len()));
    }
    output.push_str("---\n\n");

    let label = if editing { "Step" } else { "Task" };
    for (i, outcome) in outcomes.iter().enumerate() {
        output.push_str(&format!("## {} {}: {}\n\n", label, i + 1, outcome.task.description));
        let result = &outcome.result;
        if result.success {
            output.push_str("✅ **Success**\n\n");
            if let Some(files) = result.files_changed.as_ref().filter(|f| !f.is_empty()) {
                output.push_str("**Files Changed:**\n");
                for file in files {
                    output.push_str(&format!("- {}\n", file));
                }
                output.push('\n');
            }
            output.push_str(&format!("{}\n\n", result.output));
        } else {
            output.push_str("❌ **Failed**\n\n");
            output.push_str(&format!(
                "Error: {}\n\n",
                result.error.as_deref().unwrap_or("unknown error")
            ));
            if !result.output.is_empty() {
                output.push_str(&format!("Partial output: {}\n\n", result.output));
            }
        }
        output.push_str("---\n\n");
    }

    let succeeded = outcomes.iter().filter(|o| o.result.success).count();
    let failed = outcomes.len() - succeeded;
    let unit = if editing { "steps" } else { "tasks" };

    output.push_str("## Summary\n\n");
    output.push_str(&format!("- Total {}: {}\n", unit, outcomes.len()));
    output.push_str(&format!("- Successful: {}\n", succeeded));
    output.push_str(&format!("- Failed: {}\n", failed));

    if let Some(reason) = notes.stop_reason.filter(|r| *r != StopReason::Completed) {
        output.push_str(&format!(
            "- Stopped early: {} ({} of {} planned {} executed)\n",
            reason.describe(),
            outcomes.len(),
            plan.tasks.len(),
            unit
        ));
    }
    let changed = if editing {
        collect_changed_files(outcomes)
    } else {
        Vec::new()
    };
    if !changed.is_empty() {
        output.push_str(&format!("- Files modified: {}\n", changed.len()));
    }
    output.push('\n');

    if editing {
        if !changed.is_empty() {
            output.push_str("### All Changed Files:\n");
            for file in &changed {
                output.push_str(&format!("- {}\n", file));
            }
            output.push('\n');
        }
        if !plan.safety_checks.is_empty() {
            output.push_str("### Safety Checks to Perform:\n");
            for check in &plan.safety_checks {
                output.push_str(&format!("- [ ] {}\n", check));
            }
            output.push('\n');
        }
    } else if succeeded > 0 {
        output.push_str("### Key Findings\n\n");
        output.push_str(&format!(
            "The request was broken down into {} sub-tasks and {} of them returned results. \
             Review the detailed results above for the gathered information about the codebase.\n\n",
            outcomes.len(),
            succeeded
        ));
    }

    if notes.dry_run {
        output.push_str("**Note:** This was a dry run. No actual changes were made. Run in editing mode to apply changes.\n");
    }

    output
}

/// 所有结果中的变更文件，按首次出现顺序去重
pub fn collect_changed_files(outcomes: &[StepOutcome]) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for file in outcomes
        .iter()
        .filter_map(|o| o.result.files_changed.as_ref())
        .flatten()
    {
        if !files.contains(file) {
            files.push(file.clone());
        }
    }
    files
}
