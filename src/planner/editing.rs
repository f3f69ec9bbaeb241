//! 编辑规划器
//!
//! 分类规则同样是有序表，首个命中者胜出；每种任务类型对应一个手写步骤模板：
//! 写入步骤之前总有只读的理解步骤，之后（多数类型）跟一个只读的验证步骤。

use serde::{Deserialize, Serialize};

use crate::core::PilotError;
use crate::planner::types::{EditingTaskType, Intent, Plan, Task, TaskKind};
use crate::planner::{ensure_request, Trigger};

/// 编辑分类规则（按优先级）
const EDITING_RULES: &[(EditingTaskType, Trigger)] = &[
    (
        EditingTaskType::CreateFile,
        Trigger::Any(&["create", "generate", "new file"]),
    ),
    (
        EditingTaskType::FixBug,
        Trigger::Both(&["fix"], &["bug", "error", "issue"]),
    ),
    (
        EditingTaskType::Refactor,
        Trigger::Any(&["refactor", "restructure", "reorganize"]),
    ),
    (
        EditingTaskType::AddFeature,
        Trigger::Both(&["add"], &["feature", "functionality"]),
    ),
    (
        EditingTaskType::Optimize,
        Trigger::Any(&["optimize", "performance", "speed up"]),
    ),
    (
        EditingTaskType::AddTests,
        Trigger::Both(&["test"], &["add", "write", "create"]),
    ),
    (EditingTaskType::AddDocs, Trigger::Any(&["doc", "comment"])),
    (
        EditingTaskType::FixTypes,
        Trigger::Both(&["type"], &["fix", "error"]),
    ),
    (
        EditingTaskType::FixLint,
        Trigger::Any(&["lint", "eslint", "prettier"]),
    ),
];

/// 模板中的一步
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditingStep {
    pub action: String,
    pub prompt: String,
    pub requires_editing: bool,
}

impl EditingStep {
    fn read(action: &str, prompt: String) -> Self {
        Self {
            action: action.to_string(),
            prompt,
            requires_editing: false,
        }
    }

    fn write(action: &str, prompt: String) -> Self {
        Self {
            action: action.to_string(),
            prompt,
            requires_editing: true,
        }
    }

    fn into_task(self) -> Task {
        let kind = if self.requires_editing {
            TaskKind::Edit
        } else {
            TaskKind::Inspect
        };
        Task::new(kind, self.action).with_param("prompt", self.prompt)
    }
}

/// 某一任务类型的完整模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingTemplate {
    pub reasoning: &'static str,
    pub steps: Vec<EditingStep>,
    pub safety_checks: Vec<&'static str>,
}

pub fn classify_editing(request: &str) -> EditingTaskType {
    let lower = request.to_lowercase();
    EDITING_RULES
        .iter()
        .find(|(_, trigger)| trigger.matches(&lower))
        .map(|(task_type, _)| *task_type)
        .unwrap_or(EditingTaskType::CustomEdit)
}

/// 按任务类型展开步骤模板，prompt 中嵌入原始请求
pub fn editing_template(task_type: EditingTaskType, request: &str) -> EditingTemplate {
    use EditingStep as S;

    match task_type {
        EditingTaskType::CreateFile => EditingTemplate {
            reasoning: "Creating new file - will analyze codebase patterns, generate code following conventions",
            steps: vec![
                S::read(
                    "Analyze codebase patterns",
                    "Analyze the codebase structure, coding patterns, and conventions to understand how new files should be created".to_string(),
                ),
                S::write(
                    "Generate file content",
                    format!("{}. Follow the codebase conventions and patterns. Include proper imports, types, and documentation.", request),
                ),
                S::read(
                    "Verify new file",
                    "Verify the new file compiles, its imports resolve, and it follows the surrounding conventions.".to_string(),
                ),
            ],
            safety_checks: vec![
                "Verify file doesn't already exist",
                "Check imports are valid",
                "Ensure proper structure",
            ],
        },
        EditingTaskType::FixBug => EditingTemplate {
            reasoning: "Bug fix - will locate bug, understand context, generate fix, verify",
            steps: vec![
                S::read(
                    "Locate and understand bug",
                    format!("Find and analyze the bug: {}. Explain what's causing it and where it's located.", request),
                ),
                S::write(
                    "Generate fix",
                    format!("Fix the bug: {}. Ensure the fix is minimal, doesn't break existing functionality, and includes error handling.", request),
                ),
                S::read(
                    "Verify fix",
                    "Verify the bug fix is correct and doesn't introduce new issues. Check related code paths.".to_string(),
                ),
            ],
            safety_checks: vec![
                "Check for breaking changes",
                "Verify error handling",
                "Ensure tests still pass",
            ],
        },
        EditingTaskType::Refactor => EditingTemplate {
            reasoning: "Refactoring - will analyze current code, plan refactoring, execute, verify",
            steps: vec![
                S::read(
                    "Analyze current implementation",
                    format!("Analyze the code to be refactored: {}. Understand its current structure, dependencies, and usage.", request),
                ),
                S::read(
                    "Plan refactoring",
                    format!("Plan the refactoring for: {}. Consider impact on other code, maintain backward compatibility where needed.", request),
                ),
                S::write(
                    "Execute refactoring",
                    format!("Refactor the code: {}. Follow the plan, maintain functionality, improve code quality.", request),
                ),
                S::read(
                    "Verify refactoring",
                    "Verify the refactoring maintains all functionality and doesn't break dependencies.".to_string(),
                ),
            ],
            safety_checks: vec![
                "Maintain API compatibility",
                "Check all usages updated",
                "Verify tests pass",
            ],
        },
        EditingTaskType::AddFeature => EditingTemplate {
            reasoning: "Feature addition - will understand requirements, plan implementation, generate code and tests",
            steps: vec![
                S::read(
                    "Understand requirements",
                    format!("Analyze the feature request: {}. Understand what needs to be built and how it fits into the codebase.", request),
                ),
                S::read(
                    "Plan implementation",
                    format!("Plan how to implement: {}. Consider architecture, files to create/modify, integration points.", request),
                ),
                S::write(
                    "Implement feature",
                    format!("Implement the feature: {}. Follow codebase patterns, add proper error handling, include documentation.", request),
                ),
                S::write(
                    "Add tests",
                    "Generate tests for the new feature to ensure it works correctly.".to_string(),
                ),
            ],
            safety_checks: vec![
                "Follow existing patterns",
                "Include error handling",
                "Add tests",
                "Update docs",
            ],
        },
        EditingTaskType::Optimize => EditingTemplate {
            reasoning: "Optimization - will analyze performance, identify bottlenecks, optimize",
            steps: vec![
                S::read(
                    "Analyze performance",
                    format!("Analyze performance of: {}. Identify bottlenecks, inefficiencies, and optimization opportunities.", request),
                ),
                S::write(
                    "Optimize code",
                    format!("Optimize: {}. Improve performance while maintaining correctness and readability.", request),
                ),
                S::read(
                    "Verify optimization",
                    "Verify the optimization improves performance without breaking functionality.".to_string(),
                ),
            ],
            safety_checks: vec![
                "Maintain correctness",
                "Verify performance gain",
                "Check memory usage",
            ],
        },
        EditingTaskType::AddTests => EditingTemplate {
            reasoning: "Adding tests - will analyze code, generate comprehensive test cases",
            steps: vec![
                S::read(
                    "Analyze code to test",
                    format!("Analyze the code for testing: {}. Understand its behavior, edge cases, and dependencies.", request),
                ),
                S::write(
                    "Generate tests",
                    format!("Generate comprehensive tests: {}. Cover happy paths, edge cases, error cases. Use existing test patterns.", request),
                ),
            ],
            safety_checks: vec![
                "Cover edge cases",
                "Test error handling",
                "Follow test conventions",
            ],
        },
        EditingTaskType::AddDocs => EditingTemplate {
            reasoning: "Adding documentation - will analyze code and generate comprehensive docs",
            steps: vec![
                S::read(
                    "Analyze code",
                    format!("Analyze the code: {}. Understand its purpose, parameters, return values, and usage.", request),
                ),
                S::write(
                    "Generate documentation",
                    format!("Add documentation: {}. Include doc comments, parameter descriptions, examples, and usage notes.", request),
                ),
            ],
            safety_checks: vec![
                "Document all parameters",
                "Include examples",
                "Explain edge cases",
            ],
        },
        EditingTaskType::FixTypes => EditingTemplate {
            reasoning: "Type fixes - will collect type errors, fix them, re-check",
            steps: vec![
                S::read(
                    "Collect type errors",
                    format!("Find the type errors related to: {}. List each error with its location and cause.", request),
                ),
                S::write(
                    "Fix type errors",
                    format!("Fix the type errors: {}. Prefer precise types over casts, keep runtime behavior unchanged.", request),
                ),
                S::read(
                    "Verify types",
                    "Verify the type checker reports no remaining errors in the touched code.".to_string(),
                ),
            ],
            safety_checks: vec![
                "Avoid unchecked casts",
                "Keep runtime behavior unchanged",
                "Run the type checker",
            ],
        },
        EditingTaskType::FixLint => EditingTemplate {
            reasoning: "Lint fixes - will collect lint findings, fix them, re-run the linter",
            steps: vec![
                S::read(
                    "Collect lint findings",
                    format!("Identify the lint and formatting issues for: {}. Group them by rule.", request),
                ),
                S::write(
                    "Fix lint issues",
                    format!("Fix the lint issues: {}. Follow the project's lint and formatter configuration.", request),
                ),
                S::read(
                    "Verify lint",
                    "Verify the linter and formatter report no remaining issues in the touched files.".to_string(),
                ),
            ],
            safety_checks: vec![
                "Do not disable lint rules",
                "Keep formatting consistent",
                "Verify behavior is unchanged",
            ],
        },
        EditingTaskType::CustomEdit => EditingTemplate {
            reasoning: "Custom editing task - will analyze request and execute appropriately",
            steps: vec![
                S::read(
                    "Understand request",
                    format!("Analyze the request: {}. Understand what needs to be done.", request),
                ),
                S::write("Execute task", request.to_string()),
            ],
            safety_checks: vec![
                "Verify changes are safe",
                "Check for unintended side effects",
            ],
        },
    }
}

/// 为编辑请求生成计划：Inspect（只读）/ Edit（写入）任务 + 安全检查清单
pub fn generate_editing_plan(request: &str) -> Result<Plan, PilotError> {
    ensure_request(request)?;
    let task_type = classify_editing(request);
    let template = editing_template(task_type, request);

    Ok(Plan {
        original_request: request.to_string(),
        tasks: template.steps.into_iter().map(EditingStep::into_task).collect(),
        reasoning: template.reasoning.to_string(),
        intent: Intent::Editing(task_type),
        safety_checks: template.safety_checks.into_iter().map(String::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [EditingTaskType; 10] = [
        EditingTaskType::CreateFile,
        EditingTaskType::FixBug,
        EditingTaskType::Refactor,
        EditingTaskType::AddFeature,
        EditingTaskType::Optimize,
        EditingTaskType::AddTests,
        EditingTaskType::AddDocs,
        EditingTaskType::FixTypes,
        EditingTaskType::FixLint,
        EditingTaskType::CustomEdit,
    ];

    #[test]
    fn test_fix_bug_scenario() {
        let plan = generate_editing_plan("Fix the login bug").unwrap();
        assert_eq!(plan.intent, Intent::Editing(EditingTaskType::FixBug));
        assert_eq!(plan.tasks.len(), 3);
        let kinds: Vec<_> = plan.tasks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TaskKind::Inspect, TaskKind::Edit, TaskKind::Inspect]);
        assert_eq!(plan.tasks[0].description, "Locate and understand bug");
        assert!(plan
            .safety_checks
            .iter()
            .any(|c| c == "Check for breaking changes"));
    }

    #[test]
    fn test_classification_per_category() {
        let cases = [
            ("Create a settings page", EditingTaskType::CreateFile),
            ("add a new file for routes", EditingTaskType::CreateFile),
            ("fix the parser error", EditingTaskType::FixBug),
            ("Restructure the storage module", EditingTaskType::Refactor),
            ("add export functionality", EditingTaskType::AddFeature),
            ("speed up the importer", EditingTaskType::Optimize),
            ("write tests for the cache", EditingTaskType::AddTests),
            ("document the public API", EditingTaskType::AddDocs),
            ("type mismatch in handler, fix it", EditingTaskType::FixTypes),
            ("run prettier on the ui folder", EditingTaskType::FixLint),
            ("rename foo to bar", EditingTaskType::CustomEdit),
        ];
        for (request, expected) in cases {
            assert_eq!(classify_editing(request), expected, "{request}");
        }
    }

    #[test]
    fn test_create_wins_over_tests() {
        assert_eq!(
            classify_editing("create tests for the parser"),
            EditingTaskType::CreateFile
        );
    }

    #[test]
    fn test_every_template_starts_read_only() {
        for task_type in ALL_TYPES {
            let template = editing_template(task_type, "x");
            assert!(!template.steps[0].requires_editing, "{task_type}");
            assert!(template.steps.iter().any(|s| s.requires_editing), "{task_type}");
            assert!(!template.safety_checks.is_empty(), "{task_type}");
        }
    }

    #[test]
    fn test_custom_edit_passes_request_through() {
        let plan = generate_editing_plan("rename foo to bar").unwrap();
        assert_eq!(plan.tasks[1].kind, TaskKind::Edit);
        assert_eq!(plan.tasks[1].param_str("prompt"), Some("rename foo to bar"));
    }

    #[test]
    fn test_editing_plan_is_deterministic() {
        let a = generate_editing_plan("Refactor the session store").unwrap();
        let b = generate_editing_plan("Refactor the session store").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tasks.len(), 4);
    }
}
