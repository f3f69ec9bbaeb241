//! 问答规划器
//!
//! 规则按优先级排列：解释 > 定位 > 分析 > 结构 > 用法 > 默认。
//! 请求转小写后依次匹配，第一个命中的规则生成任务，后续规则不再评估。

use std::sync::OnceLock;

use regex::Regex;

use crate::core::PilotError;
use crate::planner::types::{Intent, Plan, QueryIntent, Task};
use crate::planner::{contains_any, ensure_request, Trigger};

/// 规则生成的草稿：推理说明 + 任务列表
struct Draft {
    reasoning: &'static str,
    tasks: Vec<Task>,
}

/// (意图, 触发条件, 任务构造函数)
struct QueryRule {
    intent: QueryIntent,
    trigger: Trigger,
    build: fn(request: &str, lower: &str) -> Draft,
}

const QUERY_RULES: &[QueryRule] = &[
    QueryRule {
        intent: QueryIntent::Explanatory,
        trigger: Trigger::Any(&["how", "explain", "work"]),
        build: explanatory,
    },
    QueryRule {
        intent: QueryIntent::Location,
        trigger: Trigger::Any(&["find", "where", "search"]),
        build: location,
    },
    QueryRule {
        intent: QueryIntent::Analysis,
        trigger: Trigger::Any(&["analyze", "review"]),
        build: analysis,
    },
    QueryRule {
        intent: QueryIntent::Structural,
        trigger: Trigger::Any(&["structure", "architecture", "overview"]),
        build: structural,
    },
    QueryRule {
        intent: QueryIntent::Usage,
        trigger: Trigger::Any(&["used", "usage", "reference"]),
        build: usage,
    },
];

/// 未命中任何标识符时使用的占位名
const DEFAULT_IDENTIFIER: &str = "component";

const ARCHITECTURE_PROMPT: &str =
    "Explain the architecture, design patterns, and key components in detail";

/// 仅做分类，不生成任务
pub fn classify_query(request: &str) -> QueryIntent {
    let lower = request.to_lowercase();
    QUERY_RULES
        .iter()
        .find(|rule| rule.trigger.matches(&lower))
        .map(|rule| rule.intent)
        .unwrap_or(QueryIntent::General)
}

/// 为问答请求生成计划；同一输入总是得到相同输出
pub fn generate_plan(request: &str) -> Result<Plan, PilotError> {
    ensure_request(request)?;
    let lower = request.to_lowercase();

    let (intent, draft) = QUERY_RULES
        .iter()
        .find(|rule| rule.trigger.matches(&lower))
        .map(|rule| (rule.intent, (rule.build)(request, &lower)))
        .unwrap_or_else(|| (QueryIntent::General, general(request, &lower)));

    Ok(Plan {
        original_request: request.to_string(),
        tasks: draft.tasks,
        reasoning: draft.reasoning.to_string(),
        intent: Intent::Query(intent),
        safety_checks: Vec::new(),
    })
}

fn explanatory(request: &str, lower: &str) -> Draft {
    let mut tasks = vec![Task::query(
        "Answer the main question",
        format!("Explain in detail: {}", request),
    )];
    if contains_any(lower, &["structure", "architecture"]) {
        tasks.push(Task::structure("Get codebase structure for context"));
        return Draft {
            reasoning: "Query asks for explanation - will answer in detail, then gather the structural overview",
            tasks,
        };
    }
    Draft {
        reasoning: "Query asks for explanation - will answer in detail",
        tasks,
    }
}

fn location(request: &str, _lower: &str) -> Draft {
    Draft {
        reasoning: "Query is about finding code - will search the codebase",
        tasks: vec![Task::search("Search for requested code", request)],
    }
}

fn analysis(request: &str, lower: &str) -> Draft {
    let mut tasks = vec![Task::query("Perform detailed analysis", request)];
    if contains_any(lower, &["file", "."]) {
        if let Some(path) = extract_path_token(request) {
            tasks.push(Task::analyze(path, "Provide detailed analysis of this file"));
        }
    }
    Draft {
        reasoning: "Query asks for analysis - will analyze and provide suggestions",
        tasks,
    }
}

fn structural(_request: &str, _lower: &str) -> Draft {
    Draft {
        reasoning: "Query asks for structural overview",
        tasks: vec![
            Task::structure("Get codebase structure"),
            Task::query("Get detailed architectural insights", ARCHITECTURE_PROMPT),
        ],
    }
}

fn usage(request: &str, _lower: &str) -> Draft {
    let identifier = extract_identifier(request).unwrap_or(DEFAULT_IDENTIFIER);
    Draft {
        reasoning: "Query asks about code usage - will find usages and explain them",
        tasks: vec![
            Task::usages(identifier),
            Task::query(
                "Explain usage patterns",
                format!("Explain how {} is used throughout the codebase", identifier),
            ),
        ],
    }
}

fn general(request: &str, _lower: &str) -> Draft {
    Draft {
        reasoning: "General query - will answer it directly",
        tasks: vec![Task::query("Answer the query", request)],
    }
}

/// 第一个包含 '/' 或 '.' 的空白分隔词
pub(crate) fn extract_path_token(request: &str) -> Option<&str> {
    request
        .split_whitespace()
        .find(|w| w.contains('/') || w.contains('.'))
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// 第一个形如标识符的空白分隔词
pub(crate) fn extract_identifier(request: &str) -> Option<&str> {
    let pattern = identifier_pattern();
    request.split_whitespace().find(|w| pattern.is_match(w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::types::TaskKind;

    #[test]
    fn test_explanatory_single_task() {
        let plan = generate_plan("How does authentication work?").unwrap();
        assert_eq!(plan.intent, Intent::Query(QueryIntent::Explanatory));
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].kind, TaskKind::Query);
        assert_eq!(
            plan.tasks[0].param_str("query"),
            Some("Explain in detail: How does authentication work?")
        );
    }

    #[test]
    fn test_explanatory_with_architecture_appends_structure() {
        let plan = generate_plan("Explain the plugin architecture").unwrap();
        let kinds: Vec<_> = plan.tasks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TaskKind::Query, TaskKind::Structure]);
    }

    #[test]
    fn test_location_uses_verbatim_pattern() {
        let plan = generate_plan("Find the login handler").unwrap();
        assert_eq!(plan.intent, Intent::Query(QueryIntent::Location));
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].kind, TaskKind::Search);
        assert_eq!(
            plan.tasks[0].param_str("search_pattern"),
            Some("Find the login handler")
        );
    }

    #[test]
    fn test_explanatory_beats_location() {
        assert_eq!(
            classify_query("how do I find the config loader"),
            QueryIntent::Explanatory
        );
    }

    #[test]
    fn test_analysis_with_file_path() {
        let plan = generate_plan("Review src/auth/session.rs for races").unwrap();
        assert_eq!(plan.intent, Intent::Query(QueryIntent::Analysis));
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[0].param_str("query"), Some("Review src/auth/session.rs for races"));
        assert_eq!(plan.tasks[1].kind, TaskKind::Analyze);
        assert_eq!(plan.tasks[1].param_str("file_path"), Some("src/auth/session.rs"));
    }

    #[test]
    fn test_analysis_without_path_token() {
        let plan = generate_plan("Review the error handling").unwrap();
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].kind, TaskKind::Query);
    }

    #[test]
    fn test_analysis_mentions_file_but_no_token() {
        let plan = generate_plan("analyze the config file").unwrap();
        assert_eq!(plan.tasks.len(), 1);
    }

    #[test]
    fn test_structural_plan() {
        let plan = generate_plan("Give me an overview of the repo").unwrap();
        assert_eq!(plan.intent, Intent::Query(QueryIntent::Structural));
        let kinds: Vec<_> = plan.tasks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TaskKind::Structure, TaskKind::Query]);
        assert_eq!(plan.tasks[1].param_str("query"), Some(ARCHITECTURE_PROMPT));
    }

    #[test]
    fn test_usage_extracts_identifier() {
        let plan = generate_plan("parse_config usage across modules").unwrap();
        assert_eq!(plan.intent, Intent::Query(QueryIntent::Usage));
        assert_eq!(plan.tasks[0].kind, TaskKind::Usages);
        assert_eq!(plan.tasks[0].param_str("identifier"), Some("parse_config"));
        assert_eq!(
            plan.tasks[1].param_str("query"),
            Some("Explain how parse_config is used throughout the codebase")
        );
    }

    #[test]
    fn test_usage_falls_back_to_component() {
        let plan = generate_plan("usage?").unwrap();
        assert_eq!(plan.tasks[0].param_str("identifier"), Some("component"));
    }

    #[test]
    fn test_default_single_query() {
        let plan = generate_plan("List the public API").unwrap();
        assert_eq!(plan.intent, Intent::Query(QueryIntent::General));
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].param_str("query"), Some("List the public API"));
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        assert_eq!(classify_query("WHERE is main"), QueryIntent::Location);
    }

    #[test]
    fn test_generate_plan_is_deterministic() {
        for request in [
            "How does caching work?",
            "Find retries",
            "Review lib.rs",
            "architecture",
            "Token usage",
            "hello",
        ] {
            assert_eq!(generate_plan(request).unwrap(), generate_plan(request).unwrap());
        }
    }

    #[test]
    fn test_per_category_task_bounds() {
        let cases = [
            ("How does it work", 1, 2),
            ("Explain the architecture", 1, 2),
            ("search for retries", 1, 1),
            ("xyz", 1, 1),
        ];
        for (request, min, max) in cases {
            let n = generate_plan(request).unwrap().tasks.len();
            assert!(n >= min && n <= max, "{request}: {n} tasks");
        }
    }

    #[test]
    fn test_empty_request_fails() {
        assert!(matches!(generate_plan(""), Err(PilotError::PlanGeneration(_))));
    }
}
