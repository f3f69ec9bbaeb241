//! 规划层：把自由文本请求分类为意图，并生成有序任务计划
//!
//! 两个规划器都是「有序关键词规则表 + 首个命中者胜出」，纯函数、无 I/O：
//! - **query**: 问答类（解释 / 定位 / 分析 / 结构 / 用法 / 默认）
//! - **editing**: 编辑类（create_file / fix_bug / refactor / ...），每类对应固定步骤模板

pub mod editing;
pub mod query;
pub mod types;

pub use editing::{classify_editing, editing_template, generate_editing_plan, EditingStep, EditingTemplate};
pub use query::{classify_query, generate_plan};
pub use types::{EditingTaskType, Intent, Plan, QueryIntent, Task, TaskKind};

use crate::core::PilotError;

/// 关键词触发条件（对小写后的请求做子串匹配）
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// 任一关键词出现
    Any(&'static [&'static str]),
    /// 第一组任一出现，且第二组任一出现
    Both(&'static [&'static str], &'static [&'static str]),
}

impl Trigger {
    pub fn matches(&self, lower: &str) -> bool {
        match self {
            Trigger::Any(words) => contains_any(lower, words),
            Trigger::Both(first, second) => contains_any(lower, first) && contains_any(lower, second),
        }
    }
}

pub(crate) fn contains_any(lower: &str, words: &[&str]) -> bool {
    words.iter().any(|w| lower.contains(w))
}

/// 空请求无法规划
pub(crate) fn ensure_request(request: &str) -> Result<(), PilotError> {
    if request.trim().is_empty() {
        return Err(PilotError::PlanGeneration("request is empty".to_string()));
    }
    Ok(())
}
