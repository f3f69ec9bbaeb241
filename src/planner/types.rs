//! 计划数据模型：Task / Plan 及意图分类

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 任务类型：决定调用哪个外部操作、如何解释 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 直接回答问题（关键任务）
    Query,
    /// 分析指定文件
    Analyze,
    /// 在代码库中搜索
    Search,
    /// 获取整体结构
    Structure,
    /// 查找标识符用法
    Usages,
    /// 执行 slash command
    Command,
    /// 编辑流程中的只读步骤
    Inspect,
    /// 编辑流程中的写入步骤（关键任务）
    Edit,
}

impl TaskKind {
    /// 失败即终止整个计划
    pub fn is_critical(self) -> bool {
        matches!(self, TaskKind::Query | TaskKind::Edit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Query => "query",
            TaskKind::Analyze => "analyze",
            TaskKind::Search => "search",
            TaskKind::Structure => "structure",
            TaskKind::Usages => "usages",
            TaskKind::Command => "command",
            TaskKind::Inspect => "inspect",
            TaskKind::Edit => "edit",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个任务，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Task {
    pub fn new(kind: TaskKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters
            .insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    pub fn query(description: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(TaskKind::Query, description).with_param("query", query)
    }

    pub fn search(description: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(TaskKind::Search, description).with_param("search_pattern", pattern)
    }

    pub fn structure(description: impl Into<String>) -> Self {
        Self::new(TaskKind::Structure, description)
    }

    pub fn analyze(file_path: &str, analysis_query: impl Into<String>) -> Self {
        Self::new(TaskKind::Analyze, format!("Analyze file: {}", file_path))
            .with_param("file_path", file_path)
            .with_param("analysis_query", analysis_query)
    }

    pub fn usages(identifier: &str) -> Self {
        Self::new(TaskKind::Usages, format!("Find usages of: {}", identifier))
            .with_param("identifier", identifier)
    }

    pub fn command(command_name: &str, args: Option<&str>) -> Self {
        let mut task = Self::new(TaskKind::Command, format!("Run slash command: /{}", command_name))
            .with_param("command_name", command_name);
        if let Some(args) = args.filter(|a| !a.is_empty()) {
            task = task.with_param("args", args);
        }
        task
    }
}

/// 问答类请求的意图（按优先级排列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Explanatory,
    Location,
    Analysis,
    Structural,
    Usage,
    General,
}

/// 编辑类请求的任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingTaskType {
    CreateFile,
    FixBug,
    Refactor,
    AddFeature,
    Optimize,
    AddTests,
    AddDocs,
    FixTypes,
    FixLint,
    CustomEdit,
}

impl EditingTaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            EditingTaskType::CreateFile => "create_file",
            EditingTaskType::FixBug => "fix_bug",
            EditingTaskType::Refactor => "refactor",
            EditingTaskType::AddFeature => "add_feature",
            EditingTaskType::Optimize => "optimize",
            EditingTaskType::AddTests => "add_tests",
            EditingTaskType::AddDocs => "add_docs",
            EditingTaskType::FixTypes => "fix_types",
            EditingTaskType::FixLint => "fix_lint",
            EditingTaskType::CustomEdit => "custom_edit",
        }
    }
}

impl fmt::Display for EditingTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 计划来源：问答规划器或编辑规划器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "planner", content = "category")]
pub enum Intent {
    Query(QueryIntent),
    Editing(EditingTaskType),
    /// 手工构造的计划（如单条 slash command）
    Manual,
}

/// 执行计划：只允许自适应执行器在尾部追加任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub original_request: String,
    pub tasks: Vec<Task>,
    pub reasoning: String,
    pub intent: Intent,
    /// 编辑计划附带的人工检查清单；问答计划为空
    #[serde(default)]
    pub safety_checks: Vec<String>,
}

impl Plan {
    pub fn manual(original_request: impl Into<String>, tasks: Vec<Task>, reasoning: impl Into<String>) -> Self {
        Self {
            original_request: original_request.into(),
            tasks,
            reasoning: reasoning.into(),
            intent: Intent::Manual,
            safety_checks: Vec::new(),
        }
    }

    /// 规划失败时返回给调用方的空计划
    pub fn empty(original_request: impl Into<String>) -> Self {
        Self::manual(original_request, Vec::new(), String::new())
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.intent, Intent::Editing(_))
    }

    pub fn push_follow_up(&mut self, task: Task) {
        self.tasks.push(task);
    }
}
