//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SCOUT__*` 覆盖（双下划线表示嵌套，如 `SCOUT__BUDGET__MAX_TOTAL_SECS=600`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::{Budget, PilotError};
use crate::runner::RunMode;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub budget: BudgetSection,
    #[serde(default)]
    pub auggie: AuggieSection,
    #[serde(default)]
    pub editor: EditorSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 默认工作目录（目标代码库），未设置时用进程当前目录
    pub workspace_root: Option<PathBuf>,
}

/// [budget] 段：全局墙钟上限、单任务超时、自适应迭代上限
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetSection {
    #[serde(default = "default_max_total_secs")]
    pub max_total_secs: u64,
    #[serde(default = "default_per_task_timeout_secs")]
    pub per_task_timeout_secs: u64,
    /// 编辑运行的单任务超时（编辑通常比问答慢）
    #[serde(default = "default_edit_task_timeout_secs")]
    pub edit_task_timeout_secs: u64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_total_secs() -> u64 {
    300
}

fn default_per_task_timeout_secs() -> u64 {
    120
}

fn default_edit_task_timeout_secs() -> u64 {
    180
}

fn default_max_iterations() -> usize {
    5
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self {
            max_total_secs: default_max_total_secs(),
            per_task_timeout_secs: default_per_task_timeout_secs(),
            edit_task_timeout_secs: default_edit_task_timeout_secs(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// [auggie] 段：可执行文件路径、探测超时、输出上限
#[derive(Debug, Clone, Deserialize)]
pub struct AuggieSection {
    /// 显式指定 auggie 路径；未设置时回退到 AUGGIE_PATH / PATH / 常见位置
    pub path: Option<PathBuf>,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_max_output_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for AuggieSection {
    fn default() -> Self {
        Self {
            path: None,
            probe_timeout_secs: default_probe_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

/// [editor] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EditorSection {
    /// 预览模式：编辑步骤只打印不落盘
    #[serde(default)]
    pub dry_run: bool,
}

impl AppConfig {
    /// 按运行模式取预算；编辑运行使用 edit_task_timeout_secs
    pub fn budget_for(&self, mode: RunMode) -> Budget {
        let per_task = match mode {
            RunMode::Query => self.budget.per_task_timeout_secs,
            RunMode::Editing => self.budget.edit_task_timeout_secs,
        };
        Budget::from_secs(self.budget.max_total_secs, per_task)
    }
}

/// 从 config 目录加载配置，环境变量 SCOUT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SCOUT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, PilotError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SCOUT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    Ok(c.try_deserialize()?)
}
