//! 外部操作客户端
//!
//! 执行器只通过 OperationClient 与外部工具交互：一次调用 = 一条派生出的自然语言指令，
//! 返回统一的 OperationResult。任何失败都折叠进结果（success=false），从不向上抛错。

pub mod auggie;
pub mod changes;
pub mod executor;
pub mod instruction;
pub mod locate;
pub mod mock;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::PilotError;
use crate::planner::{Task, TaskKind};

pub use auggie::AuggieClient;
pub use changes::parse_file_changes;
pub use executor::{OperationExecutor, TimedResult};
pub use instruction::{derive_invocation, Invocation};
pub use locate::AuggieLocator;
pub use mock::ScriptedClient;

/// 外部工具一次调用的结果信封
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// 仅编辑类调用填充
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<Vec<String>>,
}

impl OperationResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            exit_code,
            ..Self::default()
        }
    }

    pub fn from_error(err: &PilotError) -> Self {
        Self::failure(err.to_string(), err.exit_code())
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_files_changed(mut self, files: Vec<String>) -> Self {
        self.files_changed = Some(files);
        self
    }
}

/// 一次调用的完整输入
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub kind: TaskKind,
    pub parameters: Map<String, Value>,
    pub working_directory: Option<PathBuf>,
    pub timeout: Duration,
    /// 编辑调用仅预览、不落盘
    pub dry_run: bool,
}

impl OperationRequest {
    pub fn for_task(
        task: &Task,
        working_directory: Option<&Path>,
        timeout: Duration,
        dry_run: bool,
    ) -> Self {
        Self {
            kind: task.kind,
            parameters: task.parameters.clone(),
            working_directory: working_directory.map(Path::to_path_buf),
            timeout,
            dry_run,
        }
    }

    pub fn invocation(&self) -> Result<Invocation, PilotError> {
        derive_invocation(self.kind, &self.parameters, self.dry_run)
    }
}

/// 外部操作客户端 trait
#[async_trait]
pub trait OperationClient: Send + Sync {
    /// 执行一次操作；实现方负责在 request.timeout 内返回
    async fn run_operation(&self, request: &OperationRequest) -> OperationResult;

    fn name(&self) -> &str {
        "operation-client"
    }
}
