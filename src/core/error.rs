//! 规划 / 执行过程中的错误类型
//!
//! 只有规划阶段的错误会让整次运行失败；工具侧的错误在客户端边界处被折叠进 OperationResult。

use thiserror::Error;

/// 工具无法定位时使用的退出码（与 shell 的 command not found 一致）
pub const EXIT_TOOL_NOT_FOUND: i32 = 127;

/// 单次调用超时时使用的退出码（与 coreutils timeout 一致）
pub const EXIT_TIMEOUT: i32 = 124;

/// 规划、工具调用、配置等环节可能出现的错误
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Plan generation failed: {0}")]
    PlanGeneration(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Missing task parameter: {0}")]
    MissingParameter(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    /// 自定义命令名为空或含路径分隔符
    #[error("Invalid command name: {0}")]
    InvalidCommandName(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PilotError {
    /// 映射到 OperationResult.exit_code；None 表示没有可用的进程退出码
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            PilotError::ToolNotFound(_) => Some(EXIT_TOOL_NOT_FOUND),
            PilotError::ToolTimeout(_) => Some(EXIT_TIMEOUT),
            PilotError::MissingParameter(_) => Some(1),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for PilotError {
    fn from(e: config::ConfigError) -> Self {
        PilotError::ConfigError(e.to_string())
    }
}
