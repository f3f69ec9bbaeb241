//! Scout - 基于 auggie CLI 的限时任务规划与执行器
//!
//! 模块划分：
//! - **client**: 外部操作客户端抽象（auggie CLI 实现 / 脚本化 Mock）与带审计日志的执行器
//! - **commands**: 自定义 slash command（.augment/commands/*.md）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、时钟、时间预算
//! - **observability**: tracing 日志初始化
//! - **planner**: 关键词优先级规则，把请求文本转成有序任务计划（问答 / 编辑）
//! - **runner**: 预算执行器、自适应执行器、结果汇总报告

pub mod client;
pub mod commands;
pub mod config;
pub mod core;
pub mod observability;
pub mod planner;
pub mod runner;

pub use client::{AuggieClient, OperationClient, OperationResult};
pub use core::{Budget, PilotError};
pub use planner::{generate_editing_plan, generate_plan, Plan, Task, TaskKind};
pub use runner::{RunMode, RunOptions, RunResult, Runner, StopReason};
