//! auggie CLI 客户端
//!
//! 不经过 shell，直接以参数形式启动进程：只读调用用 `--print`，编辑调用把 prompt 写入 stdin，
//! slash command 用 `command <name> [args]`。超时后进程随句柄一起被 kill；输出按字节上限截断。

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::client::changes::parse_file_changes;
use crate::client::instruction::Invocation;
use crate::client::locate::AuggieLocator;
use crate::client::{OperationClient, OperationRequest, OperationResult};
use crate::config::AuggieSection;
use crate::core::error::EXIT_TOOL_NOT_FOUND;
use crate::core::PilotError;
use crate::planner::TaskKind;

const TRUNCATION_NOTICE: &str = "\n[output truncated]";

/// 基于 auggie 可执行文件的 OperationClient
pub struct AuggieClient {
    locator: AuggieLocator,
    max_output_bytes: usize,
    /// 首次定位成功后缓存
    binary: OnceCell<PathBuf>,
}

impl AuggieClient {
    pub fn new(locator: AuggieLocator, max_output_bytes: usize) -> Self {
        Self {
            locator,
            max_output_bytes,
            binary: OnceCell::new(),
        }
    }

    pub fn from_config(section: &AuggieSection) -> Self {
        Self::new(AuggieLocator::from_config(section), section.max_output_bytes)
    }

    async fn binary(&self) -> Result<&PathBuf, PilotError> {
        self.binary
            .get_or_try_init(|| self.locator.locate())
            .await
    }

    fn not_found_result(&self, err: &PilotError) -> OperationResult {
        let checked = self
            .locator
            .checked_locations()
            .into_iter()
            .map(|l| format!("- {}", l))
            .collect::<Vec<_>>()
            .join("\n");
        OperationResult::failure(
            format!(
                "{}. Please ensure:\n1. Auggie is installed: npm install -g @augmentcode/auggie\n2. You're logged in: auggie login\n3. Auggie is in PATH, or set AUGGIE_PATH / SCOUT__AUGGIE__PATH\n\nChecked locations:\n{}",
                err, checked
            ),
            Some(EXIT_TOOL_NOT_FOUND),
        )
    }

    fn truncate(&self, text: String) -> String {
        if text.len() <= self.max_output_bytes {
            return text;
        }
        let mut end = self.max_output_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}{}", &text[..end], TRUNCATION_NOTICE)
    }
}

/// 进程启动前就能确定的失败
enum SpawnFailure {
    NotFound(PilotError),
    Failed(PilotError),
}

impl AuggieClient {
    /// 定位、启动、写入 stdin、等待退出；整体由调用方套上超时
    async fn spawn_and_wait(
        &self,
        invocation: &Invocation,
        request: &OperationRequest,
    ) -> Result<std::process::Output, SpawnFailure> {
        let binary = self.binary().await.map_err(SpawnFailure::NotFound)?;

        let mut cmd = Command::new(binary);
        let mut stdin_payload = None;
        match invocation {
            Invocation::Print(prompt) => {
                cmd.args(["--print", prompt.as_str()]);
            }
            Invocation::Interactive(prompt) => {
                stdin_payload = Some(format!("{}\n", prompt));
            }
            Invocation::SlashCommand { name, args } => {
                cmd.args(["command", name.as_str()]);
                if let Some(args) = args {
                    cmd.arg(args);
                }
            }
        }
        if let Some(dir) = &request.working_directory {
            cmd.current_dir(dir);
        }
        cmd.stdin(if stdin_payload.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        tracing::debug!(binary = %binary.display(), kind = %request.kind, "auggie spawn");

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpawnFailure::NotFound(PilotError::ToolNotFound(e.to_string()))
            } else {
                SpawnFailure::Failed(PilotError::ToolExecutionFailed(format!(
                    "failed to start auggie: {}",
                    e
                )))
            }
        })?;

        // stdin 与 stdout/stderr 并发处理，避免大 prompt 与大输出互相阻塞
        let stdin = child.stdin.take();
        let write = async move {
            if let (Some(payload), Some(mut stdin)) = (stdin_payload, stdin) {
                if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                    tracing::warn!(error = %e, "failed to write prompt to auggie stdin");
                }
            }
        };
        let ((), output) = tokio::join!(write, child.wait_with_output());
        output.map_err(|e| SpawnFailure::Failed(PilotError::ToolExecutionFailed(e.to_string())))
    }
}

#[async_trait]
impl OperationClient for AuggieClient {
    async fn run_operation(&self, request: &OperationRequest) -> OperationResult {
        let invocation = match request.invocation() {
            Ok(i) => i,
            Err(e) => return OperationResult::from_error(&e),
        };

        if let Some(dir) = &request.working_directory {
            if !dir.is_dir() {
                return OperationResult::failure(
                    format!("Working directory not found: {}", dir.display()),
                    Some(1),
                );
            }
        }

        // 超时覆盖定位（含 npm prefix 探测）、stdin 写入与等待；超时后 future 被丢弃，子进程随之被 kill
        let timed = tokio::time::timeout(request.timeout, self.spawn_and_wait(&invocation, request)).await;
        let output = match timed {
            Ok(Ok(output)) => output,
            Ok(Err(SpawnFailure::NotFound(e))) => return self.not_found_result(&e),
            Ok(Err(SpawnFailure::Failed(e))) => return OperationResult::from_error(&e),
            Err(_) => {
                return OperationResult::from_error(&PilotError::ToolTimeout(format!(
                    "auggie did not finish within {:?}",
                    request.timeout
                )));
            }
        };

        let stdout = self.truncate(String::from_utf8_lossy(&output.stdout).trim().to_string());
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        let mut result = if output.status.success() {
            let mut r = OperationResult::ok(stdout.clone());
            if !stderr.is_empty() {
                r.error = Some(stderr);
            }
            r
        } else {
            let error = if stderr.is_empty() {
                format!("auggie exited with {}", output.status)
            } else {
                stderr
            };
            OperationResult::failure(error, output.status.code()).with_output(stdout.clone())
        };

        if request.kind == TaskKind::Edit {
            result = result.with_files_changed(parse_file_changes(&stdout));
        }
        result
    }

    fn name(&self) -> &str {
        "auggie"
    }
}
