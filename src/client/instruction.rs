//! 由 (TaskKind, parameters) 派生实际要发给 auggie 的指令

use serde_json::{Map, Value};

use crate::core::PilotError;
use crate::planner::TaskKind;

const STRUCTURE_PROMPT: &str = "Describe the overall structure and architecture of this codebase";

/// auggie 的三种调用形态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `auggie --print <prompt>`，只读
    Print(String),
    /// prompt 写入 stdin，允许编辑
    Interactive(String),
    /// `auggie command <name> [args]`
    SlashCommand { name: String, args: Option<String> },
}

impl Invocation {
    /// 审计日志与报告用的单行描述
    pub fn preview(&self) -> String {
        match self {
            Invocation::Print(p) => p.clone(),
            Invocation::Interactive(p) => format!("[edit] {}", p),
            Invocation::SlashCommand { name, args: Some(args) } => format!("/{} {}", name, args),
            Invocation::SlashCommand { name, args: None } => format!("/{}", name),
        }
    }
}

fn required<'a>(params: &'a Map<String, Value>, key: &str, kind: TaskKind) -> Result<&'a str, PilotError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| PilotError::MissingParameter(format!("{} task requires '{}'", kind, key)))
}

pub fn derive_invocation(
    kind: TaskKind,
    params: &Map<String, Value>,
    dry_run: bool,
) -> Result<Invocation, PilotError> {
    let invocation = match kind {
        TaskKind::Query => Invocation::Print(required(params, "query", kind)?.to_string()),
        TaskKind::Analyze => {
            let path = required(params, "file_path", kind)?;
            let question = required(params, "analysis_query", kind)?;
            Invocation::Print(format!("Analyze the file {}: {}", path, question))
        }
        TaskKind::Search => Invocation::Print(format!(
            "Search the codebase for: {}",
            required(params, "search_pattern", kind)?
        )),
        TaskKind::Structure => Invocation::Print(STRUCTURE_PROMPT.to_string()),
        TaskKind::Usages => Invocation::Print(format!(
            "Where is {} used in this codebase?",
            required(params, "identifier", kind)?
        )),
        TaskKind::Command => Invocation::SlashCommand {
            name: required(params, "command_name", kind)?.to_string(),
            args: params
                .get("args")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from),
        },
        TaskKind::Inspect => Invocation::Print(required(params, "prompt", kind)?.to_string()),
        TaskKind::Edit => {
            let prompt = required(params, "prompt", kind)?.to_string();
            if dry_run {
                Invocation::Print(prompt)
            } else {
                Invocation::Interactive(prompt)
            }
        }
    };
    Ok(invocation)
}
