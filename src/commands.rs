//! 自定义 slash command：工作目录下 .augment/commands/*.md
//!
//! 文件格式为带 frontmatter 的 Markdown：
//!
//! ```text
//! ---
//! name: review
//! description: Review the staged changes
//! ---
//!
//! <prompt>
//! ```

use std::path::{Path, PathBuf};

use crate::core::PilotError;

/// 相对工作目录的命令目录
pub const COMMANDS_DIR: &str = ".augment/commands";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCommand {
    /// 文件名（不含 .md），即 /<file> 调用名
    pub file: String,
    pub name: String,
    pub description: String,
}

pub fn commands_dir(working_directory: &Path) -> PathBuf {
    working_directory.join(COMMANDS_DIR)
}

/// 读取命令目录；目录不存在时返回 None。结果按文件名排序
pub fn read_custom_commands(working_directory: &Path) -> Result<Option<Vec<CustomCommand>>, PilotError> {
    let dir = commands_dir(working_directory);
    if !dir.is_dir() {
        return Ok(None);
    }

    let pattern = format!("{}/*.md", glob::Pattern::escape(&dir.to_string_lossy()));
    let paths = glob::glob(&pattern)
        .map_err(|e| PilotError::Internal(format!("bad commands pattern: {}", e)))?;

    let mut commands = Vec::new();
    for path in paths.flatten() {
        let Some(file) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let content = std::fs::read_to_string(&path).map_err(|e| {
            PilotError::ToolExecutionFailed(format!("read {}: {}", path.display(), e))
        })?;
        let name = frontmatter_value(&content, "name").unwrap_or_else(|| file.clone());
        let description =
            frontmatter_value(&content, "description").unwrap_or_else(|| "No description".to_string());
        commands.push(CustomCommand {
            file,
            name,
            description,
        });
    }
    commands.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(Some(commands))
}

/// 渲染为 `/<file>: <description>` 列表
pub fn list_custom_commands(working_directory: &Path) -> Result<String, PilotError> {
    match read_custom_commands(working_directory)? {
        None => Ok("No custom commands directory found".to_string()),
        Some(commands) if commands.is_empty() => Ok("No custom commands found".to_string()),
        Some(commands) => Ok(commands
            .iter()
            .map(|c| format!("/{}: {}", c.file, c.description))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// 写入 .augment/commands/<name>.md，返回文件路径
pub fn create_custom_command(
    working_directory: &Path,
    name: &str,
    description: &str,
    prompt: &str,
) -> Result<PathBuf, PilotError> {
    let name = name.trim();
    if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name == "." || name == ".." {
        return Err(PilotError::InvalidCommandName(name.to_string()));
    }

    let dir = commands_dir(working_directory);
    std::fs::create_dir_all(&dir)
        .map_err(|e| PilotError::ToolExecutionFailed(format!("create {}: {}", dir.display(), e)))?;

    let path = dir.join(format!("{}.md", name));
    let content = format!(
        "---\nname: {}\ndescription: {}\n---\n\n{}\n",
        name,
        description.trim(),
        prompt.trim_end()
    );
    std::fs::write(&path, content)
        .map_err(|e| PilotError::ToolExecutionFailed(format!("write {}: {}", path.display(), e)))?;

    tracing::info!(command = %name, path = %path.display(), "custom command created");
    Ok(path)
}

/// 只在开头的 `---` 块内查找 `key:`
fn frontmatter_value(content: &str, key: &str) -> Option<String> {
    let mut lines = content.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }
    lines
        .take_while(|line| line.trim() != "---")
        .find_map(|line| {
            let (k, v) = line.split_once(':')?;
            (k.trim() == key).then(|| v.trim().to_string())
        })
        .filter(|v| !v.is_empty())
}
