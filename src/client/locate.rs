//! 定位 auggie 可执行文件
//!
//! 查找顺序：配置 / AUGGIE_PATH → PATH（which）→ 常见安装位置 → npm 全局 prefix。

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use crate::config::AuggieSection;
use crate::core::PilotError;

const BINARY: &str = "auggie";

/// 可执行文件定位器
#[derive(Debug, Clone)]
pub struct AuggieLocator {
    explicit: Option<PathBuf>,
    /// false 时只检查 explicit
    search_fallbacks: bool,
    probe_timeout: Duration,
}

impl AuggieLocator {
    pub fn new(explicit: Option<PathBuf>, probe_timeout: Duration) -> Self {
        Self {
            explicit,
            search_fallbacks: true,
            probe_timeout,
        }
    }

    /// 只认指定路径
    pub fn exact(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
            search_fallbacks: false,
            probe_timeout: Duration::from_secs(5),
        }
    }

    pub fn from_config(section: &AuggieSection) -> Self {
        let explicit = section
            .path
            .clone()
            .or_else(|| std::env::var_os("AUGGIE_PATH").map(PathBuf::from));
        Self::new(explicit, Duration::from_secs(section.probe_timeout_secs))
    }

    /// 用于「未找到」错误信息的检查位置清单
    pub fn checked_locations(&self) -> Vec<String> {
        let mut checked = vec![match &self.explicit {
            Some(p) => format!("configured path / AUGGIE_PATH: {}", p.display()),
            None => "configured path / AUGGIE_PATH: not set".to_string(),
        }];
        if self.search_fallbacks {
            checked.push("system PATH".to_string());
            checked.extend(common_locations().iter().map(|p| p.display().to_string()));
            checked.push("npm global prefix".to_string());
        }
        checked
    }

    pub async fn locate(&self) -> Result<PathBuf, PilotError> {
        if let Some(path) = &self.explicit {
            if path.is_file() {
                return Ok(path.clone());
            }
            tracing::warn!(path = %path.display(), "configured auggie path not found");
        }
        if !self.search_fallbacks {
            return Err(self.not_found());
        }

        if let Ok(path) = which::which(BINARY) {
            return Ok(path);
        }

        if let Some(path) = common_locations().into_iter().find(|p| p.is_file()) {
            return Ok(path);
        }

        if let Some(prefix) = self.npm_prefix().await {
            let found = npm_candidates(&prefix).into_iter().find(|p| p.is_file());
            if let Some(path) = found {
                return Ok(path);
            }
        }

        Err(self.not_found())
    }

    fn not_found(&self) -> PilotError {
        PilotError::ToolNotFound(format!("{} CLI not found in PATH or common locations", BINARY))
    }

    async fn npm_prefix(&self) -> Option<PathBuf> {
        let output = tokio::time::timeout(
            self.probe_timeout,
            Command::new("npm")
                .args(["config", "get", "prefix"])
                .kill_on_drop(true)
                .output(),
        )
        .await
        .ok()?
        .ok()?;
        if !output.status.success() {
            return None;
        }
        let prefix = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!prefix.is_empty()).then(|| PathBuf::from(prefix))
    }
}

fn common_locations() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/usr/local/bin/auggie"),
        PathBuf::from("/opt/homebrew/bin/auggie"),
        PathBuf::from("/usr/bin/auggie"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(Path::new(&home).join(".npm-global/bin/auggie"));
    }
    if let Some(appdata) = std::env::var_os("APPDATA") {
        let npm = Path::new(&appdata).join("npm");
        paths.push(npm.join("auggie.cmd"));
        paths.push(npm.join("auggie"));
    }
    paths
}

fn npm_candidates(prefix: &Path) -> Vec<PathBuf> {
    vec![
        prefix.join("bin").join(BINARY),
        prefix.join("auggie.cmd"),
        prefix.join(BINARY),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_locator_finds_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("auggie");
        std::fs::write(&bin, "").unwrap();

        let found = AuggieLocator::exact(&bin).locate().await.unwrap();
        assert_eq!(found, bin);
    }

    #[tokio::test]
    async fn test_exact_locator_missing_is_tool_not_found() {
        let err = AuggieLocator::exact("/definitely/not/here/auggie")
            .locate()
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::ToolNotFound(_)));
        assert_eq!(err.exit_code(), Some(127));
    }

    #[test]
    fn test_checked_locations_for_exact_locator() {
        let checked = AuggieLocator::exact("/opt/auggie").checked_locations();
        assert_eq!(checked.len(), 1);
        assert!(checked[0].contains("/opt/auggie"));
    }
}
