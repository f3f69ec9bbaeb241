//! 从 auggie 输出中解析被修改的文件

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn change_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?m)(?:Modified|Created|Updated|Edited|Writing to):[ \t]+(.+)$")
            .expect("change marker pattern is valid")
    })
}

/// 按出现顺序提取去重后的文件路径
pub fn parse_file_changes(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    change_marker()
        .captures_iter(output)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|path| !path.is_empty() && seen.insert(path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_all_markers_in_order() {
        let out = "Thinking...\nModified: src/a.rs\nCreated: src/b.rs\nWriting to: docs/c.md\nUpdated:   src/a.rs\nEdited: Cargo.toml\n";
        assert_eq!(
            parse_file_changes(out),
            vec!["src/a.rs", "src/b.rs", "docs/c.md", "Cargo.toml"]
        );
    }

    #[test]
    fn test_no_markers() {
        assert!(parse_file_changes("nothing changed").is_empty());
    }

    #[test]
    fn test_marker_without_path_is_ignored() {
        assert!(parse_file_changes("Modified:\n").is_empty());
    }
}
