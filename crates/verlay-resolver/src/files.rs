//! Version-marker files discovered by the ancestor walk.
//!
//! Two line-oriented conventions, checked in this order at each directory
//! level: a single-tool file (`.kubectl-version` holding one version string)
//! and the multi-tool `.tool-versions` list (`<tool> <version>` per line,
//! `#` starts a comment).

use std::path::{Path, PathBuf};
use tracing::warn;

pub const TOOL_VERSIONS_FILE: &str = ".tool-versions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHit {
    pub version: String,
    pub path: PathBuf,
}

fn read_lines(path: &Path) -> Option<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(
            text.lines()
                .map(|line| {
                    let line = line.split('#').next().unwrap_or(line);
                    line.trim().to_string()
                })
                .filter(|line| !line.is_empty())
                .collect(),
        ),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping unreadable version file");
            None
        }
    }
}

pub fn single_tool_file(dir: &Path, tool: &str) -> Option<FileHit> {
    let path = dir.join(format!(".{tool}-version"));
    let lines = read_lines(&path)?;
    let version = lines.first()?.split_whitespace().next()?.to_string();
    Some(FileHit { version, path })
}

pub fn tool_versions_file(dir: &Path, tool: &str) -> Option<FileHit> {
    let path = dir.join(TOOL_VERSIONS_FILE);
    let lines = read_lines(&path)?;
    for line in lines {
        let mut fields = line.split_whitespace();
        if fields.next() == Some(tool) {
            let version = fields.next()?.to_string();
            return Some(FileHit { version, path });
        }
    }
    None
}

/// First marker-file match at this level, in precedence order.
pub fn probe_level(dir: &Path, tool: &str) -> Option<FileHit> {
    single_tool_file(dir, tool).or_else(|| tool_versions_file(dir, tool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tool_file_wins_over_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".demo-version"), "1.2.0\n").unwrap();
        std::fs::write(dir.path().join(TOOL_VERSIONS_FILE), "demo 1.1.0\n").unwrap();

        let hit = probe_level(dir.path(), "demo").unwrap();
        assert_eq!(hit.version, "1.2.0");
        assert_eq!(hit.path, dir.path().join(".demo-version"));
    }

    #[test]
    fn list_file_matches_by_first_field() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TOOL_VERSIONS_FILE),
            "# pinned by ops\nkubectl 1.28.0\ndemo 1.1.0  # trailing comment\n",
        )
        .unwrap();

        let hit = probe_level(dir.path(), "demo").unwrap();
        assert_eq!(hit.version, "1.1.0");

        assert_eq!(probe_level(dir.path(), "kubectl").unwrap().version, "1.28.0");
        assert!(probe_level(dir.path(), "helm").is_none());
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".demo-version"), "\n# note\n  2.0.0\n").unwrap();
        assert_eq!(probe_level(dir.path(), "demo").unwrap().version, "2.0.0");
    }

    #[test]
    fn absent_files_probe_to_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(probe_level(dir.path(), "demo").is_none());
    }
}
