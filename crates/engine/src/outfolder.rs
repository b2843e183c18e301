//! Output folder: per-check output files and the JSON run report.
//!
//! The folder is wiped and recreated at the start of every run.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use iacheck_core::{CheckResult, CheckStatus, RunReport};
use tokio::fs;
use tracing::debug;

use crate::error::{EngineError, Result};

/// File name of the run report.
pub const REPORT_FILE: &str = "report.json";

/// Longest output name kept, in bytes, before the extension and any
/// de-duplication suffix.
const MAX_NAME_LEN: usize = 200;

/// Output folder of a run.
#[derive(Debug, Clone)]
pub struct OutFolder {
    root: PathBuf,
    /// Names handed out so far, lowercased for case-insensitive filesystems
    used: HashSet<String>,
}

impl OutFolder {
    /// Remove `root` if it exists and create it empty.
    ///
    /// Paths without a final name component (`/`, `.`, `..`) are refused.
    pub async fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !matches!(root.components().next_back(), Some(Component::Normal(_))) {
            return Err(EngineError::UnsafeOutfolder(root));
        }

        if fs::metadata(&root).await.map(|m| m.is_dir()).unwrap_or(false) {
            debug!("Removing existing outfolder: {}", root.display());
            fs::remove_dir_all(&root)
                .await
                .map_err(|e| EngineError::io(&root, e))?;
        }

        debug!("Creating outfolder: {}", root.display());
        fs::create_dir_all(&root)
            .await
            .map_err(|e| EngineError::io(&root, e))?;

        Ok(Self {
            root,
            used: HashSet::new(),
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Claim a file for a result's output.
    ///
    /// Names that flatten to one already claimed get a `_2`, `_3`, ...
    /// suffix, so every call returns a distinct path.
    pub fn claim_path(&mut self, check: &Path, target: Option<&str>) -> PathBuf {
        let base = output_name(check, target);
        let mut name = format!("{}.txt", base);
        let mut n = 1;
        while !self.used.insert(name.to_lowercase()) {
            n += 1;
            name = format!("{}_{}.txt", base, n);
        }
        self.root.join(name)
    }

    /// Write a result's output, one trimmed line per line.
    ///
    /// `target` is appended to the file name; pass it only when the run
    /// iterates over targets.
    pub async fn write_output(&mut self, result: &CheckResult, target: Option<&str>) -> Result<PathBuf> {
        let path = self.claim_path(&result.check, target);
        let text = match (&result.status, &result.error) {
            (CheckStatus::Error, Some(error)) => error.as_str(),
            _ => result.output.as_str(),
        };

        let mut contents = String::with_capacity(text.len() + 1);
        for line in text.lines() {
            contents.push_str(line.trim());
            contents.push('\n');
        }

        fs::write(&path, contents)
            .await
            .map_err(|e| EngineError::output(&path, e))?;
        Ok(path)
    }

    /// Write the pretty-printed run report.
    pub async fn write_report(&self, report: &RunReport) -> Result<PathBuf> {
        let path = self.root.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)
            .await
            .map_err(|e| EngineError::output(&path, e))?;
        Ok(path)
    }
}

/// Flatten a check path (and target) into a single file name.
///
/// Long names keep their tail, which holds the check's file name.
pub fn output_name(check: &Path, target: Option<&str>) -> String {
    let joined = check
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("_");

    let mut name = sanitize(&joined);
    if let Some(target) = target {
        name.push_str("__");
        name.push_str(&sanitize(target));
    }
    if name.len() > MAX_NAME_LEN {
        // ASCII after sanitizing, so any byte offset is a char boundary.
        name.drain(..name.len() - MAX_NAME_LEN);
    }
    name
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_name() {
        assert_eq!(output_name(Path::new("/checks/ssh.yaml"), None), "checks_ssh.yaml");
        assert_eq!(
            output_name(Path::new("./checks/web check.yml"), Some("10.0.0.1:8080")),
            "checks_web_check.yml__10.0.0.1_8080"
        );
    }

    #[test]
    fn test_output_name_keeps_tail_of_long_paths() {
        let deep: PathBuf = std::iter::repeat("nested-directory")
            .take(30)
            .chain(std::iter::once("ssh.yaml"))
            .collect();
        let name = output_name(&deep, Some("h1"));
        assert_eq!(name.len(), MAX_NAME_LEN);
        assert!(name.ends_with("_ssh.yaml__h1"));
    }

    #[tokio::test]
    async fn test_colliding_names_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let mut out = OutFolder::create(dir.path().join("out")).await.unwrap();

        let mut nested = CheckResult::new("checks/a/b.yaml", CheckStatus::Completed);
        nested.output = "nested".to_string();
        let mut flat = CheckResult::new("checks/a_b.yaml", CheckStatus::Completed);
        flat.output = "flat".to_string();

        let first = out.write_output(&nested, None).await.unwrap();
        let second = out.write_output(&flat, None).await.unwrap();
        assert_eq!(first.file_name().unwrap(), "checks_a_b.yaml.txt");
        assert_eq!(second.file_name().unwrap(), "checks_a_b.yaml_2.txt");
        assert_eq!(std::fs::read_to_string(first).unwrap(), "nested\n");
        assert_eq!(std::fs::read_to_string(second).unwrap(), "flat\n");
    }

    #[tokio::test]
    async fn test_names_differing_only_in_case_collide() {
        let dir = TempDir::new().unwrap();
        let mut out = OutFolder::create(dir.path().join("out")).await.unwrap();
        let path = out.claim_path(Path::new("web.yaml"), Some("h1"));
        assert_eq!(path.file_name().unwrap(), "web.yaml__h1.txt");
        let path = out.claim_path(Path::new("WEB.yaml"), Some("h1"));
        assert_eq!(path.file_name().unwrap(), "WEB.yaml__h1_2.txt");
        let path = out.claim_path(Path::new("web.yaml"), Some("h2"));
        assert_eq!(path.file_name().unwrap(), "web.yaml__h2.txt");
    }

    #[tokio::test]
    async fn test_write_failure_is_output_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let mut out = OutFolder::create(&root).await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let err = out
            .write_output(&CheckResult::new("a.yaml", CheckStatus::Completed), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Output { .. }));
        let err = out.write_report(&RunReport::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Output { .. }));
    }

    #[tokio::test]
    async fn test_create_wipes_existing_folder() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        std::fs::create_dir_all(root.join("stale")).unwrap();
        std::fs::write(root.join("stale/old.txt"), "old").unwrap();

        let out = OutFolder::create(&root).await.unwrap();
        assert!(out.root().is_dir());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_refuses_unsafe_roots() {
        for p in ["/", ".", ".."] {
            let err = OutFolder::create(p).await.unwrap_err();
            assert!(matches!(err, EngineError::UnsafeOutfolder(_)), "{}", p);
        }
    }

    #[tokio::test]
    async fn test_write_output_trims_lines() {
        let dir = TempDir::new().unwrap();
        let mut out = OutFolder::create(dir.path().join("out")).await.unwrap();

        let mut result = CheckResult::new("checks/a.yaml", CheckStatus::Completed);
        result.output = "  first  \nsecond\t".to_string();
        let path = out.write_output(&result, None).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "checks_a.yaml.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_write_output_for_error_uses_message() {
        let dir = TempDir::new().unwrap();
        let mut out = OutFolder::create(dir.path().join("out")).await.unwrap();

        let result = CheckResult::error("b.yaml", "no cmds provided");
        let path = out.write_output(&result, None).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "no cmds provided\n");
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let out = OutFolder::create(dir.path().join("out")).await.unwrap();

        let mut report = RunReport::new();
        report.results.push(CheckResult::new("a.yaml", CheckStatus::Passed));
        report.finish();
        let path = out.write_report(&report).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["id"], report.id.to_string());
        assert_eq!(json["results"][0]["status"], "passed");
    }
}
