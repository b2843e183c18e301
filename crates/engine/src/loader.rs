//! Loading check files and the input file.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use iacheck_core::{CheckDefinition, Settings};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{EngineError, Result};
use crate::template::find_inputs;

/// A check file that parsed successfully.
#[derive(Debug, Clone)]
pub struct LoadedCheck {
    /// Path as discovered
    pub path: PathBuf,

    /// Parsed contents
    pub definition: CheckDefinition,
}

/// A check file that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Offending path or list item
    pub path: PathBuf,

    /// What went wrong
    pub message: String,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Everything gathered from the check files.
#[derive(Debug, Clone, Default)]
pub struct CheckSet {
    /// Parsed checks, in discovery order
    pub checks: Vec<LoadedCheck>,

    /// Inputs referenced anywhere in the selected files
    pub inputs: BTreeSet<String>,

    /// Per-file problems
    pub errors: Vec<LoadError>,
}

impl CheckSet {
    /// Number of parsed checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no check was parsed.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Compile the check filter. Matching is case-insensitive and unanchored.
pub fn build_filter(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Load checks from a comma-separated list of files and directories.
///
/// Directories are walked recursively in file-name order. Only paths
/// matching `filter` are read.
pub fn load_checks(paths: &str, filter: &Regex) -> CheckSet {
    let mut set = CheckSet::default();
    let mut seen = HashSet::new();

    for item in paths.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let path = Path::new(item);

        if path.is_file() {
            if filter.is_match(item) {
                load_file(path, &mut set, &mut seen);
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        set.errors.push(LoadError {
                            path: e.path().unwrap_or(path).to_path_buf(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                };

                let file = entry.path();
                if !file.is_file() {
                    continue;
                }
                if filter.is_match(&file.to_string_lossy()) {
                    load_file(file, &mut set, &mut seen);
                }
            }
        } else {
            set.errors.push(LoadError {
                path: path.to_path_buf(),
                message: "unknown check file path type".to_string(),
            });
        }
    }

    set
}

fn load_file(path: &Path, set: &mut CheckSet, seen: &mut HashSet<PathBuf>) {
    if !seen.insert(path.to_path_buf()) {
        return;
    }

    debug!("Parsing check file: {} for inputs and YAML config", path.display());

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            set.errors.push(LoadError {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
            return;
        }
    };

    // Inputs count even when the YAML turns out to be invalid.
    set.inputs.extend(find_inputs(&text));

    match CheckDefinition::from_yaml(&text) {
        Ok(Some(definition)) => set.checks.push(LoadedCheck {
            path: path.to_path_buf(),
            definition,
        }),
        Ok(None) => warn!("Check file {} is empty, skipping", path.display()),
        Err(e) => set.errors.push(LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Read and parse the input file.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    Ok(Settings::from_yaml(&text)?)
}

/// Inputs referenced by checks but absent from `context`, sorted.
pub fn missing_inputs(inputs: &BTreeSet<String>, context: &Settings) -> Vec<String> {
    inputs
        .iter()
        .filter(|name| !context.contains(name))
        .cloned()
        .collect()
}
