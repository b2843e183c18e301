//! Check model - check files, tasks, and expectations.

use std::collections::BTreeMap;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::settings::{render_value, value_kind};

/// A parsed check file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckDefinition {
    /// One-line summary
    #[serde(default)]
    pub summary: Option<String>,

    /// Longer description
    #[serde(default)]
    pub description: Option<String>,

    /// Task to execute
    #[serde(default)]
    pub task: Option<TaskSpec>,
}

impl CheckDefinition {
    /// Parse a check file.
    ///
    /// Returns `Ok(None)` for an empty document.
    pub fn from_yaml(text: &str) -> Result<Option<Self>> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        match value {
            serde_yaml::Value::Null => Ok(None),
            serde_yaml::Value::Mapping(_) => Ok(Some(serde_yaml::from_value(value)?)),
            other => Err(CoreError::NotAMapping(value_kind(&other))),
        }
    }
}

/// A task as written in YAML.
///
/// Several keys have an alternate spelling; the first spelling wins when
/// both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSpec {
    #[serde(default)]
    task_type: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,

    #[serde(default)]
    cmd: Option<OneOrMany>,
    #[serde(default)]
    cmds: Option<OneOrMany>,

    #[serde(default)]
    notes: Option<OneOrMany>,
    #[serde(default)]
    note: Option<OneOrMany>,

    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    data: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    headers: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    user_agent: Option<String>,

    #[serde(default)]
    expect: Option<String>,
    #[serde(default)]
    expect_status: Option<u16>,

    /// Timeout in seconds
    #[serde(default)]
    timeout: Option<u64>,
}

/// A string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

impl TaskSpec {
    /// Name of the task type as written, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.task_type.as_deref().or(self.kind.as_deref())
    }

    /// Validate the raw task into something executable.
    pub fn into_task(self) -> Result<Task> {
        let type_name = self
            .task_type
            .clone()
            .or_else(|| self.kind.clone())
            .ok_or(CoreError::MissingTaskType)?;

        if self.expect_status.is_some() && type_name != "web_request" {
            return Err(CoreError::StatusWithoutRequest(type_name));
        }

        let expectation = Expectation::new(self.expect.as_deref(), self.expect_status)?;
        let timeout = self.timeout.map(Duration::from_secs);

        let action = match type_name.as_str() {
            "cmd" => {
                let cmds: Vec<String> = self
                    .cmd
                    .or(self.cmds)
                    .map(OneOrMany::into_vec)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|c| !c.trim().is_empty())
                    .collect();
                if cmds.is_empty() {
                    return Err(CoreError::NoCommands);
                }
                TaskAction::Cmd { cmds }
            }
            "notes" => {
                let notes = self
                    .notes
                    .or(self.note)
                    .map(OneOrMany::into_vec)
                    .unwrap_or_default();
                if notes.is_empty() {
                    return Err(CoreError::NoNotes);
                }
                TaskAction::Notes { notes }
            }
            "web_request" => {
                let url = self
                    .url
                    .filter(|u| !u.trim().is_empty())
                    .ok_or(CoreError::NoUrl)?;
                TaskAction::WebRequest {
                    url,
                    data: render_map(self.data),
                    headers: render_map(self.headers),
                    user_agent: self.user_agent,
                }
            }
            other => return Err(CoreError::UnknownTaskType(other.to_string())),
        };

        Ok(Task {
            action,
            expectation,
            timeout,
        })
    }
}

fn render_map(map: BTreeMap<String, serde_yaml::Value>) -> BTreeMap<String, String> {
    map.into_iter().map(|(k, v)| (k, render_value(&v))).collect()
}

/// A validated task.
#[derive(Debug, Clone)]
pub struct Task {
    /// What to do
    pub action: TaskAction,

    /// How to judge the outcome
    pub expectation: Expectation,

    /// Per-task timeout override
    pub timeout: Option<Duration>,
}

impl Task {
    /// Kind of this task.
    pub fn kind(&self) -> TaskKind {
        match self.action {
            TaskAction::Cmd { .. } => TaskKind::Cmd,
            TaskAction::Notes { .. } => TaskKind::Notes,
            TaskAction::WebRequest { .. } => TaskKind::WebRequest,
        }
    }
}

/// Executable part of a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    /// Shell commands, joined and run once
    Cmd {
        /// Commands, placeholders unresolved
        cmds: Vec<String>,
    },
    /// Manual actions for the operator
    Notes {
        /// One line per action
        notes: Vec<String>,
    },
    /// HTTP request; POST when `data` is non-empty
    WebRequest {
        /// Target URL
        url: String,
        /// Form fields
        data: BTreeMap<String, String>,
        /// Extra request headers
        headers: BTreeMap<String, String>,
        /// Replaces the default `User-Agent`
        user_agent: Option<String>,
    },
}

/// Task kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Shell commands
    Cmd,
    /// Manual actions
    Notes,
    /// HTTP request
    WebRequest,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TaskKind::Cmd => "cmd",
            TaskKind::Notes => "notes",
            TaskKind::WebRequest => "web_request",
        })
    }
}

/// Pass/fail criteria for a task's output.
#[derive(Debug, Clone, Default)]
pub struct Expectation {
    pattern: Option<Regex>,
    status: Option<u16>,
}

/// Outcome of evaluating an [`Expectation`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectationOutcome {
    /// `None` when there was nothing to check
    pub passed: Option<bool>,
    /// Named capture groups from the pattern
    pub captures: BTreeMap<String, String>,
}

impl Expectation {
    /// Build an expectation. Patterns are case-insensitive.
    pub fn new(pattern: Option<&str>, status: Option<u16>) -> Result<Self> {
        let pattern = pattern
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| CoreError::InvalidExpect {
                        pattern: p.to_string(),
                        source,
                    })
            })
            .transpose()?;
        Ok(Self { pattern, status })
    }

    /// Whether anything is checked at all.
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.status.is_none()
    }

    /// Evaluate against task output and, for HTTP tasks, the status code.
    pub fn evaluate(&self, output: &str, status: Option<u16>) -> ExpectationOutcome {
        if self.is_empty() {
            return ExpectationOutcome::default();
        }

        let mut passed = true;
        let mut captures = BTreeMap::new();

        if let Some(expected) = self.status {
            passed &= status == Some(expected);
        }

        if let Some(re) = &self.pattern {
            match re.captures(output) {
                Some(caps) => {
                    for name in re.capture_names().flatten() {
                        if let Some(m) = caps.name(name) {
                            captures.insert(name.to_string(), m.as_str().to_string());
                        }
                    }
                }
                None => passed = false,
            }
        }

        ExpectationOutcome {
            passed: Some(passed),
            captures,
        }
    }
}
