//! Check results and run reports.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::check::TaskKind;
use crate::id::RunId;
use crate::Time;

/// Status of a single check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Expectation met
    Passed,
    /// Expectation not met
    Failed,
    /// Executed, nothing to judge
    Completed,
    /// Notes shown to the operator
    Manual,
    /// No task in the check file
    Skipped,
    /// Could not be executed
    Error,
}

impl CheckStatus {
    /// Whether this status fails the run.
    pub fn is_failure(self) -> bool {
        matches!(self, CheckStatus::Failed | CheckStatus::Error)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CheckStatus::Passed => "PASSED",
            CheckStatus::Failed => "FAILED",
            CheckStatus::Completed => "COMPLETED",
            CheckStatus::Manual => "MANUAL",
            CheckStatus::Skipped => "SKIPPED",
            CheckStatus::Error => "ERROR",
        })
    }
}

/// Result of running one check in one context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check file the result belongs to
    pub check: PathBuf,

    /// Summary from the check file
    pub summary: Option<String>,

    /// Task kind, when the task could be interpreted
    pub kind: Option<TaskKind>,

    /// Target of the context
    pub target: Option<String>,

    /// Outcome
    pub status: CheckStatus,

    /// Captured output (command output, response body, or notes)
    pub output: String,

    /// Exit code of a command
    pub exit_code: Option<i32>,

    /// Status code of a web request
    pub http_status: Option<u16>,

    /// Named groups captured by `expect`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub captures: BTreeMap<String, String>,

    /// Error message when status is `Error`
    pub error: Option<String>,

    /// Wall-clock duration
    #[serde(with = "duration_ms")]
    pub duration: std::time::Duration,
}

impl CheckResult {
    /// Start a result for a check; fields are filled in by the engine.
    pub fn new(check: impl Into<PathBuf>, status: CheckStatus) -> Self {
        Self {
            check: check.into(),
            summary: None,
            kind: None,
            target: None,
            status,
            output: String::new(),
            exit_code: None,
            http_status: None,
            captures: BTreeMap::new(),
            error: None,
            duration: std::time::Duration::ZERO,
        }
    }

    /// Result for a check that could not be executed.
    pub fn error(check: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        let mut result = Self::new(check, CheckStatus::Error);
        result.error = Some(error.into());
        result
    }
}

/// Counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// All results
    pub total: usize,
    /// Expectation met
    pub passed: usize,
    /// Expectation not met
    pub failed: usize,
    /// Ran without an expectation
    pub completed: usize,
    /// Notes shown to the operator
    pub manual: usize,
    /// No task
    pub skipped: usize,
    /// Could not run
    pub errors: usize,
}

/// Report of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub id: RunId,

    /// When the run started
    pub started_at: Time,

    /// When the run finished
    pub finished_at: Option<Time>,

    /// All results, in execution order
    pub results: Vec<CheckResult>,
}

impl RunReport {
    /// Start a new report.
    pub fn new() -> Self {
        Self {
            id: RunId::new(),
            started_at: chrono::Utc::now(),
            finished_at: None,
            results: Vec::new(),
        }
    }

    /// Mark the report finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(chrono::Utc::now());
    }

    /// Count results per status.
    pub fn counts(&self) -> RunCounts {
        self.results.iter().fold(
            RunCounts {
                total: self.results.len(),
                ..Default::default()
            },
            |mut acc, r| {
                match r.status {
                    CheckStatus::Passed => acc.passed += 1,
                    CheckStatus::Failed => acc.failed += 1,
                    CheckStatus::Completed => acc.completed += 1,
                    CheckStatus::Manual => acc.manual += 1,
                    CheckStatus::Skipped => acc.skipped += 1,
                    CheckStatus::Error => acc.errors += 1,
                }
                acc
            },
        )
    }

    /// False when any check failed or errored.
    pub fn succeeded(&self) -> bool {
        !self.results.iter().any(|r| r.status.is_failure())
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
