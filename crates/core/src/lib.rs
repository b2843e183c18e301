//! iacheck core data models.
//!
//! Check definitions, tasks, settings, and the results of running them.

#![warn(missing_docs)]

mod id;
mod error;

mod check;
mod settings;
mod result;

pub use id::*;
pub use error::{CoreError, Result};

pub use check::{
    CheckDefinition, TaskSpec, Task, TaskAction, TaskKind,
    Expectation, ExpectationOutcome,
};
pub use settings::{Settings, prepare_contexts, render_value, TARGET_KEY};
pub use result::{CheckResult, CheckStatus, RunCounts, RunReport};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
