//! Errors raised while interpreting check and input documents.

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building the data model.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// YAML could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Top-level document is not a mapping
    #[error("expected a mapping at the top level, found {0}")]
    NotAMapping(&'static str),

    /// Task has no `task_type`/`type` key
    #[error("task has no type")]
    MissingTaskType,

    /// Task type is not one we know how to execute
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    /// `cmd` task without any commands
    #[error("no cmds provided")]
    NoCommands,

    /// `notes` task without any notes
    #[error("no notes provided")]
    NoNotes,

    /// `web_request` task without a URL
    #[error("no url provided")]
    NoUrl,

    /// `expect_status` on a task that makes no HTTP request
    #[error("expect_status applies to web_request tasks only, not {0}")]
    StatusWithoutRequest(String),

    /// `expect` is not a valid regex
    #[error("invalid expect pattern '{pattern}': {source}")]
    InvalidExpect {
        /// Pattern as written
        pattern: String,
        /// Underlying regex error
        source: regex::Error,
    },
}
