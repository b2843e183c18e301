//! Engine errors.

use std::path::PathBuf;

use iacheck_core::CoreError;
use iacheck_tools::ToolError;

use crate::template::TemplateError;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while loading or running checks.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Check or input document is invalid
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Placeholder could not be substituted
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Command or request failed
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Filesystem error on a specific path
    #[error("{}: {source}", path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Writing a result or the report failed
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// File being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Check filter is not a valid regex
    #[error("invalid check filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    /// Inputs referenced by checks are absent from the settings
    #[error("inputs not supplied in settings: {}", .0.join(", "))]
    MissingInputs(Vec<String>),

    /// Writing to the console failed
    #[error("console output failed: {0}")]
    Console(#[source] std::io::Error),

    /// Refusing to wipe a path such as `/` or `.`
    #[error("refusing to use {} as output folder", .0.display())]
    UnsafeOutfolder(PathBuf),
}

impl EngineError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a write error with the file it concerns.
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}
