//! Tool abstraction.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Error type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors that can occur while running a tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Process could not be started or awaited
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Program that was started
        program: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Tool did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// No tool registered under the name
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A tool that can be executed.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool name.
    fn name(&self) -> &str;

    /// Execute the tool.
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool executor - runs tools by name.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name.
    async fn execute_tool(&self, tool: &str, input: ToolInput) -> Result<ToolOutput>;
}

/// Input to a tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInput {
    /// Command arguments
    pub args: Vec<String>,

    /// Timeout
    pub timeout: Option<Duration>,
}

impl ToolInput {
    /// Input with the given arguments and nothing else.
    pub fn with_args(args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Output from a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Exit code, -1 when killed by a signal
    pub exit_code: i32,

    /// Standard output
    pub stdout: String,
}

/// HTTP method used by [`HttpRequester`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST with a url-encoded form
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        })
    }
}

/// An HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method
    pub method: HttpMethod,

    /// Absolute URL
    pub url: String,

    /// Request headers
    pub headers: BTreeMap<String, String>,

    /// Form fields, sent url-encoded on POST
    pub form: BTreeMap<String, String>,

    /// Timeout
    pub timeout: Option<Duration>,
}

/// An HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,

    /// Body as text
    pub body: String,
}

/// Sends HTTP requests.
#[async_trait]
pub trait HttpRequester: Send + Sync {
    /// Send a request and read the whole body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
