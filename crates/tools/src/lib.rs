//! Tool Integration
//!
//! Run shell commands and HTTP requests on behalf of checks.

#![warn(missing_docs)]

pub mod r#trait;
pub mod builtin;
pub mod http;

pub use r#trait::{
    Tool, ToolExecutor, ToolInput, ToolOutput, ToolError, Result,
    HttpMethod, HttpRequest, HttpResponse, HttpRequester,
};
pub use builtin::{ShellTool, ToolRegistry};
pub use http::ReqwestRequester;
