//! Built-in tools and the name-based registry.

use super::r#trait::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Runs a script through a POSIX shell (`<shell> -c <script>`).
///
/// All `args` are joined with `"; "` into a single script. stderr is folded
/// into stdout so the output reads in the order it was written.
pub struct ShellTool {
    shell: String,
}

impl ShellTool {
    /// Name the tool is registered under.
    pub const NAME: &'static str = "shell";

    /// Use the given shell binary.
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn script(input: &ToolInput) -> String {
        format!("exec 2>&1\n{}", input.args.join("; "))
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let spawn_err = |source| ToolError::Spawn {
            program: self.shell.clone(),
            source,
        };

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(Self::script(input))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        let wait = child.wait_with_output();
        let output = match input.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| ToolError::Timeout(limit))?,
            None => wait.await,
        }
        .map_err(spawn_err)?;

        Ok(ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        })
    }
}

/// Registry of tools, executed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute_tool(&self, tool: &str, input: ToolInput) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(tool)
            .ok_or_else(|| ToolError::UnknownTool(tool.to_string()))?;
        tracing::trace!("Executing tool {} with {} args", tool.name(), input.args.len());
        tool.execute(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shell_joins_args() {
        let tool = ShellTool::default();
        let out = tool
            .execute(&ToolInput::with_args(["echo one", "echo two"]))
            .await
            .unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_shell_merges_stderr() {
        let tool = ShellTool::default();
        let out = tool
            .execute(&ToolInput::with_args(["echo out; echo err >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_shell_stdin_is_closed() {
        let tool = ShellTool::default();
        let input = ToolInput::with_args(["cat; echo done"]).timeout(Duration::from_secs(5));
        let out = tool.execute(&input).await.unwrap();
        assert_eq!(out.stdout, "done\n");
    }

    #[tokio::test]
    async fn test_shell_timeout() {
        let tool = ShellTool::default();
        let input = ToolInput::with_args(["sleep 5"]).timeout(Duration::from_millis(100));
        let err = tool.execute(&input).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_shell_binary() {
        let tool = ShellTool::new("/nonexistent/shell");
        let err = tool.execute(&ToolInput::with_args(["true"])).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let registry = ToolRegistry::new().with(Arc::new(ShellTool::default()));

        let out = registry
            .execute_tool("shell", ToolInput::with_args(["echo ok"]))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "ok");

        let err = registry
            .execute_tool("powershell", ToolInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown tool: powershell");
    }
}
