//! Check execution engine.

use async_trait::async_trait;
use iacheck_core::{CheckResult, CheckStatus, Settings, Task, TaskAction};
use iacheck_tools::{
    HttpMethod, HttpRequest, HttpRequester, ReqwestRequester, ShellTool, ToolExecutor,
    ToolInput, ToolRegistry,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::Result;
use crate::loader::LoadedCheck;
use crate::template::{substitute, substitute_all};

/// Default `User-Agent` for web requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/106.0.0.0 Safari/537.36";

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Shell binary for `cmd` tasks
    pub shell: String,

    /// Timeout applied when a task sets none
    pub default_timeout: Duration,

    /// `User-Agent` for web requests
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            default_timeout: Duration::from_secs(300),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Check engine.
#[async_trait]
pub trait CheckEngine: Send + Sync {
    /// Run a single check in one context.
    async fn run_check(&self, check: &LoadedCheck, context: &Settings) -> CheckResult;

    /// Run checks one after another.
    async fn run_checks(&self, checks: &[LoadedCheck], context: &Settings) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(checks.len());
        for check in checks {
            results.push(self.run_check(check, context).await);
        }
        results
    }
}

/// What a task produced, before judging it.
#[derive(Debug, Default)]
struct Execution {
    output: String,
    exit_code: Option<i32>,
    http_status: Option<u16>,
}

/// Basic check engine backed by a tool executor and an HTTP requester.
pub struct BasicCheckEngine {
    tool_executor: Arc<dyn ToolExecutor>,
    http: Arc<dyn HttpRequester>,
    config: EngineConfig,
}

impl BasicCheckEngine {
    /// Create an engine with the shell tool and a reqwest client.
    pub fn new(config: EngineConfig) -> Self {
        let registry = ToolRegistry::new().with(Arc::new(ShellTool::new(config.shell.clone())));
        Self::with_tools(Arc::new(registry), Arc::new(ReqwestRequester::new()), config)
    }

    /// Create an engine with custom tools.
    pub fn with_tools(
        tool_executor: Arc<dyn ToolExecutor>,
        http: Arc<dyn HttpRequester>,
        config: EngineConfig,
    ) -> Self {
        Self {
            tool_executor,
            http,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn execute(&self, task: &Task, context: &Settings) -> Result<Execution> {
        let timeout = task.timeout.unwrap_or(self.config.default_timeout);

        match &task.action {
            TaskAction::Cmd { cmds } => self.run_cmd(cmds, context, timeout).await,
            TaskAction::Notes { notes } => Ok(Execution {
                output: substitute_all(notes, context)?.join("\n"),
                ..Default::default()
            }),
            TaskAction::WebRequest {
                url,
                data,
                headers,
                user_agent,
            } => {
                self.run_web_request(url, data, headers, user_agent.as_deref(), context, timeout)
                    .await
            }
        }
    }

    async fn run_cmd(&self, cmds: &[String], context: &Settings, timeout: Duration) -> Result<Execution> {
        let cmds = substitute_all(cmds, context)?;
        debug!("Executing command: {}", cmds.join("; "));

        let output = self
            .tool_executor
            .execute_tool(ShellTool::NAME, ToolInput::with_args(cmds).timeout(timeout))
            .await?;

        Ok(Execution {
            output: output.stdout.trim().to_string(),
            exit_code: Some(output.exit_code),
            http_status: None,
        })
    }

    async fn run_web_request(
        &self,
        url: &str,
        data: &BTreeMap<String, String>,
        headers: &BTreeMap<String, String>,
        user_agent: Option<&str>,
        context: &Settings,
        timeout: Duration,
    ) -> Result<Execution> {
        let url = substitute(url, context)?;

        let mut request_headers = BTreeMap::new();
        let user_agent = match user_agent {
            Some(ua) => substitute(ua, context)?,
            None => self.config.user_agent.clone(),
        };
        request_headers.insert("User-Agent".to_string(), user_agent);
        for (k, v) in headers {
            let k = substitute(k, context)?;
            if k.eq_ignore_ascii_case("user-agent") {
                request_headers.remove("User-Agent");
            }
            request_headers.insert(k, substitute(v, context)?);
        }

        let mut form = BTreeMap::new();
        for (k, v) in data {
            form.insert(substitute(k, context)?, substitute(v, context)?);
        }

        let method = if form.is_empty() {
            HttpMethod::Get
        } else {
            HttpMethod::Post
        };
        debug!("Making {} request to URL: {}", method, url);

        let response = self
            .http
            .send(HttpRequest {
                method,
                url,
                headers: request_headers,
                form,
                timeout: Some(timeout),
            })
            .await?;

        Ok(Execution {
            output: response.body,
            exit_code: None,
            http_status: Some(response.status),
        })
    }
}

#[async_trait]
impl CheckEngine for BasicCheckEngine {
    async fn run_check(&self, check: &LoadedCheck, context: &Settings) -> CheckResult {
        let start = Instant::now();
        let definition = &check.definition;

        debug!("Executing check from file: {}", check.path.display());
        if let Some(summary) = &definition.summary {
            debug!("Summary: {}", summary);
        }
        if let Some(description) = &definition.description {
            debug!("Description: {}", description);
        }

        let mut result = CheckResult::new(check.path.clone(), CheckStatus::Skipped);
        result.summary = definition.summary.clone();
        result.target = context.target().map(str::to_string);

        let Some(spec) = &definition.task else {
            return result;
        };

        let task = match spec.clone().into_task() {
            Ok(t) => t,
            Err(e) => {
                result.status = CheckStatus::Error;
                result.error = Some(e.to_string());
                result.duration = start.elapsed();
                return result;
            }
        };
        result.kind = Some(task.kind());

        match self.execute(&task, context).await {
            Ok(execution) => {
                result.status = match task.action {
                    TaskAction::Notes { .. } => CheckStatus::Manual,
                    _ => {
                        let outcome = task
                            .expectation
                            .evaluate(&execution.output, execution.http_status);
                        result.captures = outcome.captures;
                        match outcome.passed {
                            Some(true) => CheckStatus::Passed,
                            Some(false) => CheckStatus::Failed,
                            None => CheckStatus::Completed,
                        }
                    }
                };
                result.output = execution.output;
                result.exit_code = execution.exit_code;
                result.http_status = execution.http_status;
            }
            Err(e) => {
                result.status = CheckStatus::Error;
                result.error = Some(e.to_string());
            }
        }

        result.duration = start.elapsed();
        debug!("Check {} finished: {}", check.path.display(), result.status);
        result
    }
}
