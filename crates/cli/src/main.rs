//! iacheck CLI - run YAML-defined infrastructure checks.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use iacheck_engine::{
    BasicCheckEngine, Console, EngineConfig, EngineError, RunConfig, Runner, DEFAULT_USER_AGENT,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "iacheck", version)]
#[command(about = "Parse YAML checks files and execute their tasks", long_about = None)]
struct Cli {
    /// YAML check files to run: files separated by ',' or directories
    #[arg(short = 'c', long = "checks-files")]
    checks_files: String,

    /// YAML input file holding a mapping of settings
    #[arg(short = 'i', long = "input-file")]
    input_file: PathBuf,

    /// Regex selecting which check files to parse and execute
    #[arg(short = 'r', long, default_value = ".*")]
    regex: String,

    /// Output folder (wiped at start)
    #[arg(short = 'o', long, default_value = "outfolder")]
    outfolder: PathBuf,

    /// Targets, comma-separated; each is exposed to checks as {target}
    #[arg(short = 't', long, default_value = "")]
    targets: String,

    /// Shell used for cmd tasks
    #[arg(long, default_value = "sh")]
    shell: String,

    /// Default task timeout in seconds
    #[arg(long, default_value = "300")]
    timeout: u64,

    /// User-Agent for web requests
    #[arg(long, default_value = DEFAULT_USER_AGENT, hide_default_value = true)]
    user_agent: String,

    /// Only print the inputs the selected checks require
    #[arg(long)]
    list_inputs: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            checks_files: self.checks_files.clone(),
            input_file: self.input_file.clone(),
            filter: self.regex.clone(),
            outfolder: self.outfolder.clone(),
            targets: split_targets(&self.targets),
            engine: EngineConfig {
                shell: self.shell.clone(),
                default_timeout: Duration::from_secs(self.timeout),
                user_agent: self.user_agent.clone(),
            },
        }
    }
}

fn split_targets(targets: &str) -> Vec<String> {
    targets
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    debug!("{:?}", cli);
    let config = cli.run_config();

    let engine = Arc::new(BasicCheckEngine::new(config.engine.clone()));
    let mut runner = Runner::new(engine, Console::stdout());

    if cli.list_inputs {
        let set = match runner.discover(&config) {
            Ok(set) => set,
            Err(e) => {
                error!("{}", e);
                return Ok(ExitCode::from(exit_code_for(&e)));
            }
        };
        for input in &set.inputs {
            println!("{}", input);
        }
        return Ok(ExitCode::SUCCESS);
    }

    match runner.run(&config).await {
        Ok(report) if report.succeeded() => Ok(ExitCode::SUCCESS),
        Ok(_) => Ok(ExitCode::from(1)),
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::from(exit_code_for(&e)))
        }
    }
}

/// 2 for problems with the invocation or its inputs, 1 for everything else,
/// including output that could not be written once checks ran.
fn exit_code_for(error: &EngineError) -> u8 {
    match error {
        EngineError::MissingInputs(_)
        | EngineError::InvalidFilter(_)
        | EngineError::UnsafeOutfolder(_)
        | EngineError::Core(_)
        | EngineError::Io { .. } => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_readme_invocation() {
        let cli = Cli::try_parse_from(["iacheck", "-c", "/checks", "-i", "/inputs", "-r", "check"]).unwrap();
        assert_eq!(cli.checks_files, "/checks");
        assert_eq!(cli.input_file, PathBuf::from("/inputs"));
        assert_eq!(cli.regex, "check");
        assert_eq!(cli.outfolder, PathBuf::from("outfolder"));
        assert!(!cli.list_inputs);

        let config = cli.run_config();
        assert!(config.targets.is_empty());
        assert_eq!(config.engine.default_timeout, Duration::from_secs(300));
        assert_eq!(config.engine.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_required_flags() {
        assert!(Cli::try_parse_from(["iacheck", "-c", "/checks"]).is_err());
        assert!(Cli::try_parse_from(["iacheck", "-i", "/inputs"]).is_err());
    }

    #[test]
    fn test_targets_and_overrides() {
        let cli = Cli::try_parse_from([
            "iacheck", "-c", "a.yaml,b.yaml", "-i", "in.yaml", "-t", "h1, h2,,", "-o", "out",
            "--shell", "bash", "--timeout", "10", "-v",
        ])
        .unwrap();
        let config = cli.run_config();
        assert_eq!(config.targets, vec!["h1", "h2"]);
        assert_eq!(config.outfolder, PathBuf::from("out"));
        assert_eq!(config.engine.shell, "bash");
        assert_eq!(config.engine.default_timeout, Duration::from_secs(10));
        assert!(cli.verbose);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&EngineError::MissingInputs(vec!["x".into()])), 2);
        assert_eq!(exit_code_for(&iacheck_engine::build_filter("(").unwrap_err()), 2);
        assert_eq!(
            exit_code_for(&EngineError::io("inputs.yaml", std::io::Error::other("missing"))),
            2
        );
        assert_eq!(
            exit_code_for(&EngineError::Console(std::io::Error::other("closed"))),
            1
        );
        assert_eq!(
            exit_code_for(&EngineError::output(
                "outfolder/report.json",
                std::io::Error::other("disk full")
            )),
            1
        );
    }
}
