//! Run orchestration: load, validate inputs, execute, record.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use iacheck_core::{prepare_contexts, CheckStatus, RunReport};
use tracing::{info, warn};

use crate::console::Console;
use crate::engine::{CheckEngine, EngineConfig};
use crate::error::{EngineError, Result};
use crate::loader::{build_filter, load_checks, load_settings, missing_inputs, CheckSet};
use crate::outfolder::OutFolder;

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Comma-separated check files and directories
    pub checks_files: String,

    /// YAML input file
    pub input_file: PathBuf,

    /// Regex selecting check files by path
    pub filter: String,

    /// Output folder, wiped at start
    pub outfolder: PathBuf,

    /// Targets; each gets its own pass over the checks
    pub targets: Vec<String>,

    /// Engine settings
    pub engine: EngineConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            checks_files: String::new(),
            input_file: PathBuf::new(),
            filter: ".*".to_string(),
            outfolder: PathBuf::from("outfolder"),
            targets: Vec::new(),
            engine: EngineConfig::default(),
        }
    }
}

/// Drives a run and prints progress to a console.
pub struct Runner<W: Write> {
    engine: Arc<dyn CheckEngine>,
    console: Console<W>,
}

impl<W: Write> Runner<W> {
    /// Create a runner.
    pub fn new(engine: Arc<dyn CheckEngine>, console: Console<W>) -> Self {
        Self { engine, console }
    }

    /// Unwrap the console.
    pub fn into_console(self) -> Console<W> {
        self.console
    }

    /// Load the selected check files and report load problems.
    pub fn discover(&mut self, config: &RunConfig) -> Result<CheckSet> {
        let filter = build_filter(&config.filter)?;
        let set = load_checks(&config.checks_files, &filter);

        for error in &set.errors {
            warn!("Failed to load {}", error);
            self.console
                .error(&format!("Error parsing file: {}", error))
                .map_err(EngineError::Console)?;
        }
        info!(
            "Loaded {} checks referencing {} inputs",
            set.checks.len(),
            set.inputs.len()
        );

        Ok(set)
    }

    /// Run all selected checks.
    ///
    /// Nothing is executed when an input is missing for any context.
    pub async fn run(&mut self, config: &RunConfig) -> Result<RunReport> {
        let mut out = OutFolder::create(&config.outfolder).await?;
        let set = self.discover(config)?;

        let settings = load_settings(&config.input_file)?;
        let contexts = prepare_contexts(&config.targets, &settings);

        let missing: BTreeSet<String> = contexts
            .iter()
            .flat_map(|ctx| missing_inputs(&set.inputs, ctx))
            .collect();
        if !missing.is_empty() {
            for name in &missing {
                self.console
                    .error(&format!("input: {} not supplied in settings", name))
                    .map_err(EngineError::Console)?;
            }
            return Err(EngineError::MissingInputs(missing.into_iter().collect()));
        }

        let mut report = RunReport::new();
        info!(
            "Run {}: {} checks x {} contexts",
            report.id,
            set.checks.len(),
            contexts.len()
        );

        let per_target = !config.targets.is_empty();
        for context in &contexts {
            for check in &set.checks {
                let result = self.engine.run_check(check, context).await;
                self.console.result(&result).map_err(EngineError::Console)?;
                if result.status != CheckStatus::Skipped {
                    let target = result.target.as_deref().filter(|_| per_target);
                    if let Err(e) = out.write_output(&result, target).await {
                        warn!("{}", e);
                        self.console
                            .error(&e.to_string())
                            .map_err(EngineError::Console)?;
                    }
                }
                report.results.push(result);
            }
        }

        report.finish();
        let report_path = out.write_report(&report).await?;
        info!("Report written to {}", report_path.display());
        self.console.summary(&report).map_err(EngineError::Console)?;

        Ok(report)
    }
}
