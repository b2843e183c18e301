//! Check execution
//!
//! Loading check files, substituting inputs, running tasks, and recording
//! the results.

#![warn(missing_docs)]

pub mod error;
pub mod template;
pub mod loader;
pub mod engine;
pub mod outfolder;
pub mod console;
pub mod runner;

pub use error::{EngineError, Result};
pub use template::{find_inputs, substitute, TemplateError};
pub use loader::{build_filter, load_checks, load_settings, missing_inputs, CheckSet, LoadedCheck, LoadError};
pub use engine::{BasicCheckEngine, CheckEngine, EngineConfig, DEFAULT_USER_AGENT};
pub use outfolder::{OutFolder, REPORT_FILE};
pub use console::Console;
pub use runner::{RunConfig, Runner};
