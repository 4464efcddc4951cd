// src/lib.rs

//! Job scheduling and execution core of a file-based workflow engine.
//!
//! Given a DAG of [`dag::Job`]s, each consuming input files and producing
//! output files, the engine runs every job once all of its dependencies
//! finished, runs independent jobs in parallel on an [`exec::ExecutionPool`],
//! and guarantees that a failing job leaves no partial output behind.
//! One failure aborts the whole workflow: nothing new is scheduled after it.
//!
//! Typical wiring:
//!
//! ```no_run
//! # async fn demo() -> jobdag::errors::Result<()> {
//! use std::sync::Arc;
//! use jobdag::dag::{Job, JobSpec};
//! use jobdag::engine::Coordinator;
//! use jobdag::rule::StaticRule;
//!
//! let cfg = jobdag::bootstrap(None)?;
//! let coordinator = Arc::new(Coordinator::from_config(&cfg, 1));
//!
//! let rule = Arc::new(StaticRule::new("upper", Arc::new(cfg.shell_action("tr a-z A-Z < {input} > {output}"))));
//! let job = Job::new(coordinator.clone(), JobSpec::new(rule).input("in.txt").output("out/in.upper.txt"));
//!
//! let summary = coordinator.run(&[job]).await?;
//! println!("{}/{} jobs executed", summary.completed, summary.total);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dag;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod rule;
pub mod types;

use std::path::Path;

use tracing::debug;

use crate::config::{default_config_path, load_and_validate, EngineConfig};
use crate::errors::Result;

/// Load the engine config and initialise logging.
///
/// With `None`, `Jobdag.toml` in the current directory is used if it exists;
/// otherwise defaults apply. An explicitly given path must exist.
pub fn bootstrap(config_path: Option<&Path>) -> Result<EngineConfig> {
    let cfg = match config_path {
        Some(path) => load_and_validate(path)?,
        None => {
            let path = default_config_path();
            if path.exists() {
                load_and_validate(&path)?
            } else {
                EngineConfig::default()
            }
        }
    };

    logging::init_logging(cfg.log_level)?;
    debug!(?cfg, "engine configuration loaded");
    Ok(cfg)
}
