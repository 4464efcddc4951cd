// src/exec/error.rs

//! Two-stage error model for job execution.
//!
//! [`ExecutionError`] is the detailed, job-local error. It is reported and
//! rolled back inside the output guard and never leaves it. What crosses the
//! pool boundary is [`JobFailed`], which carries nothing.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("rule {rule}: could not create output directory {path:?}: {cause:#}")]
    OutputDirectory {
        rule: String,
        path: PathBuf,
        cause: anyhow::Error,
    },

    #[error("rule {rule}: action failed: {cause:#}")]
    ActionFailure { rule: String, cause: anyhow::Error },

    #[error("rule {rule}: output file {path:?} was not produced")]
    MissingOutput { rule: String, path: PathBuf },

    #[error("rule {rule}: could not write-protect {path:?}: {cause:#}")]
    ProtectionFailure {
        rule: String,
        path: PathBuf,
        cause: anyhow::Error,
    },
}

impl ExecutionError {
    pub fn rule(&self) -> &str {
        match self {
            ExecutionError::OutputDirectory { rule, .. }
            | ExecutionError::ActionFailure { rule, .. }
            | ExecutionError::MissingOutput { rule, .. }
            | ExecutionError::ProtectionFailure { rule, .. } => rule,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ExecutionError::OutputDirectory { path, .. }
            | ExecutionError::MissingOutput { path, .. }
            | ExecutionError::ProtectionFailure { path, .. } => Some(path),
            ExecutionError::ActionFailure { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::OutputDirectory { .. } => "output_directory",
            ExecutionError::ActionFailure { .. } => "action_failure",
            ExecutionError::MissingOutput { .. } => "missing_output",
            ExecutionError::ProtectionFailure { .. } => "protection_failure",
        }
    }
}

/// Opaque failure signal handed to the pool's failure callback.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("job failed")]
pub struct JobFailed;
