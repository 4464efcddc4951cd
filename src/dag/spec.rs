// src/dag/spec.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::rule::Rule;
use crate::types::{OutputPath, Wildcards};

use super::Job;

/// Everything needed to construct a [`Job`].
///
/// Defaults: no inputs, outputs or dependencies, `needs_execution = true`,
/// and the coordinator's default dry-run flag.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub rule: Arc<dyn Rule>,
    pub message: Option<String>,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<OutputPath>,
    pub wildcards: Wildcards,
    pub depends: Vec<Arc<Job>>,
    pub dry_run: Option<bool>,
    pub needs_execution: bool,
}

impl JobSpec {
    pub fn new(rule: Arc<dyn Rule>) -> Self {
        Self {
            rule,
            message: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            wildcards: Wildcards::new(),
            depends: Vec::new(),
            dry_run: None,
            needs_execution: true,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn output(mut self, output: impl Into<OutputPath>) -> Self {
        self.outputs.push(output.into());
        self
    }

    pub fn protected_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(OutputPath::protected(path));
        self
    }

    pub fn wildcard(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.wildcards.insert(name.into(), value.into());
        self
    }

    pub fn depends_on(mut self, job: &Arc<Job>) -> Self {
        self.depends.push(Arc::clone(job));
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    pub fn needs_execution(mut self, needs_execution: bool) -> Self {
        self.needs_execution = needs_execution;
        self
    }
}
