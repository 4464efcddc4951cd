// src/engine/mod.rs

//! Orchestration engine for jobdag.
//!
//! This module ties together:
//! - the [`Coordinator`], which owns the execution pool, the progress
//!   counter and the abort switch
//! - the run driver in [`runtime`], which kicks off the requested targets
//!   and waits until they finish or the workflow aborts

use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::JobId;

pub mod coordinator;
pub mod progress;
pub mod runtime;

pub use coordinator::Coordinator;
pub use progress::ProgressCounter;

/// Events flowing from job callbacks into the run driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A requested target reached its finished state.
    TargetFinished(JobId),
    /// The abort switch was set.
    Aborted,
}

/// Aggregated action runtimes of one rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleRuntime {
    pub count: usize,
    pub total: Duration,
    pub max: Duration,
}

impl RuleRuntime {
    pub fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total / n,
        }
    }
}

/// Outcome of a successful [`Coordinator::run`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Jobs that really executed.
    pub completed: usize,
    pub total: usize,
    pub runtimes: BTreeMap<String, RuleRuntime>,
}
