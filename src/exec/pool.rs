// src/exec/pool.rs

//! Pluggable execution pool abstraction.
//!
//! Jobs talk to an `ExecutionPool` instead of spawning work themselves.
//! This makes it easy to swap in a fake pool in tests while keeping the
//! production implementation in [`super::tokio_pool`].
//!
//! The contract: for every call to [`ExecutionPool::submit`], exactly one of
//! the two callbacks is invoked, exactly once, possibly on another thread and
//! possibly concurrently with callbacks of other submissions.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::diagnostics::RowMap;
use crate::rule::{ActionArgs, ExecutableAction};

use super::error::JobFailed;

/// Invoked with the action's elapsed wall-clock time.
pub type OnComplete = Box<dyn FnOnce(Duration) + Send + 'static>;

/// Invoked after the failure was diagnosed and rolled back.
pub type OnFailure = Box<dyn FnOnce(JobFailed) + Send + 'static>;

/// Everything the output guard needs to run one action.
#[derive(Clone)]
pub struct Submission {
    pub rule: String,
    pub lineno: Option<usize>,
    pub message: String,
    pub action: Arc<dyn ExecutableAction>,
    pub args: ActionArgs,
    pub rowmap: Arc<RowMap>,
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("rule", &self.rule)
            .field("message", &self.message)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Trait abstracting how submitted actions are executed.
pub trait ExecutionPool: Send + Sync {
    /// Queue `submission` for asynchronous execution. Must not block.
    fn submit(&self, submission: Submission, on_complete: OnComplete, on_failure: OnFailure);

    /// Resolves once no submission is queued or running.
    fn wait_idle(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Stop starting work. Actions already running finish normally; queued
    /// and later submissions are dropped. Called when the workflow aborts.
    fn close(&self) {}
}
