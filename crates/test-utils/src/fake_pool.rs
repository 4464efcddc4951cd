use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobdag::exec::{ExecutionPool, JobFailed, OnComplete, OnFailure, Submission};

struct PendingSubmission {
    rule: String,
    on_complete: OnComplete,
    on_failure: OnFailure,
}

/// A pool that never runs anything by itself.
///
/// Submissions are parked until the test calls [`ManualPool::complete`] or
/// [`ManualPool::fail`], which lets tests choose the exact order in which
/// jobs finish.
#[derive(Default)]
pub struct ManualPool {
    pending: Mutex<Vec<PendingSubmission>>,
    submitted: Mutex<Vec<String>>,
}

impl ManualPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Rule names in submission order, including finished ones.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    /// Rule names of parked submissions.
    pub fn pending(&self) -> Vec<String> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.rule.clone())
            .collect()
    }

    fn take(&self, rule: &str) -> Option<PendingSubmission> {
        let mut pending = self.pending.lock().unwrap();
        let idx = pending.iter().position(|p| p.rule == rule)?;
        Some(pending.remove(idx))
    }

    /// Report success for the oldest parked submission of `rule`.
    ///
    /// The callback runs on the calling thread, outside any pool lock.
    pub fn complete(&self, rule: &str) -> bool {
        match self.take(rule) {
            Some(p) => {
                (p.on_complete)(Duration::from_millis(1));
                true
            }
            None => false,
        }
    }

    /// Report failure for the oldest parked submission of `rule`.
    pub fn fail(&self, rule: &str) -> bool {
        match self.take(rule) {
            Some(p) => {
                (p.on_failure)(JobFailed);
                true
            }
            None => false,
        }
    }
}

impl ExecutionPool for ManualPool {
    fn submit(&self, submission: Submission, on_complete: OnComplete, on_failure: OnFailure) {
        self.submitted.lock().unwrap().push(submission.rule.clone());
        self.pending.lock().unwrap().push(PendingSubmission {
            rule: submission.rule,
            on_complete,
            on_failure,
        });
    }

    fn wait_idle(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// A pool that finishes every submission synchronously inside `submit`,
/// without running the action. Rules listed in `failing` fail instead.
#[derive(Default)]
pub struct InstantPool {
    executed: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl InstantPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing<I, S>(rules: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            executed: Mutex::new(Vec::new()),
            failing: rules.into_iter().map(Into::into).collect(),
        })
    }

    /// Rule names in the order they were submitted.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl ExecutionPool for InstantPool {
    fn submit(&self, submission: Submission, on_complete: OnComplete, on_failure: OnFailure) {
        self.executed.lock().unwrap().push(submission.rule.clone());
        if self.failing.contains(&submission.rule) {
            on_failure(JobFailed);
        } else {
            on_complete(Duration::ZERO);
        }
    }

    fn wait_idle(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}
