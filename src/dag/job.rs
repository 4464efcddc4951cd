// src/dag/job.rs

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::Coordinator;
use crate::exec::{JobFailed, OnComplete, OnFailure, Submission};
use crate::rule::{ActionArgs, Rule};
use crate::types::{JobId, OutputPath, Wildcards};

use super::JobSpec;

/// Callback invoked once with the id of the job that finished.
pub type Subscriber = Box<dyn FnOnce(JobId) + Send + 'static>;

/// Public, read-only view of where a job is in its lifecycle.
///
/// There is no failed state: a failed job simply never becomes `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Constructed, `run` not called yet.
    Created,
    /// `run` was called and the job has no unfinished dependencies, but it
    /// has not been handed to the pool (yet, or ever after an abort).
    Queued,
    /// Waiting for at least one dependency to finish.
    WaitingOnDeps,
    /// Handed to the execution pool.
    Submitted,
    /// Finished; subscribers have been or are being notified.
    Finished,
}

/// Mutable per-job state, guarded by the job's mutex.
struct JobState {
    status: JobStatus,
    /// Dependencies that have not reported completion yet. Only shrinks.
    pending: HashSet<JobId>,
    /// Drained exactly once, when the job finishes. Anything subscribing
    /// after that is called back immediately instead of being queued.
    subscribers: Vec<Subscriber>,
}

/// One node of the job DAG.
///
/// A job waits for every job in its dependency set (fan-in), then either
/// submits its action to the coordinator's pool or, if there is nothing to
/// execute, finishes right away. Finishing notifies all subscribers
/// (fan-out). Completion and failure callbacks may arrive concurrently from
/// pool workers, so all shared state is behind a per-job lock and the
/// single-fire transition is an atomic compare-and-set.
pub struct Job {
    id: JobId,
    coordinator: Arc<Coordinator>,
    rule: Arc<dyn Rule>,
    message: String,
    inputs: Vec<PathBuf>,
    outputs: Vec<OutputPath>,
    wildcards: Wildcards,
    depends: Vec<Arc<Job>>,
    dry_run: bool,
    needs_execution: bool,
    queued: AtomicBool,
    state: Mutex<JobState>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("rule", &self.rule.name())
            .field("outputs", &self.outputs)
            .field("depends", &self.depends.iter().map(|d| d.id).collect::<Vec<_>>())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Job {
    pub fn new(coordinator: Arc<Coordinator>, spec: JobSpec) -> Arc<Job> {
        let JobSpec {
            rule,
            message,
            inputs,
            outputs,
            wildcards,
            mut depends,
            dry_run,
            needs_execution,
        } = spec;

        let mut seen = HashSet::new();
        depends.retain(|dep| seen.insert(dep.id));

        let message = message.unwrap_or_else(|| describe(rule.name(), &outputs));
        let dry_run = dry_run.unwrap_or_else(|| coordinator.default_dry_run());

        Arc::new(Job {
            id: JobId::next(),
            coordinator,
            rule,
            message,
            inputs,
            outputs,
            wildcards,
            depends,
            dry_run,
            needs_execution,
            queued: AtomicBool::new(false),
            state: Mutex::new(JobState {
                status: JobStatus::Created,
                pending: seen,
                subscribers: Vec::new(),
            }),
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn rule(&self) -> &Arc<dyn Rule> {
        &self.rule
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPath] {
        &self.outputs
    }

    pub fn wildcards(&self) -> &Wildcards {
        &self.wildcards
    }

    pub fn depends(&self) -> &[Arc<Job>] {
        &self.depends
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn needs_execution(&self) -> bool {
        self.needs_execution
    }

    pub fn status(&self) -> JobStatus {
        self.lock_state().status
    }

    pub fn is_finished(&self) -> bool {
        self.status() == JobStatus::Finished
    }

    /// Number of dependencies that have not reported completion yet.
    pub fn pending_dependencies(&self) -> usize {
        self.lock_state().pending.len()
    }

    /// Request this job, optionally subscribing to its completion.
    ///
    /// If the job already finished, `on_done` is invoked immediately on the
    /// calling thread. Only the first call starts the job; later calls just
    /// subscribe.
    pub fn run(self: &Arc<Self>, on_done: Option<Subscriber>) {
        if let Some(callback) = on_done {
            if !self.subscribe(callback) {
                return;
            }
        }

        if self
            .queued
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waiting = {
            let mut state = self.lock_state();
            if state.pending.is_empty() {
                state.status = JobStatus::Queued;
                false
            } else {
                state.status = JobStatus::WaitingOnDeps;
                true
            }
        };

        if !waiting {
            self.ready();
            return;
        }

        debug!(
            job = %self.id,
            rule = %self.rule.name(),
            deps = self.depends.len(),
            "waiting on dependencies"
        );

        for dep in &self.depends {
            if !self.lock_state().pending.contains(&dep.id) {
                continue;
            }
            let waiter = Arc::downgrade(self);
            dep.run(Some(Box::new(move |dep_id| {
                if let Some(job) = waiter.upgrade() {
                    job.dependency_satisfied(dep_id);
                }
            })));
        }
    }

    /// Subscribe to completion without starting the job.
    ///
    /// Returns `false` if the job had already finished, in which case
    /// `callback` was invoked immediately on the calling thread.
    pub fn subscribe(&self, callback: Subscriber) -> bool {
        let mut state = self.lock_state();
        if state.status == JobStatus::Finished {
            drop(state);
            callback(self.id);
            return false;
        }
        state.subscribers.push(callback);
        true
    }

    fn dependency_satisfied(self: &Arc<Self>, dep: JobId) {
        let now_ready = {
            let mut state = self.lock_state();
            state.pending.remove(&dep) && state.pending.is_empty()
        };

        if now_ready {
            self.lock_state().status = JobStatus::Queued;
            debug!(job = %self.id, rule = %self.rule.name(), "dependencies satisfied");
            self.ready();
        }
    }

    /// All dependencies are done: execute, or finish without executing.
    fn ready(self: &Arc<Self>) {
        let action = match self.rule.action() {
            Some(action) if self.rule.is_actionable() && self.needs_execution => action,
            _ => {
                debug!(job = %self.id, rule = %self.rule.name(), "nothing to execute; passing through");
                self.finish();
                return;
            }
        };

        if self.dry_run {
            println!("{}", self.message);
            self.finish();
            return;
        }

        if self.coordinator.is_aborted() {
            debug!(job = %self.id, rule = %self.rule.name(), "workflow aborted; not submitting");
            return;
        }

        self.lock_state().status = JobStatus::Submitted;

        let submission = Submission {
            rule: self.rule.name().to_string(),
            lineno: self.rule.lineno(),
            message: self.message.clone(),
            action,
            args: ActionArgs {
                inputs: self.inputs.clone(),
                outputs: self.outputs.clone(),
                wildcards: self.wildcards.clone(),
            },
            rowmap: Arc::clone(self.coordinator.rowmap()),
        };

        let on_complete: OnComplete = {
            let job = Arc::clone(self);
            Box::new(move |elapsed| job.complete(elapsed))
        };
        let on_failure: OnFailure = {
            let job = Arc::clone(self);
            Box::new(move |failed| job.fail(failed))
        };

        info!(job = %self.id, rule = %self.rule.name(), "submitting job");
        self.coordinator.pool().submit(submission, on_complete, on_failure);
    }

    fn complete(&self, elapsed: Duration) {
        self.coordinator.job_completed();
        self.coordinator.report_runtime(self.rule.name(), elapsed);
        self.finish();
    }

    /// The failure was already reported by the output guard. Dependents are
    /// deliberately left waiting forever.
    fn fail(&self, _failed: JobFailed) {
        warn!(
            job = %self.id,
            rule = %self.rule.name(),
            subscribers = self.lock_state().subscribers.len(),
            "job failed; dependents will not run"
        );
        self.coordinator.set_abort();
    }

    fn finish(&self) {
        let subscribers = {
            let mut state = self.lock_state();
            state.status = JobStatus::Finished;
            std::mem::take(&mut state.subscribers)
        };

        debug!(
            job = %self.id,
            rule = %self.rule.name(),
            subscribers = subscribers.len(),
            "job finished; notifying subscribers"
        );

        for callback in subscribers {
            callback(self.id);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn describe(rule: &str, outputs: &[OutputPath]) -> String {
    if outputs.is_empty() {
        return format!("rule {rule}");
    }
    let outputs: Vec<String> = outputs.iter().map(|o| o.to_string()).collect();
    format!("rule {rule}: {}", outputs.join(", "))
}
