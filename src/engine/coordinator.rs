// src/engine/coordinator.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::diagnostics::RowMap;
use crate::exec::{ExecutionPool, TokioPool};

use super::progress::ProgressCounter;
use super::{RuleRuntime, RuntimeEvent};

/// Shared context of one workflow run.
///
/// Owns the execution pool, the progress counter and the abort switch. Jobs
/// hold an `Arc<Coordinator>` and call back into it from whatever thread the
/// pool runs their callbacks on, so every method takes `&self`.
pub struct Coordinator {
    pool: Arc<dyn ExecutionPool>,
    progress: ProgressCounter,
    aborted: AtomicBool,
    failed: AtomicUsize,
    rowmap: Arc<RowMap>,
    default_dry_run: bool,
    runtimes: Mutex<BTreeMap<String, RuleRuntime>>,
    pub(super) events: mpsc::UnboundedSender<RuntimeEvent>,
    pub(super) event_rx: Mutex<Option<mpsc::UnboundedReceiver<RuntimeEvent>>>,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("progress", &self.progress)
            .field("aborted", &self.is_aborted())
            .field("default_dry_run", &self.default_dry_run)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// `total_jobs` is the number of jobs that will really execute; it is
    /// only used for progress rendering.
    pub fn new(pool: Arc<dyn ExecutionPool>, total_jobs: usize) -> Self {
        let (events, event_rx) = mpsc::unbounded_channel();
        Self {
            pool,
            progress: ProgressCounter::new(total_jobs),
            aborted: AtomicBool::new(false),
            failed: AtomicUsize::new(0),
            rowmap: Arc::new(RowMap::default()),
            default_dry_run: false,
            runtimes: Mutex::new(BTreeMap::new()),
            events,
            event_rx: Mutex::new(Some(event_rx)),
        }
    }

    /// Build a coordinator with a [`TokioPool`] sized from `[engine].cores`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_config(cfg: &EngineConfig, total_jobs: usize) -> Self {
        let pool = TokioPool::new(cfg.cores);
        Self::new(Arc::new(pool), total_jobs).with_default_dry_run(cfg.dry_run)
    }

    pub fn with_rowmap(mut self, rowmap: RowMap) -> Self {
        self.rowmap = Arc::new(rowmap);
        self
    }

    pub fn with_default_dry_run(mut self, dry_run: bool) -> Self {
        self.default_dry_run = dry_run;
        self
    }

    pub fn pool(&self) -> &Arc<dyn ExecutionPool> {
        &self.pool
    }

    pub fn rowmap(&self) -> &Arc<RowMap> {
        &self.rowmap
    }

    pub fn default_dry_run(&self) -> bool {
        self.default_dry_run
    }

    pub fn progress(&self) -> &ProgressCounter {
        &self.progress
    }

    /// Advance the progress counter and log the new state.
    pub(crate) fn job_completed(&self) {
        self.progress.advance();
        info!(
            progress = %self.progress,
            percent = self.progress.percent(),
            "job finished"
        );
    }

    /// Record how long a rule's action took.
    pub fn report_runtime(&self, rule: &str, elapsed: Duration) {
        debug!(rule, ?elapsed, "action runtime");
        self.lock_runtimes()
            .entry(rule.to_string())
            .or_default()
            .record(elapsed);
    }

    pub fn runtimes(&self) -> BTreeMap<String, RuleRuntime> {
        self.lock_runtimes().clone()
    }

    /// Put the workflow into the terminal abort state.
    ///
    /// Safe to call from pool callbacks and more than once. After this,
    /// jobs refuse to submit further work and the pool drops submissions
    /// that have not started yet.
    pub fn set_abort(&self) {
        let failed = self.failed.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.aborted.swap(true, Ordering::AcqRel) {
            error!("job failed; aborting workflow, no further jobs will be scheduled");
            self.pool.close();
            let _ = self.events.send(RuntimeEvent::Aborted);
        } else {
            debug!(failed, "additional job failure after abort");
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub fn failed_jobs(&self) -> usize {
        self.failed.load(Ordering::Acquire)
    }

    fn lock_runtimes(&self) -> MutexGuard<'_, BTreeMap<String, RuleRuntime>> {
        self.runtimes.lock().unwrap_or_else(|e| e.into_inner())
    }
}
