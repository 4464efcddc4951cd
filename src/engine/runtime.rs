// src/engine/runtime.rs

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::Job;
use crate::errors::{JobdagError, Result};
use crate::types::JobId;

use super::{Coordinator, RunSummary, RuntimeEvent};

impl Coordinator {
    /// Build `targets` and everything they depend on.
    ///
    /// Returns once every target finished, or once the abort switch fired
    /// and the pool drained. Already submitted actions are never cancelled;
    /// after an abort they run to completion before this returns.
    ///
    /// A coordinator drives a single run; a second call is an error.
    pub async fn run(self: &Arc<Self>, targets: &[Arc<Job>]) -> Result<RunSummary> {
        let mut event_rx = self
            .event_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| anyhow::anyhow!("coordinator has already driven a run"))?;

        let mut remaining: HashSet<JobId> = targets.iter().map(|job| job.id()).collect();
        info!(
            targets = remaining.len(),
            total = self.progress().total(),
            "starting workflow run"
        );

        for job in targets {
            let tx = self.events.clone();
            job.run(Some(Box::new(move |id| {
                let _ = tx.send(RuntimeEvent::TargetFinished(id));
            })));
        }

        while !remaining.is_empty() && !self.is_aborted() {
            match event_rx.recv().await {
                Some(RuntimeEvent::TargetFinished(id)) => {
                    if remaining.remove(&id) {
                        debug!(job = %id, remaining = remaining.len(), "target finished");
                    }
                }
                Some(RuntimeEvent::Aborted) => break,
                None => {
                    warn!("runtime event channel closed; exiting");
                    break;
                }
            }
        }

        debug!("waiting for in-flight actions");
        self.pool().wait_idle().await;

        if self.is_aborted() {
            return Err(JobdagError::Aborted {
                failed: self.failed_jobs(),
            });
        }

        info!(progress = %self.progress(), "workflow run finished");
        Ok(RunSummary {
            completed: self.progress().completed(),
            total: self.progress().total(),
            runtimes: self.runtimes(),
        })
    }
}
