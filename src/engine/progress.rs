// src/engine/progress.rs

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide count of completed versus total jobs.
///
/// Only real executions advance it. Skipped and dry-run jobs never do, so
/// a run that skips work finishes below `total`.
#[derive(Debug)]
pub struct ProgressCounter {
    done: AtomicUsize,
    total: usize,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one completed job and return the new completed count.
    pub fn advance(&self) -> usize {
        self.done.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.completed().saturating_mul(100) / self.total;
        pct.min(100) as u8
    }
}

impl fmt::Display for ProgressCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed(), self.total)
    }
}
