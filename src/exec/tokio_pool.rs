// src/exec/tokio_pool.rs

//! Production execution pool on top of a tokio runtime.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{Notify, Semaphore};
use tracing::debug;

use crate::fs::{FileSystem, RealFileSystem};

use super::guard::OutputGuard;
use super::pool::{ExecutionPool, OnComplete, OnFailure, Submission};

/// Runs each submission as a tokio task wrapped in an [`OutputGuard`].
///
/// At most `cores` actions run at the same time; further submissions wait
/// for a free slot. Callbacks run on the worker that executed the action.
/// Once [`ExecutionPool::close`] was called, waiting submissions are dropped.
#[derive(Debug, Clone)]
pub struct TokioPool {
    handle: Handle,
    slots: Arc<Semaphore>,
    guard: OutputGuard,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl TokioPool {
    /// Create a pool on the current tokio runtime.
    ///
    /// Panics if called outside a runtime, like `tokio::spawn`.
    pub fn new(cores: usize) -> Self {
        Self::with_fs(Handle::current(), cores, Arc::new(RealFileSystem))
    }

    pub fn with_fs(handle: Handle, cores: usize, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            handle,
            slots: Arc::new(Semaphore::new(cores.max(1))),
            guard: OutputGuard::new(fs),
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl ExecutionPool for TokioPool {
    fn submit(&self, submission: Submission, on_complete: OnComplete, on_failure: OnFailure) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);

        let slots = Arc::clone(&self.slots);
        let guard = self.guard.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let idle = Arc::clone(&self.idle);

        self.handle.spawn(async move {
            match slots.acquire_owned().await {
                // The permit is held until the callback returned, so an abort
                // raised by the callback closes the pool before the next
                // queued submission can start.
                Ok(_permit) => match guard.invoke(&submission).await {
                    Ok(elapsed) => on_complete(elapsed),
                    Err(failed) => on_failure(failed),
                },
                Err(_) => {
                    debug!(rule = %submission.rule, "pool closed; dropping queued job");
                }
            }

            if in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
                debug!("execution pool idle");
                idle.notify_waiters();
            }
        });
    }

    fn wait_idle(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            loop {
                let notified = self.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
                notified.await;
            }
        })
    }

    fn close(&self) {
        if !self.slots.is_closed() {
            debug!(queued = self.in_flight(), "closing execution pool");
            self.slots.close();
        }
    }
}
