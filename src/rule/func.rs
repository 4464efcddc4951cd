// src/rule/func.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;

use super::{ActionArgs, ExecutableAction};

type ActionFn = dyn Fn(&ActionArgs) -> anyhow::Result<()> + Send + Sync;

/// Action backed by a synchronous Rust closure.
///
/// The closure runs on tokio's blocking thread pool, so it may do ordinary
/// blocking file IO.
#[derive(Clone)]
pub struct FnAction {
    label: String,
    func: Arc<ActionFn>,
}

impl FnAction {
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&ActionArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for FnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl ExecutableAction for FnAction {
    fn perform<'a>(
        &'a self,
        args: &'a ActionArgs,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        let func = Arc::clone(&self.func);
        let args = args.clone();
        let label = self.label.clone();

        Box::pin(async move {
            tokio::task::spawn_blocking(move || func(&args))
                .await
                .with_context(|| format!("action '{label}' panicked or was cancelled"))?
        })
    }
}
