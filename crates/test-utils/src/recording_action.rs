use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use jobdag::rule::{ActionArgs, ExecutableAction};

/// Shared log of action invocations, in start order.
pub type InvocationLog = Arc<Mutex<Vec<String>>>;

/// An action that records its invocation and writes its outputs to disk.
///
/// - `write_only(n)` writes only the first `n` outputs and still succeeds,
///   which simulates an action that forgets an output.
/// - `fail_after(n)` writes the first `n` outputs and then errors.
/// - `delay(d)` sleeps before producing anything, to widen race windows.
#[derive(Debug, Clone)]
pub struct RecordingAction {
    label: String,
    log: InvocationLog,
    write_limit: Option<usize>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingAction {
    pub fn new(label: impl Into<String>, log: InvocationLog) -> Self {
        Self {
            label: label.into(),
            log,
            write_limit: None,
            fail: false,
            delay: None,
        }
    }

    pub fn write_only(mut self, n: usize) -> Self {
        self.write_limit = Some(n);
        self
    }

    pub fn fail_after(mut self, n: usize) -> Self {
        self.write_limit = Some(n);
        self.fail = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl ExecutableAction for RecordingAction {
    fn perform<'a>(
        &'a self,
        args: &'a ActionArgs,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.log.lock().unwrap().push(self.label.clone());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let limit = self.write_limit.unwrap_or(args.outputs.len());
            for output in args.outputs.iter().take(limit) {
                tokio::fs::write(output.path(), self.label.as_bytes()).await?;
            }

            if self.fail {
                bail!("{} failed on purpose", self.label);
            }
            Ok(())
        })
    }
}
