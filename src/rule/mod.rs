// src/rule/mod.rs

//! Interfaces consumed from the rule layer.
//!
//! The engine never parses rule files. It only needs to know a rule's name,
//! whether it has real work to do, and the action to invoke. Anything that
//! implements [`Rule`] can be scheduled.
//!
//! - [`shell`] provides [`ShellAction`], which runs a command line with
//!   `{input}`/`{output}`/`{wildcards.x}` placeholders substituted.
//! - [`func`] provides [`FnAction`], which wraps a plain Rust closure.

use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::types::{OutputPath, Wildcards};

pub mod func;
pub mod shell;

pub use func::FnAction;
pub use shell::ShellAction;

/// Arguments handed to [`ExecutableAction::perform`].
#[derive(Debug, Clone, Default)]
pub struct ActionArgs {
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<OutputPath>,
    pub wildcards: Wildcards,
}

/// An opaque unit of work bound to a rule.
///
/// Implementations report any internal problem as an `anyhow::Error`; the
/// output guard turns it into an action failure for the job.
pub trait ExecutableAction: Send + Sync + Debug {
    fn perform<'a>(
        &'a self,
        args: &'a ActionArgs,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;
}

/// A rule as seen by the engine.
pub trait Rule: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Whether the rule has real work to perform, as opposed to a
    /// pass-through rule that only groups inputs.
    fn is_actionable(&self) -> bool {
        self.action().is_some()
    }

    fn action(&self) -> Option<Arc<dyn ExecutableAction>>;

    /// Line of the rule definition in the compiled rule source, used to
    /// resolve the user-facing line through a [`crate::diagnostics::RowMap`].
    fn lineno(&self) -> Option<usize> {
        None
    }
}

/// Plain [`Rule`] implementation for rules built in code.
#[derive(Debug, Clone)]
pub struct StaticRule {
    name: String,
    action: Option<Arc<dyn ExecutableAction>>,
    lineno: Option<usize>,
}

impl StaticRule {
    pub fn new(name: impl Into<String>, action: Arc<dyn ExecutableAction>) -> Self {
        Self {
            name: name.into(),
            action: Some(action),
            lineno: None,
        }
    }

    /// A rule without an action (e.g. an `all` target).
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: None,
            lineno: None,
        }
    }

    pub fn with_lineno(mut self, lineno: usize) -> Self {
        self.lineno = Some(lineno);
        self
    }
}

impl Rule for StaticRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn action(&self) -> Option<Arc<dyn ExecutableAction>> {
        self.action.clone()
    }

    fn lineno(&self) -> Option<usize> {
        self.lineno
    }
}
