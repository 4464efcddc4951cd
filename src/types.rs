// src/types.rs

//! Small value types shared by jobs, actions and the output guard.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Mapping from wildcard name to the value resolved for one job instance.
pub type Wildcards = BTreeMap<String, String>;

/// Process-unique identifier of a [`crate::dag::Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        JobId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// A declared output file of a job.
///
/// When `protected` is set, the output guard strips all write permission
/// bits from the file after the action produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputPath {
    path: PathBuf,
    protected: bool,
}

impl OutputPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protected: false,
        }
    }

    pub fn protected(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protected: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }
}

impl From<PathBuf> for OutputPath {
    fn from(path: PathBuf) -> Self {
        OutputPath::new(path)
    }
}

impl From<&str> for OutputPath {
    fn from(path: &str) -> Self {
        OutputPath::new(path)
    }
}

impl AsRef<Path> for OutputPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
