// src/diagnostics.rs

//! Operator-facing failure reporting.
//!
//! A job failure is diagnosed exactly once, at the point where the output
//! guard detects it. Everything downstream only learns that the job failed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::error;

use crate::exec::error::ExecutionError;

/// Maps line numbers of the compiled rule source back to lines of the file
/// the user wrote.
#[derive(Debug, Clone, Default)]
pub struct RowMap {
    source: Option<PathBuf>,
    rows: HashMap<usize, usize>,
}

impl RowMap {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
            rows: HashMap::new(),
        }
    }

    pub fn from_pairs(
        source: impl Into<PathBuf>,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            rows: pairs.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, compiled_line: usize, user_line: usize) {
        self.rows.insert(compiled_line, user_line);
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// User-facing line for a compiled line, if one was recorded.
    pub fn user_line(&self, compiled_line: usize) -> Option<usize> {
        self.rows.get(&compiled_line).copied()
    }
}

/// Emit the full diagnostic for a failed job.
pub fn report_failure(err: &ExecutionError, lineno: Option<usize>, rowmap: &RowMap) {
    let line = lineno.and_then(|l| rowmap.user_line(l));
    let source = rowmap.source().map(|p| p.display().to_string());

    error!(
        rule = %err.rule(),
        path = ?err.path(),
        source = source.as_deref().unwrap_or("<unknown>"),
        line = ?line,
        kind = err.kind(),
        "job failed: {:#}",
        err
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_line_only_resolves_recorded_rows() {
        let mut map = RowMap::from_pairs("Snakefile", [(10, 3)]);
        map.insert(20, 7);

        assert_eq!(map.user_line(10), Some(3));
        assert_eq!(map.user_line(20), Some(7));
        assert_eq!(map.user_line(11), None);
        assert_eq!(map.source(), Some(Path::new("Snakefile")));
    }
}
