// src/exec/guard.rs

//! Transactional wrapper around one action invocation.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::diagnostics::report_failure;
use crate::fs::FileSystem;
use crate::types::OutputPath;

use super::error::{ExecutionError, JobFailed};
use super::pool::Submission;

/// Runs an action so that a failure leaves no partial output behind.
///
/// On success the declared outputs all exist and protected ones are
/// read-only. On failure the error is reported, every output file the action
/// left behind is removed along with any directory that is empty afterwards
/// and was either an output itself or created here, and the caller only gets
/// [`JobFailed`].
///
/// Clones share one table of the output directories claimed by in-flight
/// invocations. A directory created by a failed invocation is kept while
/// another invocation still claims it.
#[derive(Debug, Clone)]
pub struct OutputGuard {
    fs: Arc<dyn FileSystem>,
    claims: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl OutputGuard {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            claims: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn invoke(&self, submission: &Submission) -> Result<Duration, JobFailed> {
        let claimed = self.claim_dirs(&submission.args.outputs);
        let mut created_dirs = Vec::new();

        let result = match self.run_guarded(submission, &mut created_dirs).await {
            Ok(elapsed) => Ok(elapsed),
            Err(err) => {
                report_failure(&err, submission.lineno, &submission.rowmap);
                self.rollback(&submission.rule, &submission.args.outputs, created_dirs);
                Err(JobFailed)
            }
        };

        self.release_dirs(&claimed);
        result
    }

    /// Register every ancestor directory of every output. Must happen before
    /// the directories are checked for existence.
    fn claim_dirs(&self, outputs: &[OutputPath]) -> BTreeSet<PathBuf> {
        let dirs: BTreeSet<PathBuf> = outputs
            .iter()
            .filter_map(|output| output.path().parent())
            .flat_map(Path::ancestors)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect();

        let mut claims = self.lock_claims();
        for dir in &dirs {
            *claims.entry(dir.clone()).or_default() += 1;
        }
        dirs
    }

    fn release_dirs(&self, dirs: &BTreeSet<PathBuf>) {
        let mut claims = self.lock_claims();
        for dir in dirs {
            if let Some(count) = claims.get_mut(dir) {
                *count -= 1;
                if *count == 0 {
                    claims.remove(dir);
                }
            }
        }
    }

    fn lock_claims(&self) -> MutexGuard<'_, HashMap<PathBuf, usize>> {
        self.claims.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run_guarded(
        &self,
        submission: &Submission,
        created_dirs: &mut Vec<PathBuf>,
    ) -> Result<Duration, ExecutionError> {
        info!(rule = %submission.rule, "{}", submission.message);

        self.prepare_output_dirs(submission, created_dirs)?;

        let started = Instant::now();
        submission
            .action
            .perform(&submission.args)
            .await
            .map_err(|cause| ExecutionError::ActionFailure {
                rule: submission.rule.clone(),
                cause,
            })?;

        self.check_outputs(submission)?;
        self.protect_outputs(submission)?;

        Ok(started.elapsed())
    }

    /// Create missing parent directories of every output, remembering which
    /// ones did not exist before.
    fn prepare_output_dirs(
        &self,
        submission: &Submission,
        created_dirs: &mut Vec<PathBuf>,
    ) -> Result<(), ExecutionError> {
        for output in &submission.args.outputs {
            let Some(parent) = output.path().parent() else {
                continue;
            };
            if parent.as_os_str().is_empty() || self.fs.exists(parent) {
                continue;
            }

            let missing: Vec<PathBuf> = parent
                .ancestors()
                .take_while(|dir| !dir.as_os_str().is_empty() && !self.fs.exists(dir))
                .map(Path::to_path_buf)
                .collect();

            self.fs
                .create_dir_all(parent)
                .map_err(|cause| ExecutionError::OutputDirectory {
                    rule: submission.rule.clone(),
                    path: parent.to_path_buf(),
                    cause,
                })?;

            debug!(rule = %submission.rule, dir = ?parent, "created output directory");
            created_dirs.extend(missing);
        }
        Ok(())
    }

    fn check_outputs(&self, submission: &Submission) -> Result<(), ExecutionError> {
        match submission
            .args
            .outputs
            .iter()
            .find(|output| !self.fs.exists(output.path()))
        {
            Some(missing) => Err(ExecutionError::MissingOutput {
                rule: submission.rule.clone(),
                path: missing.path().to_path_buf(),
            }),
            None => Ok(()),
        }
    }

    fn protect_outputs(&self, submission: &Submission) -> Result<(), ExecutionError> {
        for output in submission.args.outputs.iter().filter(|o| o.is_protected()) {
            if !self.fs.exists(output.path()) {
                continue;
            }
            self.fs
                .strip_write_permissions(output.path())
                .map_err(|cause| ExecutionError::ProtectionFailure {
                    rule: submission.rule.clone(),
                    path: output.path().to_path_buf(),
                    cause,
                })?;
            debug!(rule = %submission.rule, path = ?output.path(), "write-protected output");
        }
        Ok(())
    }

    /// Remove what a failed action left behind.
    ///
    /// Files go first so that directories emptied by their removal can go in
    /// the second pass. Non-empty directories stay.
    fn rollback(&self, rule: &str, outputs: &[OutputPath], mut created_dirs: Vec<PathBuf>) {
        for output in outputs {
            let path = output.path();
            if self.fs.exists(path) && !self.fs.is_dir(path) {
                match self.fs.remove_file(path) {
                    Ok(()) => debug!(rule, path = ?path, "removed output after failure"),
                    Err(e) => warn!(rule, path = ?path, error = %e, "could not remove output"),
                }
            }
        }

        for output in outputs {
            self.remove_dir_if_empty(rule, output.path());
        }

        // Deepest first, so a parent sees its children already gone.
        created_dirs.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| a.cmp(b))
        });
        created_dirs.dedup();

        // Held across the removals so no other invocation can claim a
        // directory between the check and the removal.
        let claims = self.lock_claims();
        for dir in &created_dirs {
            if claims.get(dir).copied().unwrap_or(0) > 1 {
                debug!(rule, dir = ?dir, "created directory still claimed by another job; keeping");
                continue;
            }
            self.remove_dir_if_empty(rule, dir);
        }
    }

    fn remove_dir_if_empty(&self, rule: &str, dir: &Path) {
        if !self.fs.is_dir(dir) {
            return;
        }
        let is_empty = match self.fs.read_dir(dir) {
            Ok(entries) => entries.is_empty(),
            Err(e) => {
                warn!(rule, dir = ?dir, error = %e, "could not list directory during rollback");
                return;
            }
        };
        if !is_empty {
            return;
        }
        match self.fs.remove_dir(dir) {
            Ok(()) => debug!(rule, dir = ?dir, "removed empty directory after failure"),
            Err(e) => warn!(rule, dir = ?dir, error = %e, "could not remove directory"),
        }
    }
}
