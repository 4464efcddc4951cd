#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use jobdag::dag::{Job, JobSpec};
use jobdag::engine::Coordinator;
use jobdag::rule::{ExecutableAction, StaticRule};

use crate::recording_action::{InvocationLog, RecordingAction};

/// Builder for small job graphs where every job has its own rule named
/// after the job.
pub struct JobGraphBuilder {
    coordinator: Arc<Coordinator>,
    log: InvocationLog,
    jobs: BTreeMap<String, Arc<Job>>,
}

impl JobGraphBuilder {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            log: InvocationLog::default(),
            jobs: BTreeMap::new(),
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Log shared by every `RecordingAction` this builder creates.
    pub fn log(&self) -> InvocationLog {
        Arc::clone(&self.log)
    }

    /// Add an executable job that depends on the named, already added jobs.
    pub fn job(&mut self, name: &str, deps: &[&str]) -> Arc<Job> {
        let action = RecordingAction::new(name, self.log());
        self.job_with(name, deps, Arc::new(action), |spec| spec)
    }

    /// Add a job whose outputs are already up to date.
    pub fn skipped(&mut self, name: &str, deps: &[&str]) -> Arc<Job> {
        let action = RecordingAction::new(name, self.log());
        self.job_with(name, deps, Arc::new(action), |spec| spec.needs_execution(false))
    }

    /// Add a job with a custom action and further spec tweaks.
    pub fn job_with(
        &mut self,
        name: &str,
        deps: &[&str],
        action: Arc<dyn ExecutableAction>,
        tweak: impl FnOnce(JobSpec) -> JobSpec,
    ) -> Arc<Job> {
        let rule = Arc::new(StaticRule::new(name, action));
        let mut spec = JobSpec::new(rule).message(format!("rule {name}"));
        for dep in deps {
            let dep_job = self
                .jobs
                .get(*dep)
                .unwrap_or_else(|| panic!("dependency '{dep}' of '{name}' not added yet"));
            spec = spec.depends_on(dep_job);
        }
        let job = Job::new(Arc::clone(&self.coordinator), tweak(spec));
        self.jobs.insert(name.to_string(), Arc::clone(&job));
        job
    }

    pub fn get(&self, name: &str) -> Arc<Job> {
        Arc::clone(
            self.jobs
                .get(name)
                .unwrap_or_else(|| panic!("no job named '{name}'")),
        )
    }
}
