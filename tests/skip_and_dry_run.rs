// tests/skip_and_dry_run.rs

mod common;
use crate::common::{init_tracing, position, watch_all, FinishLog};

use std::sync::Arc;

use jobdag::dag::{Job, JobSpec, JobStatus};
use jobdag::engine::Coordinator;
use jobdag::exec::TokioPool;
use jobdag::rule::StaticRule;
use jobdag_test_utils::builders::JobGraphBuilder;
use jobdag_test_utils::fake_pool::{InstantPool, ManualPool};
use jobdag_test_utils::recording_action::RecordingAction;

#[test]
fn skipped_job_unblocks_dependents_without_touching_the_pool() {
    init_tracing();
    let pool = InstantPool::new();
    let coordinator = Arc::new(Coordinator::new(pool.clone(), 1));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let a = g.skipped("A", &[]);
    let b = g.job("B", &["A"]);

    b.run(None);

    assert!(a.is_finished());
    assert!(b.is_finished());
    assert_eq!(pool.executed(), vec!["B".to_string()]);
    // Only B really executed.
    assert_eq!(coordinator.progress().completed(), 1);
}

#[test]
fn passthrough_rule_finishes_once_its_inputs_are_built() {
    init_tracing();
    let pool = ManualPool::new();
    let coordinator = Arc::new(Coordinator::new(pool.clone(), 2));
    let mut g = JobGraphBuilder::new(coordinator.clone());
    let a = g.job("A", &[]);
    let b = g.job("B", &[]);

    let all = Job::new(
        coordinator.clone(),
        JobSpec::new(Arc::new(StaticRule::passthrough("all")))
            .depends_on(&a)
            .depends_on(&b),
    );

    all.run(None);
    assert_eq!(all.status(), JobStatus::WaitingOnDeps);

    pool.complete("A");
    pool.complete("B");
    assert!(all.is_finished());
    assert!(!pool.submitted().contains(&"all".to_string()));
    assert_eq!(coordinator.progress().to_string(), "2/2");
}

#[tokio::test]
async fn dry_run_reports_in_topological_order_without_side_effects() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pool = ManualPool::new();
    let coordinator = Arc::new(Coordinator::new(pool.clone(), 4).with_default_dry_run(true));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let out = |name: &str| dir.path().join("nested").join(format!("{name}.txt"));
    let mut add = |name: &str, deps: &[&str]| {
        let action = Arc::new(RecordingAction::new(name, g.log()));
        let path = out(name);
        g.job_with(name, deps, action, move |spec| spec.protected_output(path))
    };

    let a = add("A", &[]);
    let b = add("B", &["A"]);
    let c = add("C", &["A"]);
    let d = add("D", &["B", "C"]);

    let log = FinishLog::default();
    watch_all(&log, &[("A", &a), ("B", &b), ("C", &c), ("D", &d)]);

    let summary = coordinator.run(&[d.clone()]).await.unwrap();

    let order = log.lock().unwrap().clone();
    assert_eq!(order.len(), 4);
    assert!(position(&order, "A") < position(&order, "B"));
    assert!(position(&order, "A") < position(&order, "C"));
    assert!(position(&order, "B") < position(&order, "D"));
    assert!(position(&order, "C") < position(&order, "D"));

    assert!(pool.submitted().is_empty());
    assert!(g.log().lock().unwrap().is_empty());
    assert_eq!(summary.completed, 0);
    assert!(summary.runtimes.is_empty());
    assert!(!dir.path().join("nested").exists());
}

#[tokio::test]
async fn explicit_dry_run_flag_overrides_the_coordinator_default() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let coordinator = Arc::new(Coordinator::new(Arc::new(TokioPool::new(2)), 1));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let path = dir.path().join("out.txt");
    let action = Arc::new(RecordingAction::new("A", g.log()));
    let a = g.job_with("A", &[], action, |spec| spec.output(path.clone()).dry_run(true));
    assert!(a.is_dry_run());

    coordinator.run(&[a.clone()]).await.unwrap();

    assert!(a.is_finished());
    assert!(!path.exists());
    assert_eq!(coordinator.progress().completed(), 0);
}
