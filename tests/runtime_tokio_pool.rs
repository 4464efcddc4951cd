// tests/runtime_tokio_pool.rs

mod common;
use crate::common::{init_tracing, position, record_finish, FinishLog};

use std::sync::Arc;
use std::time::Duration;

use jobdag::engine::Coordinator;
use jobdag::exec::TokioPool;
use jobdag_test_utils::builders::JobGraphBuilder;
use jobdag_test_utils::recording_action::RecordingAction;
use jobdag_test_utils::with_timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn diamond_runs_in_dependency_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let coordinator = Arc::new(Coordinator::new(Arc::new(TokioPool::new(4)), 4));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    for (name, deps) in [("A", vec![]), ("B", vec!["A"]), ("C", vec!["A"]), ("D", vec!["B", "C"])] {
        let out = dir.path().join(format!("{name}.txt"));
        let action = Arc::new(RecordingAction::new(name, g.log()).delay(Duration::from_millis(10)));
        g.job_with(name, &deps, action, |spec| spec.output(out));
    }

    let summary = with_timeout(coordinator.run(&[g.get("D")])).await.unwrap();

    let order = g.log().lock().unwrap().clone();
    assert_eq!(order.len(), 4);
    assert_eq!(position(&order, "A"), 0);
    assert_eq!(position(&order, "D"), 3);

    assert_eq!(summary.completed, 4);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.runtimes.len(), 4);
    assert!(summary.runtimes.values().all(|r| r.count == 1));
    assert!(summary.runtimes["A"].max >= Duration::from_millis(10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wide_fan_in_runs_the_sink_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pool = Arc::new(TokioPool::new(4));
    let coordinator = Arc::new(Coordinator::new(pool.clone(), 17));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let mut leaves = Vec::new();
    for i in 0..16 {
        let name = format!("leaf{i}");
        let out = dir.path().join(format!("{name}.txt"));
        let action = Arc::new(RecordingAction::new(name.clone(), g.log()));
        g.job_with(&name, &[], action, |spec| spec.output(out));
        leaves.push(name);
    }
    let deps: Vec<&str> = leaves.iter().map(String::as_str).collect();
    let sink_out = dir.path().join("sink.txt");
    let sink = g.job_with(
        "sink",
        &deps,
        Arc::new(RecordingAction::new("sink", g.log())),
        |spec| spec.output(sink_out.clone()),
    );

    let finished = FinishLog::default();
    sink.subscribe(record_finish(&finished, "sink"));

    let summary = with_timeout(coordinator.run(&[sink.clone()])).await.unwrap();

    let order = g.log().lock().unwrap().clone();
    assert_eq!(order.len(), 17);
    assert_eq!(order.iter().filter(|n| *n == "sink").count(), 1);
    assert_eq!(position(&order, "sink"), 16);
    assert_eq!(*finished.lock().unwrap(), vec!["sink".to_string()]);
    assert_eq!(summary.completed, 17);
    assert_eq!(pool.in_flight(), 0);
    assert!(sink_out.exists());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shell_action_substitutes_paths_and_wildcards() {
    use jobdag::dag::{Job, JobSpec};
    use jobdag::rule::{ShellAction, StaticRule};

    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.txt");
    std::fs::write(&input, "reads\n").unwrap();
    let output = dir.path().join("results").join("sample.tagged.txt");

    let coordinator = Arc::new(Coordinator::new(Arc::new(TokioPool::new(2)), 1));
    let action = ShellAction::new("cat {input} > {output} && echo {wildcards.sample} >> {output[0]}")
        .with_shell("sh");
    let rule = Arc::new(StaticRule::new("tag", Arc::new(action)).with_lineno(12));
    let job = Job::new(
        coordinator.clone(),
        JobSpec::new(rule)
            .input(input.clone())
            .output(output.clone())
            .wildcard("sample", "sample"),
    );

    let summary = with_timeout(coordinator.run(&[job.clone()])).await.unwrap();

    assert_eq!(summary.completed, 1);
    assert!(job.is_finished());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "reads\nsample\n");
}
