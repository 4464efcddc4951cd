// tests/output_guard.rs

mod common;
use crate::common::init_tracing;

use std::fs;
use std::sync::Arc;

use jobdag::engine::Coordinator;
use jobdag::errors::JobdagError;
use jobdag::exec::TokioPool;
use jobdag_test_utils::builders::JobGraphBuilder;
use jobdag_test_utils::recording_action::RecordingAction;
use jobdag_test_utils::with_timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_action_leaves_no_partial_outputs() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let tmp = dir.path().join("tmp");
    fs::create_dir_all(tmp.join("keep")).unwrap();
    fs::write(tmp.join("keep").join("unrelated.txt"), "keep me").unwrap();

    let coordinator = Arc::new(Coordinator::new(Arc::new(TokioPool::new(2)), 1));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let f1 = tmp.join("new").join("f1");
    let f2 = tmp.join("new").join("f2");
    let f3 = tmp.join("keep").join("f3");
    let action = Arc::new(RecordingAction::new("split", g.log()).fail_after(1));
    let job = g.job_with("split", &[], action, |spec| {
        spec.output(f1.clone()).output(f2.clone()).output(f3.clone())
    });

    let result = with_timeout(coordinator.run(&[job.clone()])).await;
    assert!(matches!(result, Err(JobdagError::Aborted { failed: 1 })));

    assert!(!f1.exists());
    assert!(!f2.exists());
    assert!(!f3.exists());
    assert!(!tmp.join("new").exists(), "directory created for the job must be removed");
    assert!(tmp.join("keep").join("unrelated.txt").exists());
    assert!(!job.is_finished());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn action_that_skips_an_output_fails_the_job() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let coordinator = Arc::new(Coordinator::new(Arc::new(TokioPool::new(2)), 2));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let action = Arc::new(RecordingAction::new("pair", g.log()).write_only(1));
    let job = g.job_with("pair", &[], action, |spec| spec.output(a.clone()).output(b.clone()));

    let sink_out = dir.path().join("sink.txt");
    let sink = g.job_with(
        "sink",
        &["pair"],
        Arc::new(RecordingAction::new("sink", g.log())),
        |spec| spec.output(sink_out.clone()),
    );

    let result = with_timeout(coordinator.run(&[sink.clone()])).await;
    assert!(matches!(result, Err(JobdagError::Aborted { failed: 1 })));

    // The action reported success, but the missing output turns it into a
    // failure and the file it did write is removed again.
    assert_eq!(*g.log().lock().unwrap(), vec!["pair".to_string()]);
    assert!(!a.exists());
    assert!(!b.exists());
    assert!(!job.is_finished());
    assert!(!sink.is_finished());
    assert_eq!(coordinator.progress().completed(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn outputs_land_in_freshly_created_directories() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let coordinator = Arc::new(Coordinator::new(Arc::new(TokioPool::new(2)), 1));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let out = dir.path().join("deep").join("er").join("out.txt");
    let job = g.job_with(
        "deep",
        &[],
        Arc::new(RecordingAction::new("deep", g.log())),
        |spec| spec.output(out.clone()),
    );

    let summary = with_timeout(coordinator.run(&[job])).await.unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(fs::read_to_string(&out).unwrap(), "deep");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn protected_outputs_lose_only_their_write_bits() {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let coordinator = Arc::new(Coordinator::new(Arc::new(TokioPool::new(2)), 1));
    let mut g = JobGraphBuilder::new(coordinator.clone());

    let plain = dir.path().join("plain.txt");
    let locked = dir.path().join("locked.txt");
    let job = g.job_with(
        "protect",
        &[],
        Arc::new(RecordingAction::new("protect", g.log())),
        |spec| spec.output(plain.clone()).protected_output(locked.clone()),
    );

    with_timeout(coordinator.run(&[job])).await.unwrap();

    let plain_mode = fs::metadata(&plain).unwrap().permissions().mode();
    let locked_mode = fs::metadata(&locked).unwrap().permissions().mode();

    // Both files were created by the same process with the same umask.
    assert_eq!(locked_mode, plain_mode & !0o222);
    assert_ne!(plain_mode & 0o200, 0);
}
