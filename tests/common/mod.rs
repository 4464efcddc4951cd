#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use jobdag::dag::{Job, Subscriber};

pub use jobdag_test_utils::init_tracing;

/// Shared record of job completions, in notification order.
pub type FinishLog = Arc<Mutex<Vec<String>>>;

/// A subscriber that appends `name` to `log` when the job finishes.
pub fn record_finish(log: &FinishLog, name: &str) -> Subscriber {
    let log = Arc::clone(log);
    let name = name.to_string();
    Box::new(move |_id| log.lock().unwrap().push(name))
}

/// Subscribe `log` to every job without starting any of them.
pub fn watch_all(log: &FinishLog, jobs: &[(&str, &Arc<Job>)]) {
    for (name, job) in jobs {
        job.subscribe(record_finish(log, name));
    }
}

pub fn position(order: &[String], name: &str) -> usize {
    order
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("{name} not in {order:?}"))
}
