// src/dag/mod.rs

//! Job DAG and the dependency resolution protocol.
//!
//! - [`job`] holds [`Job`], one DAG node that waits on its dependencies
//!   (fan-in) and notifies its subscribers when it finishes (fan-out).
//! - [`spec`] holds [`JobSpec`], the construction contract used by whatever
//!   builds the graph.
//!
//! There is no separate topological pass: readiness is detected
//! incrementally as the last dependency reports in.

pub mod job;
pub mod spec;

pub use job::{Job, JobStatus, Subscriber};
pub use spec::JobSpec;
