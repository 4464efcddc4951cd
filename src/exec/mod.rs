// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`pool`] defines the `ExecutionPool` trait jobs submit work to, and the
//!   `Submission` they hand over.
//! - [`tokio_pool`] is the production pool: bounded parallelism on tokio.
//! - [`guard`] wraps every action invocation with directory preparation,
//!   output verification, write protection and rollback.
//! - [`error`] holds the job-local `ExecutionError` and the opaque
//!   `JobFailed` signal that crosses the pool boundary.

pub mod error;
pub mod guard;
pub mod pool;
pub mod tokio_pool;

pub use error::{ExecutionError, JobFailed};
pub use guard::OutputGuard;
pub use pool::{ExecutionPool, OnComplete, OnFailure, Submission};
pub use tokio_pool::TokioPool;
