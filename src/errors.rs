// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Job-local execution errors live in [`crate::exec::error`]; they never
//! cross the pool boundary. This enum covers everything the caller of the
//! engine can observe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The abort switch was set because at least one job failed.
    #[error("workflow aborted after {failed} failed job(s)")]
    Aborted { failed: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobdagError>;
