// src/config/mod.rs

//! Engine configuration.
//!
//! - [`model`] holds the raw TOML shape and the validated [`EngineConfig`].
//! - [`validate`] turns one into the other.
//! - [`loader`] reads a file from disk.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{EngineConfig, EngineSection, RawConfigFile};
