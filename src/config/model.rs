// src/config/model.rs

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::rule::shell::default_shell;
use crate::rule::ShellAction;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [engine]
/// cores = 4
/// dry_run = false
/// shell = "sh"
/// log_level = "info"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Maximum number of actions running at the same time.
    #[serde(default = "default_cores")]
    pub cores: usize,

    /// Default dry-run flag for jobs that do not set their own.
    #[serde(default)]
    pub dry_run: bool,

    /// Interpreter used by shell actions.
    #[serde(default = "default_shell_string")]
    pub shell: String,

    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

fn default_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_shell_string() -> String {
    default_shell().to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            cores: default_cores(),
            dry_run: false,
            shell: default_shell_string(),
            log_level: None,
        }
    }
}

/// Validated engine configuration.
///
/// Construct through `EngineConfig::try_from(RawConfigFile)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cores: usize,
    pub dry_run: bool,
    pub shell: String,
    pub log_level: Option<LogLevel>,
}

impl EngineConfig {
    pub(crate) fn new_unchecked(engine: EngineSection) -> Self {
        Self {
            cores: engine.cores,
            dry_run: engine.dry_run,
            shell: engine.shell,
            log_level: engine.log_level,
        }
    }

    /// A [`ShellAction`] for `command` using the configured shell.
    pub fn shell_action(&self, command: impl Into<String>) -> ShellAction {
        ShellAction::new(command).with_shell(self.shell.clone())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new_unchecked(EngineSection::default())
    }
}
