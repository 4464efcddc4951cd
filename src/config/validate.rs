// src/config/validate.rs

use crate::config::model::{EngineConfig, RawConfigFile};
use crate::errors::{JobdagError, Result};

impl TryFrom<RawConfigFile> for EngineConfig {
    type Error = JobdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(EngineConfig::new_unchecked(raw.engine))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.cores == 0 {
        return Err(JobdagError::ConfigError(
            "[engine].cores must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.engine.shell.trim().is_empty() {
        return Err(JobdagError::ConfigError(
            "[engine].shell must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::EngineSection;

    #[test]
    fn zero_cores_is_rejected() {
        let raw = RawConfigFile {
            engine: EngineSection {
                cores: 0,
                ..EngineSection::default()
            },
        };

        match EngineConfig::try_from(raw) {
            Err(JobdagError::ConfigError(msg)) => assert!(msg.contains("cores")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::try_from(RawConfigFile::default()).unwrap();
        assert!(cfg.cores >= 1);
        assert!(!cfg.dry_run);
    }
}
