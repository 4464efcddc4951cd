// tests/config_loading.rs

use std::io::Write;

use jobdag::config::{load_and_validate, load_from_path};
use jobdag::errors::JobdagError;
use jobdag::logging::LogLevel;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn full_engine_section_is_loaded() {
    let file = config_file(
        r#"
        [engine]
        cores = 3
        dry_run = true
        shell = "bash"
        log_level = "debug"
        "#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.cores, 3);
    assert!(cfg.dry_run);
    assert_eq!(cfg.shell, "bash");
    assert_eq!(cfg.log_level, Some(LogLevel::Debug));
    assert_eq!(cfg.shell_action("true").command(), "true");
}

#[test]
fn empty_file_falls_back_to_defaults() {
    let file = config_file("");
    let cfg = load_and_validate(file.path()).unwrap();
    assert!(cfg.cores >= 1);
    assert!(!cfg.dry_run);
    assert_eq!(cfg.log_level, None);
}

#[test]
fn zero_cores_is_a_config_error() {
    let file = config_file("[engine]\ncores = 0\n");
    match load_and_validate(file.path()) {
        Err(JobdagError::ConfigError(msg)) => assert!(msg.contains("cores")),
        other => panic!("expected ConfigError, got {:?}", other),
    }
}

#[test]
fn unknown_keys_are_rejected_by_the_parser() {
    let file = config_file("[engine]\nthreads = 4\n");
    assert!(matches!(load_from_path(file.path()), Err(JobdagError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(JobdagError::IoError(_))));
}
