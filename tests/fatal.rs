//! `fatal*` writes the record, flushes, then exits the process with status 1.
//!
//! The exit has to happen in a child process: the parent re-runs this test
//! binary with `FATAL_LOG_DIR` set so only the child test does the work.

use ctx_log_bridge::{build_logger, ContextLogger, LoggerConfig, OutputMode};
use serde_json::Value;
use std::env;
use std::fs;
use std::process::Command;

const DIR_VAR: &str = "FATAL_LOG_DIR";
const CHILD_TEST: &str = "fatal_child_logs_then_exits";

#[test]
fn fatal_child_logs_then_exits() {
    let Ok(dir) = env::var(DIR_VAR) else {
        return;
    };
    let config = LoggerConfig {
        level: "error".to_string(),
        out_type: OutputMode::File,
        file_path: dir,
        ..LoggerConfig::default()
    };
    let log = ContextLogger::new(build_logger(&config).unwrap());
    log.with_field("shard", 4).fatalf(format_args!("going down {}", 1));
}

#[test]
fn fatal_exits_with_status_one_after_writing() {
    let tmp = tempfile::TempDir::new().unwrap();

    let status = Command::new(env::current_exe().unwrap())
        .args([CHILD_TEST, "--exact", "--nocapture", "--test-threads=1"])
        .env(DIR_VAR, tmp.path())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let files: Vec<_> = fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    assert_eq!(files.len(), 2);

    for path in files {
        let text = fs::read_to_string(&path).unwrap();
        let line = text.lines().last().unwrap();
        let record: Value = serde_json::from_str(line).unwrap();
        assert_eq!(record["level"], "fatal", "{}", path.display());
        assert_eq!(record["msg"], "going down 1");
        assert_eq!(record["shard"], 4);
    }
}
