//! Implementation of `waitgraph detect <file>`.
//!
//! Runs deadlock detection and prints the result to stdout: a summary and
//! one line per cycle in human mode, the `{hasDeadlock, cycles, message}`
//! object in JSON mode.
//!
//! Exit codes: 0 = safe, 1 = deadlock, 2 = input failure.
use std::time::Instant;

use waitgraph_core::{ProcessSnapshot, detect};

use crate::OutputFormat;
use crate::cmd::{deadlock_status, write_detection_human, write_json};
use crate::error::CliError;
use crate::format::{FormatterConfig, write_timing};

/// Runs the `detect` command over an already-loaded snapshot.
///
/// # Errors
///
/// - [`CliError::DeadlockDetected`] when at least one cycle is found.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(processes: &[ProcessSnapshot], config: &FormatterConfig) -> Result<(), CliError> {
    let start = Instant::now();
    let result = detect(processes);
    let elapsed = start.elapsed();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.format {
        OutputFormat::Human => write_detection_human(&mut out, &result, config),
        OutputFormat::Json => write_json(&mut out, &result),
    }
    .map_err(|e| CliError::write_failed("stdout", &e))?;

    write_timing(&mut std::io::stderr(), "detected", elapsed, config)
        .map_err(|e| CliError::write_failed("stderr", &e))?;

    deadlock_status(&result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use waitgraph_core::parse_snapshot;

    use super::*;

    fn config() -> FormatterConfig {
        FormatterConfig {
            colors: false,
            quiet: false,
            verbose: false,
            format: OutputFormat::Human,
        }
    }

    fn render(json: &str) -> String {
        let procs = parse_snapshot(json).expect("parses");
        let mut buf = Vec::new();
        write_detection_human(&mut buf, &detect(&procs), &config()).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn human_output_for_mutual_wait() {
        let out = render(
            r#"[{"id":"P1","holding":["R1"],"requesting":["R2"]},
                {"id":"P2","holding":["R2"],"requesting":["R1"]}]"#,
        );
        assert_eq!(
            out,
            "Deadlock detected: 1 circular wait condition(s) found\n\
             Deadlock detected between P1, P2\n\
             Cycle 1: P1 → R2 → P2 → R1 → P1\n"
        );
    }

    #[test]
    fn human_output_for_safe_snapshot() {
        let out = render(r#"[{"id":"P1","holding":["R1"]}]"#);
        assert_eq!(out, "No deadlock detected — system is in a safe state\n");
    }

    #[test]
    fn run_returns_deadlock_error() {
        let procs = parse_snapshot(
            r#"[{"id":"P1","holding":["R1"],"requesting":["R2"]},
                {"id":"P2","holding":["R2"],"requesting":["R1"]}]"#,
        )
        .expect("parses");
        let err = run(&procs, &config()).expect_err("deadlock");
        assert!(matches!(err, CliError::DeadlockDetected { cycles: 1 }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn run_safe_is_ok() {
        let procs = parse_snapshot("[]").expect("parses");
        assert!(run(&procs, &config()).is_ok());
    }
}
