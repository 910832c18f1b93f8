//! Implementation of `waitgraph validate <file>`.
//!
//! Runs the snapshot consistency rules and writes diagnostics plus a summary
//! line to stderr (NDJSON in `--format json`). Nothing is written to stdout.
//!
//! Exit codes: 0 = no errors, 1 = at least one error, 2 = input failure.
use std::time::Instant;

use waitgraph_core::{ProcessSnapshot, validate_snapshot};

use crate::error::CliError;
use crate::format::{FormatterConfig, write_diagnostic, write_summary, write_timing};

/// Runs the `validate` command over an already-loaded snapshot.
///
/// # Errors
///
/// - [`CliError::ValidationErrors`] when any error-level rule fires.
/// - [`CliError::IoError`] if stderr cannot be written.
pub fn run(processes: &[ProcessSnapshot], config: &FormatterConfig) -> Result<(), CliError> {
    let start = Instant::now();
    let report = validate_snapshot(processes);
    let elapsed = start.elapsed();

    let stderr = std::io::stderr();
    let mut err_out = stderr.lock();
    let write_err = |e: std::io::Error| CliError::write_failed("stderr", &e);

    for diag in &report.diagnostics {
        write_diagnostic(&mut err_out, diag, config).map_err(write_err)?;
    }
    write_summary(
        &mut err_out,
        report.errors().count(),
        report.warnings().count(),
        report.infos().count(),
        config,
    )
    .map_err(write_err)?;
    write_timing(&mut err_out, "validated", elapsed, config).map_err(write_err)?;

    if report.has_errors() {
        Err(CliError::ValidationErrors)
    } else {
        Ok(())
    }
}
