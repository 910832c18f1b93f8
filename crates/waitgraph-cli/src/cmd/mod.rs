/// Command modules for the `waitgraph` CLI.
///
/// Each submodule implements one subcommand through a `run` function that
/// takes already-parsed input and returns `Ok(())` on success or a
/// [`crate::error::CliError`] carrying the exit code.
pub mod advise;
pub mod detect;
pub mod example;
pub mod resolve;
pub mod scenario;
pub mod validate;

use std::io::Write;

use serde::Serialize;
use waitgraph_core::DetectionResult;

use crate::format::{ANSI_GREEN, ANSI_RED, FormatterConfig};

/// Writes the detection summary and one `Cycle N: a → b → a` line per
/// cycle, with the deadlocked processes named first.
pub(crate) fn write_detection_human<W: Write>(
    w: &mut W,
    result: &DetectionResult,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if !result.has_deadlock() {
        return writeln!(w, "{}", config.paint(result.message(), ANSI_GREEN));
    }
    writeln!(w, "{}", config.paint(result.message(), ANSI_RED))?;
    let names: Vec<&str> = result
        .deadlocked_processes()
        .into_iter()
        .map(|p| p.as_str())
        .collect();
    writeln!(w, "Deadlock detected between {}", names.join(", "))?;
    for (i, cycle) in result.cycles().iter().enumerate() {
        writeln!(w, "Cycle {}: {cycle}", i + 1)?;
    }
    Ok(())
}

/// Pretty-prints `value` as JSON followed by a newline.
pub(crate) fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)
}

/// The exit status for a finished detection.
pub(crate) fn deadlock_status(result: &DetectionResult) -> Result<(), crate::error::CliError> {
    if result.has_deadlock() {
        Err(crate::error::CliError::DeadlockDetected {
            cycles: result.cycles().len(),
        })
    } else {
        Ok(())
    }
}
