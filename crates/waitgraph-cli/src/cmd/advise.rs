//! Implementation of `waitgraph advise <file>`.
//!
//! Detection followed by per-cycle rollback advice. Human mode prints the
//! detection summary, the advice (headers in bold, details as bullets) and,
//! when a deadlock exists, the general prevention strategies. JSON mode
//! prints `{"detection": {...}, "advice": [{"kind", "text"}, ...]}`.
//!
//! Exit codes: 0 = safe, 1 = deadlock, 2 = input failure.
use std::io::Write;

use serde::Serialize;
use waitgraph_core::{AdviceLine, DetectionResult, PREVENTION_STRATEGIES, ProcessSnapshot, detect, recommend};

use crate::OutputFormat;
use crate::cmd::{deadlock_status, write_detection_human, write_json};
use crate::error::CliError;
use crate::format::{ANSI_BOLD, FormatterConfig};

#[derive(Serialize)]
struct AdviceReport<'a> {
    detection: &'a DetectionResult,
    advice: &'a [AdviceLine],
}

/// Runs the `advise` command over an already-loaded snapshot.
///
/// # Errors
///
/// - [`CliError::DeadlockDetected`] when at least one cycle is found.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(processes: &[ProcessSnapshot], config: &FormatterConfig) -> Result<(), CliError> {
    let result = detect(processes);
    let advice = recommend(processes, result.cycles());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.format {
        OutputFormat::Human => print_human(&mut out, &result, &advice, config),
        OutputFormat::Json => write_json(
            &mut out,
            &AdviceReport {
                detection: &result,
                advice: &advice,
            },
        ),
    }
    .map_err(|e| CliError::write_failed("stdout", &e))?;

    deadlock_status(&result)
}

fn print_human<W: Write>(
    w: &mut W,
    result: &DetectionResult,
    advice: &[AdviceLine],
    config: &FormatterConfig,
) -> std::io::Result<()> {
    write_detection_human(w, result, config)?;
    if advice.is_empty() {
        return Ok(());
    }

    writeln!(w)?;
    writeln!(w, "Recommended resolution:")?;
    for line in advice {
        match line {
            AdviceLine::Header(text) => writeln!(w, "{}", config.paint(text, ANSI_BOLD))?,
            AdviceLine::Detail(_) => writeln!(w, "{}", line.marked())?,
        }
    }

    writeln!(w)?;
    writeln!(w, "Prevention strategies:")?;
    for (i, (title, description)) in PREVENTION_STRATEGIES.iter().enumerate() {
        writeln!(w, "{}. {title}", i + 1)?;
        writeln!(w, "   {description}")?;
    }
    Ok(())
}
