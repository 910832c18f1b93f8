//! Implementation of `waitgraph resolve <file>`.
//!
//! Applies LIFO rollback to break deadlocks. Without `--until-safe` one
//! request is rolled back (from the first process on the first cycle that has
//! one); with it, rollbacks repeat until the snapshot is safe or
//! `--max-rounds` is reached.
//!
//! Human mode reports each rollback on stderr and writes the resulting
//! snapshot to stdout as a JSON process array, so the output can be piped
//! back into `waitgraph detect -`. JSON mode writes
//! `{"steps": [...], "processes": [...], "result": {...}}` to stdout.
//!
//! Exit codes: 0 = final snapshot safe, 1 = deadlock remains, 2 = input failure.
use std::io::Write;

use waitgraph_core::{
    ProcessSnapshot, ResolutionPlan, ResolutionStep, detect, resolve_first_cycle,
    resolve_until_safe,
};

use crate::OutputFormat;
use crate::cmd::{deadlock_status, write_json};
use crate::error::CliError;
use crate::format::{ANSI_GREEN, ANSI_YELLOW, FormatterConfig};

/// Computes the plan for a single rollback.
pub fn resolve_once(processes: &[ProcessSnapshot]) -> ResolutionPlan {
    let result = detect(processes);
    match resolve_first_cycle(processes, &result) {
        Some(resolution) => {
            let after = detect(&resolution.processes);
            ResolutionPlan {
                steps: vec![ResolutionStep {
                    victim: resolution.victim,
                    released: resolution.released,
                    breaks_targeted_cycle: resolution.breaks_targeted_cycle,
                }],
                processes: resolution.processes,
                result: after,
            }
        }
        None => ResolutionPlan {
            steps: Vec::new(),
            processes: processes.to_vec(),
            result,
        },
    }
}

/// Runs the `resolve` command over an already-loaded snapshot.
///
/// # Errors
///
/// - [`CliError::DeadlockDetected`] if the final snapshot still deadlocks.
/// - [`CliError::IoError`] if stdout or stderr cannot be written.
pub fn run(
    processes: &[ProcessSnapshot],
    until_safe: bool,
    max_rounds: Option<usize>,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    let plan = if until_safe {
        resolve_until_safe(processes, max_rounds.unwrap_or(usize::MAX))
    } else {
        resolve_once(processes)
    };

    if config.format == OutputFormat::Human && !config.quiet {
        report_steps(&mut std::io::stderr().lock(), &plan, config)
            .map_err(|e| CliError::write_failed("stderr", &e))?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.format {
        OutputFormat::Human => write_json(&mut out, &plan.processes),
        OutputFormat::Json => write_json(&mut out, &plan),
    }
    .map_err(|e| CliError::write_failed("stdout", &e))?;

    deadlock_status(&plan.result)
}

/// Writes one line per rollback and a final status line.
fn report_steps<W: Write>(
    w: &mut W,
    plan: &ResolutionPlan,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if plan.steps.is_empty() && plan.is_safe() {
        writeln!(w, "no deadlock; snapshot unchanged")?;
        return Ok(());
    }
    for (i, step) in plan.steps.iter().enumerate() {
        let effect = if step.breaks_targeted_cycle {
            "breaks the targeted cycle"
        } else {
            "does not break the targeted cycle"
        };
        writeln!(
            w,
            "step {}: rolled back {}'s request for {} ({effect})",
            i + 1,
            step.victim,
            step.released
        )?;
    }
    if plan.is_safe() {
        writeln!(w, "{}", config.paint(plan.result.message(), ANSI_GREEN))
    } else {
        writeln!(
            w,
            "{} after {} rollback(s); re-run with --until-safe to continue",
            config.paint(plan.result.message(), ANSI_YELLOW),
            plan.steps.len()
        )
    }
}
