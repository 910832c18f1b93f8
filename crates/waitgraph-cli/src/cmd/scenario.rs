//! Implementation of `waitgraph scenario {save,load,list,delete}`.
//!
//! Scenarios live in the directory given by `--scenario-dir`. `load` prints
//! the stored process array (the full record in JSON mode) so its output can
//! be fed to any other command.
//!
//! Exit codes: 0 = success, 1 = unknown scenario, 2 = input or storage failure.
use std::io::Write;

use serde::Serialize;
use waitgraph_core::{Scenario, ScenarioStore, scenario::distinct_resources};

use crate::error::CliError;
use crate::format::FormatterConfig;
use crate::io::read_snapshot;
use crate::{OutputFormat, PathOrStdin, ScenarioCommand};

#[derive(Serialize)]
struct ScenarioSummary<'a> {
    name: &'a str,
    description: Option<&'a str>,
    process_count: usize,
    resource_count: usize,
}

impl<'a> From<&'a Scenario> for ScenarioSummary<'a> {
    fn from(s: &'a Scenario) -> Self {
        Self {
            name: &s.name,
            description: s.description.as_deref(),
            process_count: s.process_count,
            resource_count: s.resource_count,
        }
    }
}

/// Runs a `scenario` action against `store`.
///
/// # Errors
///
/// - [`CliError::ScenarioNotFound`] for `load`/`delete` of an unknown name.
/// - [`CliError::InvalidScenario`] when the declared counts are too small.
/// - [`CliError::StorageError`] when the directory cannot be used.
/// - Input errors from reading the snapshot file for `save`.
pub fn run<S: ScenarioStore>(
    action: &ScenarioCommand,
    store: &mut S,
    max_file_size: u64,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    match action {
        ScenarioCommand::Save {
            name,
            file,
            description,
            process_count,
            resource_count,
        } => save(
            store,
            SaveArgs {
                name,
                file,
                description: description.as_deref(),
                process_count: *process_count,
                resource_count: *resource_count,
            },
            max_file_size,
            config,
        ),
        ScenarioCommand::Load { name } => {
            let scenario = store.load(name)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match config.format {
                OutputFormat::Human => crate::cmd::write_json(&mut out, &scenario.processes),
                OutputFormat::Json => crate::cmd::write_json(&mut out, &scenario),
            }
            .map_err(|e| CliError::write_failed("stdout", &e))
        }
        ScenarioCommand::List => {
            let scenarios = store.list()?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            print_list(&mut out, &scenarios, config.format)
                .map_err(|e| CliError::write_failed("stdout", &e))
        }
        ScenarioCommand::Delete { name } => {
            store.delete(name)?;
            if !config.quiet {
                eprintln!("deleted scenario \"{name}\"");
            }
            Ok(())
        }
    }
}

/// Arguments of `scenario save`.
pub struct SaveArgs<'a> {
    /// Scenario name.
    pub name: &'a str,
    /// Snapshot source.
    pub file: &'a PathOrStdin,
    /// Optional description.
    pub description: Option<&'a str>,
    /// Declared process count override.
    pub process_count: Option<usize>,
    /// Declared resource count override.
    pub resource_count: Option<usize>,
}

/// Builds a scenario from `args` without touching storage.
///
/// # Errors
///
/// [`CliError::InvalidScenario`] for a blank name or counts smaller than the
/// snapshot needs.
pub fn build_scenario(
    args: &SaveArgs<'_>,
    processes: Vec<waitgraph_core::ProcessSnapshot>,
) -> Result<Scenario, CliError> {
    let derived_processes = processes.len();
    let derived_resources = distinct_resources(&processes);
    let scenario = Scenario::new(args.name, args.description.map(str::to_owned), processes)?
        .with_counts(
            args.process_count.unwrap_or(derived_processes),
            args.resource_count.unwrap_or(derived_resources),
        );
    scenario.check_capacity()?;
    Ok(scenario)
}

fn save<S: ScenarioStore>(
    store: &mut S,
    args: SaveArgs<'_>,
    max_file_size: u64,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    let processes = read_snapshot(args.file, max_file_size)?;
    let scenario = build_scenario(&args, processes)?;
    store.save(&scenario)?;

    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                eprintln!(
                    "saved scenario \"{}\" ({} processes, {} resources)",
                    scenario.name, scenario.process_count, scenario.resource_count
                );
            }
            Ok(())
        }
        OutputFormat::Json => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            crate::cmd::write_json(&mut out, &ScenarioSummary::from(&scenario))
                .map_err(|e| CliError::write_failed("stdout", &e))
        }
    }
}

fn print_list<W: Write>(
    w: &mut W,
    scenarios: &[Scenario],
    format: OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Human => {
            for s in scenarios {
                write!(
                    w,
                    "{}  ({} processes, {} resources)",
                    s.name, s.process_count, s.resource_count
                )?;
                if let Some(description) = &s.description {
                    write!(w, "  {description}")?;
                }
                writeln!(w)?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let summaries: Vec<ScenarioSummary<'_>> =
                scenarios.iter().map(ScenarioSummary::from).collect();
            crate::cmd::write_json(w, &summaries)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use waitgraph_core::{InMemoryScenarioStore, parse_snapshot};

    use super::*;

    fn procs() -> Vec<waitgraph_core::ProcessSnapshot> {
        parse_snapshot(
            r#"[{"id":"P1","holding":["R1"],"requesting":["R2"]},
                {"id":"P2","holding":["R2"],"requesting":["R3"]}]"#,
        )
        .expect("parses")
    }

    fn args<'a>(file: &'a PathOrStdin) -> SaveArgs<'a> {
        SaveArgs {
            name: "demo",
            file,
            description: Some("two hops"),
            process_count: None,
            resource_count: None,
        }
    }

    #[test]
    fn build_scenario_derives_counts() {
        let file = PathOrStdin::Stdin;
        let s = build_scenario(&args(&file), procs()).expect("valid");
        assert_eq!(s.process_count, 2);
        assert_eq!(s.resource_count, 3);
        assert_eq!(s.description.as_deref(), Some("two hops"));
    }

    #[test]
    fn build_scenario_rejects_small_counts() {
        let file = PathOrStdin::Stdin;
        let mut a = args(&file);
        a.resource_count = Some(2);
        let err = build_scenario(&a, procs()).expect_err("too small");
        assert!(matches!(err, CliError::InvalidScenario { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_unknown_is_not_found() {
        let mut store = InMemoryScenarioStore::new();
        let config = FormatterConfig {
            colors: false,
            quiet: true,
            verbose: false,
            format: OutputFormat::Human,
        };
        let err = run(
            &ScenarioCommand::Load {
                name: "nope".to_owned(),
            },
            &mut store,
            1024,
            &config,
        )
        .expect_err("unknown");
        assert!(matches!(err, CliError::ScenarioNotFound { .. }));
    }

    #[test]
    fn human_list_format() {
        let file = PathOrStdin::Stdin;
        let s = build_scenario(&args(&file), procs()).expect("valid");
        let mut buf = Vec::new();
        print_list(&mut buf, &[s], OutputFormat::Human).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "demo  (2 processes, 3 resources)  two hops\n"
        );
    }

    #[test]
    fn json_list_format() {
        let file = PathOrStdin::Stdin;
        let s = build_scenario(&args(&file), procs()).expect("valid");
        let mut buf = Vec::new();
        print_list(&mut buf, &[s], OutputFormat::Json).expect("write");
        let v: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(v[0]["name"], "demo");
        assert_eq!(v[0]["resource_count"], 3);
    }
}
