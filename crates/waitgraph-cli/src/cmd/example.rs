//! Implementation of `waitgraph example [<name>|--list]`.
//!
//! Prints a built-in snapshot as a JSON process array, ready to be piped
//! into another command: `waitgraph example mutual-wait | waitgraph detect -`.
//!
//! Exit codes: 0 = success, 1 = unknown preset.
use std::io::Write;

use serde::Serialize;
use waitgraph_core::{PRESETS, Preset, find_preset};

use crate::OutputFormat;
use crate::cmd::write_json;
use crate::error::CliError;
use crate::format::{ANSI_CYAN, FormatterConfig};

#[derive(Serialize)]
struct PresetSummary {
    name: &'static str,
    description: &'static str,
}

/// Runs the `example` command.
///
/// # Errors
///
/// - [`CliError::UnknownPreset`] if `name` matches no preset.
/// - [`CliError::InvalidScenario`] if a preset fails to build.
/// - [`CliError::IoError`] if stdout cannot be written.
pub fn run(name: Option<&str>, list: bool, config: &FormatterConfig) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if list {
        return print_list(&mut out, config).map_err(|e| CliError::write_failed("stdout", &e));
    }

    let Some(name) = name else {
        return Err(CliError::UnknownPreset {
            name: String::new(),
        });
    };
    let preset = lookup(name)?;
    let processes = preset.processes().map_err(|e| CliError::InvalidScenario {
        detail: format!("preset \"{}\": {e}", preset.name),
    })?;
    write_json(&mut out, &processes).map_err(|e| CliError::write_failed("stdout", &e))
}

fn lookup(name: &str) -> Result<&'static Preset, CliError> {
    find_preset(name).ok_or_else(|| CliError::UnknownPreset {
        name: name.to_owned(),
    })
}

fn print_list<W: Write>(w: &mut W, config: &FormatterConfig) -> std::io::Result<()> {
    match config.format {
        OutputFormat::Human => {
            let width = PRESETS.iter().map(|p| p.name.len()).max().unwrap_or(0);
            for preset in &PRESETS {
                let padded = format!("{:<width$}", preset.name);
                writeln!(
                    w,
                    "{}  {}",
                    config.paint(&padded, ANSI_CYAN),
                    preset.description
                )?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let summaries: Vec<PresetSummary> = PRESETS
                .iter()
                .map(|p| PresetSummary {
                    name: p.name,
                    description: p.description,
                })
                .collect();
            write_json(w, &summaries)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn config(format: OutputFormat) -> FormatterConfig {
        FormatterConfig {
            colors: false,
            quiet: false,
            verbose: false,
            format,
        }
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let err = lookup("no-such-thing").expect_err("unknown");
        assert!(matches!(err, CliError::UnknownPreset { ref name } if name == "no-such-thing"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn human_list_names_every_preset() {
        let mut buf = Vec::new();
        print_list(&mut buf, &config(OutputFormat::Human)).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text.lines().count(), PRESETS.len());
        for preset in &PRESETS {
            assert!(text.contains(preset.name));
        }
    }

    #[test]
    fn json_list_is_an_array() {
        let mut buf = Vec::new();
        print_list(&mut buf, &config(OutputFormat::Json)).expect("write");
        let v: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(v.as_array().map(Vec::len), Some(PRESETS.len()));
        assert_eq!(v[0]["name"], "mutual-wait");
    }
}
