/// Output styling shared by the commands.
///
/// - Color detection (`--no-color`, `NO_COLOR`, stderr TTY).
/// - Validator diagnostics in human or NDJSON form, plus the summary line.
/// - Small helpers for colored status banners and verbose timing.
use std::io::{IsTerminal as _, Write};
use std::time::Duration;

use waitgraph_core::{Diagnostic, Severity};

use crate::OutputFormat;

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

/// Returns `true` if ANSI color codes should be emitted to stderr.
///
/// Disabled by the `--no-color` flag, by the presence of `NO_COLOR`, or when
/// stderr is not a TTY.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

// ---------------------------------------------------------------------------
// ANSI escape sequences
// ---------------------------------------------------------------------------

pub const ANSI_RED: &str = "\x1b[31m";
pub const ANSI_GREEN: &str = "\x1b[32m";
pub const ANSI_YELLOW: &str = "\x1b[33m";
pub const ANSI_CYAN: &str = "\x1b[36m";
pub const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// FormatterConfig
// ---------------------------------------------------------------------------

/// Output settings derived from the global CLI flags.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Whether ANSI colors are enabled.
    pub colors: bool,
    /// Suppress all non-error stderr output.
    pub quiet: bool,
    /// Emit timing to stderr.
    pub verbose: bool,
    /// Selected output format.
    pub format: OutputFormat,
}

impl FormatterConfig {
    /// Builds the config from the raw CLI flags.
    pub fn from_flags(format: OutputFormat, no_color_flag: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            colors: colors_enabled(no_color_flag),
            quiet,
            verbose,
            format,
        }
    }

    /// Wraps `text` in `color` when colors are on.
    pub fn paint(&self, text: &str, color: &str) -> String {
        if self.colors {
            format!("{color}{text}{ANSI_RESET}")
        } else {
            text.to_owned()
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

fn severity_tag(severity: Severity) -> (&'static str, &'static str, &'static str) {
    match severity {
        Severity::Error => ("[E]", ANSI_RED, "error"),
        Severity::Warning => ("[W]", ANSI_YELLOW, "warning"),
        Severity::Info => ("[I]", ANSI_CYAN, "info"),
    }
}

/// Writes one diagnostic in the configured format.
///
/// Human: `[E] SNAP-02  resource "R1": held by 2 processes: P1, P2`.
/// JSON: one object per line with `rule_id`, `severity`, `location` and
/// `message`. Quiet mode drops warnings and infos in both forms.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_diagnostic<W: Write>(
    writer: &mut W,
    diag: &Diagnostic,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        match diag.severity {
            Severity::Warning | Severity::Info => return Ok(()),
            Severity::Error => {}
        }
    }

    let (tag, color, name) = severity_tag(diag.severity);
    match config.format {
        OutputFormat::Human => writeln!(
            writer,
            "{} {}  {}: {}",
            config.paint(tag, color),
            diag.rule_id,
            diag.location,
            diag.message
        ),
        OutputFormat::Json => {
            let line = serde_json::json!({
                "rule_id": diag.rule_id.code(),
                "severity": name,
                "location": diag.location.to_string(),
                "message": diag.message,
            });
            writeln!(writer, "{line}")
        }
    }
}

/// Writes the closing summary: `1 error, 2 warnings, 0 info` in human mode,
/// `{"summary":{"errors":1,"warnings":2,"info":0}}` in JSON mode.
///
/// Suppressed in quiet mode.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_summary<W: Write>(
    writer: &mut W,
    errors: usize,
    warnings: usize,
    infos: usize,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.format {
        OutputFormat::Human => writeln!(
            writer,
            "{errors} {}, {warnings} {}, {infos} info",
            pluralize(errors, "error", "errors"),
            pluralize(warnings, "warning", "warnings"),
        ),
        OutputFormat::Json => {
            let line = serde_json::json!({
                "summary": {"errors": errors, "warnings": warnings, "info": infos}
            });
            writeln!(writer, "{line}")
        }
    }
}

/// Writes `label in Nms` when verbose.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_timing<W: Write>(
    writer: &mut W,
    label: &str,
    duration: Duration,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if !config.verbose {
        return Ok(());
    }
    writeln!(writer, "{label} in {}ms", duration.as_millis())
}

/// Returns the singular or plural form of a word.
pub fn pluralize<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use waitgraph_core::{Location, RuleId};

    use super::*;

    fn config(format: OutputFormat, quiet: bool) -> FormatterConfig {
        FormatterConfig {
            colors: false,
            quiet,
            verbose: false,
            format,
        }
    }

    fn double_held() -> Diagnostic {
        Diagnostic::new(
            RuleId::DoubleHeld,
            Location::Resource {
                resource_id: "R1".to_owned(),
            },
            "held by 2 processes: P1, P2",
        )
    }

    fn unheld() -> Diagnostic {
        Diagnostic::new(
            RuleId::UnheldRequest,
            Location::Process {
                process_id: "P1".to_owned(),
                index: 0,
                field: Some("requesting"),
            },
            "\"R9\" is not held by any process and can be granted now",
        )
    }

    fn render(diag: &Diagnostic, cfg: &FormatterConfig) -> String {
        let mut buf = Vec::new();
        write_diagnostic(&mut buf, diag, cfg).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn human_diagnostic_line() {
        let out = render(&double_held(), &config(OutputFormat::Human, false));
        assert_eq!(
            out,
            "[E] SNAP-02  resource \"R1\": held by 2 processes: P1, P2\n"
        );
    }

    #[test]
    fn colored_tag_wraps_only_the_tag() {
        let mut cfg = config(OutputFormat::Human, false);
        cfg.colors = true;
        let out = render(&double_held(), &cfg);
        assert!(out.starts_with("\x1b[31m[E]\x1b[0m SNAP-02"), "{out:?}");
    }

    #[test]
    fn json_diagnostic_is_one_object_per_line() {
        let out = render(&unheld(), &config(OutputFormat::Json, false));
        assert_eq!(out.lines().count(), 1);
        let v: serde_json::Value = serde_json::from_str(out.trim()).expect("json");
        assert_eq!(v["rule_id"], "SNAP-05");
        assert_eq!(v["severity"], "info");
        assert!(v["message"].as_str().expect("str").contains("\"R9\""));
    }

    #[test]
    fn quiet_drops_non_errors() {
        let cfg = config(OutputFormat::Human, true);
        assert!(render(&unheld(), &cfg).is_empty());
        assert!(!render(&double_held(), &cfg).is_empty());
    }

    #[test]
    fn summary_pluralizes() {
        let mut buf = Vec::new();
        write_summary(&mut buf, 1, 2, 0, &config(OutputFormat::Human, false)).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "1 error, 2 warnings, 0 info\n");
    }

    #[test]
    fn json_summary() {
        let mut buf = Vec::new();
        write_summary(&mut buf, 0, 1, 3, &config(OutputFormat::Json, false)).expect("write");
        let v: serde_json::Value =
            serde_json::from_slice(&buf).expect("json summary");
        assert_eq!(v["summary"]["warnings"], 1);
        assert_eq!(v["summary"]["info"], 3);
    }

    #[test]
    fn timing_only_when_verbose() {
        let mut buf = Vec::new();
        let cfg = config(OutputFormat::Human, false);
        write_timing(&mut buf, "detected", Duration::from_millis(5), &cfg).expect("write");
        assert!(buf.is_empty());

        let verbose = FormatterConfig {
            verbose: true,
            ..cfg
        };
        write_timing(&mut buf, "detected", Duration::from_millis(5), &verbose).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "detected in 5ms\n");
    }
}
