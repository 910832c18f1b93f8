/// Snapshot consistency checks.
///
/// Detection accepts any snapshot; [`validate_snapshot`] reports the states a
/// real allocator could never produce (a resource granted twice, a process
/// listed twice) and the ones that are legal but usually a mistake. Every
/// rule runs over the whole snapshot; nothing fails fast.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::newtypes::{ProcessId, ResourceId};
use crate::snapshot::ProcessSnapshot;

// ---------------------------------------------------------------------------
// Diagnostic types
// ---------------------------------------------------------------------------

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The snapshot is internally inconsistent.
    Error,
    /// Legal but suspicious.
    Warning,
    /// Observation only.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("Error"),
            Self::Warning => f.write_str("Warning"),
            Self::Info => f.write_str("Info"),
        }
    }
}

/// Identifier of a snapshot rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    /// SNAP-01: process ids are unique.
    DuplicateProcess,
    /// SNAP-02: a resource is held by at most one process.
    DoubleHeld,
    /// SNAP-03: a process does not request what it already holds.
    RequestsHeld,
    /// SNAP-04: a request appears once per process.
    RepeatedRequest,
    /// SNAP-05: a request targets a resource nobody holds.
    UnheldRequest,
}

impl RuleId {
    /// The canonical code, e.g. `"SNAP-02"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateProcess => "SNAP-01",
            Self::DoubleHeld => "SNAP-02",
            Self::RequestsHeld => "SNAP-03",
            Self::RepeatedRequest => "SNAP-04",
            Self::UnheldRequest => "SNAP-05",
        }
    }

    /// The severity every finding of this rule carries.
    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateProcess | Self::DoubleHeld => Severity::Error,
            Self::RequestsHeld | Self::RepeatedRequest => Severity::Warning,
            Self::UnheldRequest => Severity::Info,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where in the snapshot a finding applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A process record, by position in the input list.
    Process {
        /// The record's id.
        process_id: String,
        /// Zero-based index of the record.
        index: usize,
        /// The field involved, if any.
        field: Option<&'static str>,
    },
    /// A resource, wherever it appears.
    Resource {
        /// The resource id.
        resource_id: String,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process {
                process_id,
                index,
                field: None,
            } => write!(f, "processes[{index}] \"{process_id}\""),
            Self::Process {
                process_id,
                index,
                field: Some(field),
            } => write!(f, "processes[{index}] \"{process_id}\" field \"{field}\""),
            Self::Resource { resource_id } => write!(f, "resource \"{resource_id}\""),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The rule that fired.
    pub rule_id: RuleId,
    /// Severity of the finding.
    pub severity: Severity,
    /// Where it fired.
    pub location: Location,
    /// Human-readable explanation.
    pub message: String,
}

impl Diagnostic {
    /// Builds a diagnostic, taking the severity from the rule.
    pub fn new(rule_id: RuleId, location: Location, message: impl Into<String>) -> Self {
        Self {
            rule_id,
            severity: rule_id.severity(),
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_char = match self.severity {
            Severity::Error => 'E',
            Severity::Warning => 'W',
            Severity::Info => 'I',
        };
        write!(
            f,
            "[{level_char}] {} {}: {}",
            self.rule_id, self.location, self.message
        )
    }
}

/// All findings for one snapshot, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Every diagnostic produced.
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Returns `true` if any finding is an error.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Error findings.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Error)
    }

    /// Warning findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Warning)
    }

    /// Info findings.
    pub fn infos(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Info)
    }

    /// Findings of one rule.
    pub fn by_rule(&self, rule: RuleId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.rule_id == rule)
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }

    /// Total number of findings.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if the snapshot produced no findings.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn process_location(p: &ProcessSnapshot, index: usize, field: Option<&'static str>) -> Location {
    Location::Process {
        process_id: p.id.to_string(),
        index,
        field,
    }
}

fn check_duplicate_processes(processes: &[ProcessSnapshot], out: &mut Vec<Diagnostic>) {
    let mut first_seen: HashMap<&ProcessId, usize> = HashMap::new();
    for (i, p) in processes.iter().enumerate() {
        if let Some(&first) = first_seen.get(&p.id) {
            out.push(Diagnostic::new(
                RuleId::DuplicateProcess,
                process_location(p, i, None),
                format!("process id \"{}\" already used by processes[{first}]", p.id),
            ));
        } else {
            first_seen.insert(&p.id, i);
        }
    }
}

fn check_double_held(processes: &[ProcessSnapshot], out: &mut Vec<Diagnostic>) {
    let mut holders: BTreeMap<&ResourceId, Vec<&ProcessId>> = BTreeMap::new();
    for p in processes {
        for r in &p.holding {
            let entry = holders.entry(r).or_default();
            if !entry.contains(&&p.id) {
                entry.push(&p.id);
            }
        }
    }
    for (resource, ids) in holders {
        if ids.len() > 1 {
            let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
            out.push(Diagnostic::new(
                RuleId::DoubleHeld,
                Location::Resource {
                    resource_id: resource.to_string(),
                },
                format!("held by {} processes: {}", ids.len(), names.join(", ")),
            ));
        }
    }
}

fn check_requests(processes: &[ProcessSnapshot], out: &mut Vec<Diagnostic>) {
    let held: HashSet<&ResourceId> = processes.iter().flat_map(|p| &p.holding).collect();

    let mut warnings = Vec::new();
    let mut infos = Vec::new();
    for (i, p) in processes.iter().enumerate() {
        let mut seen: HashSet<&ResourceId> = HashSet::new();
        for r in &p.requesting {
            if !seen.insert(r) {
                warnings.push(Diagnostic::new(
                    RuleId::RepeatedRequest,
                    process_location(p, i, Some("requesting")),
                    format!("\"{r}\" is requested more than once"),
                ));
                continue;
            }
            if p.holds(r) {
                warnings.push(Diagnostic::new(
                    RuleId::RequestsHeld,
                    process_location(p, i, Some("requesting")),
                    format!("requests \"{r}\" which it already holds"),
                ));
            } else if !held.contains(r) {
                infos.push(Diagnostic::new(
                    RuleId::UnheldRequest,
                    process_location(p, i, Some("requesting")),
                    format!("\"{r}\" is not held by any process and can be granted now"),
                ));
            }
        }
    }
    out.append(&mut warnings);
    out.append(&mut infos);
}

/// Runs every snapshot rule and collects the findings.
///
/// Errors come first, then warnings, then infos; within a severity the
/// order follows the input.
pub fn validate_snapshot(processes: &[ProcessSnapshot]) -> ValidationReport {
    let mut diagnostics = Vec::new();
    check_duplicate_processes(processes, &mut diagnostics);
    check_double_held(processes, &mut diagnostics);
    check_requests(processes, &mut diagnostics);

    tracing::debug!(
        processes = processes.len(),
        findings = diagnostics.len(),
        "snapshot validated"
    );

    ValidationReport { diagnostics }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::proc;

    #[test]
    fn clean_snapshot_has_no_findings() {
        let procs = vec![proc("P1", &["R1"], &["R2"]), proc("P2", &["R2"], &["R1"])];
        let report = validate_snapshot(&procs);
        assert!(report.is_empty());
        assert!(!report.has_errors());
    }

    #[test]
    fn duplicate_process_is_an_error() {
        let procs = vec![
            proc("P1", &[], &[]),
            proc("P2", &[], &[]),
            proc("P1", &[], &[]),
        ];
        let report = validate_snapshot(&procs);
        assert!(report.has_errors());
        let diags: Vec<&Diagnostic> = report.by_rule(RuleId::DuplicateProcess).collect();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("processes[0]"));
        assert_eq!(
            diags[0].to_string(),
            "[E] SNAP-01 processes[2] \"P1\": process id \"P1\" already used by processes[0]"
        );
    }

    #[test]
    fn double_held_resource_is_an_error() {
        let procs = vec![proc("P1", &["R1"], &[]), proc("P2", &["R1"], &[])];
        let report = validate_snapshot(&procs);
        let diags: Vec<&Diagnostic> = report.errors().collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule_id, RuleId::DoubleHeld);
        assert_eq!(diags[0].message, "held by 2 processes: P1, P2");
    }

    #[test]
    fn self_request_is_a_warning() {
        let procs = vec![proc("P1", &["R1"], &["R1"])];
        let report = validate_snapshot(&procs);
        assert!(!report.has_errors());
        let diags: Vec<&Diagnostic> = report.warnings().collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule_id, RuleId::RequestsHeld);
    }

    #[test]
    fn repeated_request_is_reported_once_per_repeat() {
        let procs = vec![
            proc("P1", &[], &["R1", "R1", "R1"]),
            proc("P2", &["R1"], &[]),
        ];
        let report = validate_snapshot(&procs);
        assert_eq!(report.by_rule(RuleId::RepeatedRequest).count(), 2);
        assert_eq!(report.infos().count(), 0);
    }

    #[test]
    fn unheld_request_is_info() {
        let procs = vec![proc("P1", &["R1"], &["R2"])];
        let report = validate_snapshot(&procs);
        let infos: Vec<&Diagnostic> = report.infos().collect();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].rule_id.code(), "SNAP-05");
        assert!(infos[0].to_string().starts_with("[I] SNAP-05"));
    }

    #[test]
    fn findings_are_ordered_by_severity() {
        let procs = vec![
            proc("P1", &["R1"], &["R9", "R1"]),
            proc("P2", &["R1"], &[]),
        ];
        let report = validate_snapshot(&procs);
        let severities: Vec<Severity> = report.diagnostics.iter().map(|d| d.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Error, Severity::Warning, Severity::Info]
        );
    }
}
