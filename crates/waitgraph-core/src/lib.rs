//! Deadlock detection over resource-allocation snapshots.
//!
//! Build a wait-for graph with [`build_graph`], find circular waits with
//! [`detect`], ask [`recommend`] which request to roll back, and apply the
//! rollback with [`resolve_first_cycle`] or [`resolve_until_safe`].
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod advice;
pub mod detection;
pub mod graph;
pub mod newtypes;
pub mod presets;
pub mod resolution;
pub mod scenario;
pub mod snapshot;
pub mod validation;

#[cfg(test)]
mod test_helpers;

pub use advice::{AdviceLine, Candidate, PREVENTION_STRATEGIES, rank_candidates, recommend};
pub use detection::{Cycle, DetectionResult, SAFE_MESSAGE, detect, detect_in};
pub use graph::cycles::{detect_cycles, is_valid_cycle};
pub use graph::{EdgeKind, GraphNode, WaitForGraph, build_graph};
pub use newtypes::{NewtypeError, ProcessId, ResourceId};
pub use presets::{PRESETS, Preset, find_preset};
pub use resolution::{
    Resolution, ResolutionPlan, ResolutionStep, pending_rollback, resolve_first_cycle,
    resolve_until_safe, rollback_breaks_cycle,
};
pub use scenario::{InMemoryScenarioStore, Scenario, ScenarioError, ScenarioStore};
pub use snapshot::{ProcessSnapshot, SnapshotParseError, parse_snapshot, processes_from_value};
pub use validation::{
    Diagnostic, Location, RuleId, Severity, ValidationReport, validate_snapshot,
};

/// Returns the library version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
