/// Deadlock detection: [`DetectionResult`] and the [`detect`] entry point.
///
/// [`detect`] builds the wait-for graph for a snapshot, enumerates its cycles
/// and packages them as an immutable [`DetectionResult`]. Every call is
/// independent: the graph, the DFS coloring and the cycle list are local to
/// the call and dropped on return.
use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::graph::cycles::detect_cycles;
use crate::graph::{GraphNode, WaitForGraph, build_graph};
use crate::newtypes::ProcessId;
use crate::snapshot::ProcessSnapshot;

/// Summary message for a snapshot with no cycles.
pub const SAFE_MESSAGE: &str = "No deadlock detected — system is in a safe state";

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// A closed circular wait: each node waits on, or is held by, the next, and
/// the last node repeats the first.
///
/// Serializes as a flat list of node labels, e.g.
/// `["P1", "R2", "P2", "R1", "P1"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    nodes: Vec<GraphNode>,
}

impl Cycle {
    /// Wraps a closed node sequence.
    ///
    /// Callers pass the closed form (first node repeated at the end). The
    /// detector always does; other sequences are stored as given.
    pub fn new(nodes: Vec<GraphNode>) -> Self {
        Self { nodes }
    }

    /// The closed node sequence.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// The node sequence without the closing repeat.
    pub fn open(&self) -> &[GraphNode] {
        match self.nodes.split_last() {
            Some((last, rest)) if self.nodes.len() > 1 && Some(last) == self.nodes.first() => rest,
            Some(_) | None => &self.nodes,
        }
    }

    /// Node labels in closed order.
    pub fn labels(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.label().to_owned()).collect()
    }

    /// Distinct processes in the cycle, in path order.
    pub fn processes(&self) -> Vec<&ProcessId> {
        let mut seen: HashSet<&ProcessId> = HashSet::new();
        self.open()
            .iter()
            .filter_map(GraphNode::as_process)
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// The node that follows the first occurrence of `node` in the cycle.
    pub fn successor_of(&self, node: &GraphNode) -> Option<&GraphNode> {
        let pos = self.nodes.iter().position(|n| n == node)?;
        self.nodes.get(pos + 1)
    }
}

impl fmt::Display for Cycle {
    /// Formats the cycle as `P1 → R2 → P2 → R1 → P1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" → ")?;
            }
            f.write_str(node.label())?;
        }
        Ok(())
    }
}

impl Serialize for Cycle {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(self.nodes.iter().map(GraphNode::label))
    }
}

// ---------------------------------------------------------------------------
// DetectionResult
// ---------------------------------------------------------------------------

/// Outcome of one detection pass.
///
/// `has_deadlock` is true iff `cycles` is non-empty. Serializes as
/// `{"hasDeadlock": bool, "cycles": [[label, ...]], "message": string}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    has_deadlock: bool,
    cycles: Vec<Cycle>,
    message: String,
}

impl DetectionResult {
    /// Builds a result from a cycle list, deriving the flag and message.
    pub fn from_cycles(cycles: Vec<Cycle>) -> Self {
        let message = if cycles.is_empty() {
            SAFE_MESSAGE.to_owned()
        } else {
            format!(
                "Deadlock detected: {} circular wait condition(s) found",
                cycles.len()
            )
        };
        Self {
            has_deadlock: !cycles.is_empty(),
            cycles,
            message,
        }
    }

    /// Whether at least one circular wait exists.
    pub fn has_deadlock(&self) -> bool {
        self.has_deadlock
    }

    /// The cycles, in detection order.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Short human-readable summary.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The cycles as label lists.
    pub fn cycle_labels(&self) -> Vec<Vec<String>> {
        self.cycles.iter().map(Cycle::labels).collect()
    }

    /// Every process that appears in any cycle, in first-appearance order.
    pub fn deadlocked_processes(&self) -> Vec<&ProcessId> {
        let mut seen: HashSet<&ProcessId> = HashSet::new();
        self.cycles
            .iter()
            .flat_map(Cycle::processes)
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Runs deadlock detection over an ordered process snapshot.
///
/// Equivalent to [`build_graph`] followed by [`detect_in`]. An empty
/// snapshot yields a safe result.
pub fn detect(processes: &[ProcessSnapshot]) -> DetectionResult {
    detect_in(&build_graph(processes))
}

/// Runs deadlock detection over an already-built graph.
pub fn detect_in(graph: &WaitForGraph) -> DetectionResult {
    let cycles = detect_cycles(graph)
        .into_iter()
        .map(|path| {
            Cycle::new(
                path.iter()
                    .filter_map(|&idx| graph.node_weight(idx).cloned())
                    .collect(),
            )
        })
        .collect();
    DetectionResult::from_cycles(cycles)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
