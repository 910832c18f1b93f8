//! Post-operation invariant checkers for correctness validation.

use std::collections::HashSet;

use petgraph::algo::is_cyclic_directed;
use petgraph::stable_graph::NodeIndex;
use waitgraph_core::{
    DetectionResult, EdgeKind, GraphNode, ProcessSnapshot, ResolutionPlan, WaitForGraph, detect,
    is_valid_cycle,
};

/// Verifies graph construction invariants: every holding is a `HeldBy` edge,
/// every request for a resource the same record does not hold is a
/// `WaitsFor` edge, and each edge's kind matches the kind of its source node.
pub fn check_graph_invariants(
    processes: &[ProcessSnapshot],
    graph: &WaitForGraph,
) -> Result<(), String> {
    let distinct: HashSet<_> = processes.iter().map(|p| &p.id).collect();
    if graph.process_count() != distinct.len() {
        return Err(format!(
            "process count mismatch: graph={}, snapshot={}",
            graph.process_count(),
            distinct.len()
        ));
    }
    for p in processes {
        let p_idx = graph
            .process_index(&p.id)
            .ok_or_else(|| format!("process {} not found in graph index", p.id))?;
        for r in &p.holding {
            let r_idx = graph
                .resource_index(r)
                .ok_or_else(|| format!("resource {r} not found in graph index"))?;
            if !graph.has_edge(r_idx, p_idx) {
                return Err(format!("missing held-by edge {r} -> {}", p.id));
            }
        }
        for r in p.requesting.iter().filter(|r| !p.holds(r)) {
            let r_idx = graph
                .resource_index(r)
                .ok_or_else(|| format!("resource {r} not found in graph index"))?;
            if !graph.has_edge(p_idx, r_idx) {
                return Err(format!("missing waits-for edge {} -> {r}", p.id));
            }
        }
    }
    for e in graph.graph().edge_indices() {
        let (from, to) = graph
            .graph()
            .edge_endpoints(e)
            .ok_or_else(|| format!("edge {} has no endpoints", e.index()))?;
        let (Some(source), Some(target)) = (graph.node_weight(from), graph.node_weight(to)) else {
            return Err(format!("edge {} points at a missing node", e.index()));
        };
        let expected = match source {
            GraphNode::Process(_) => EdgeKind::WaitsFor,
            GraphNode::Resource(_) => EdgeKind::HeldBy,
        };
        if graph.edge_weight(e) != Some(&expected) {
            return Err(format!(
                "edge {source} -> {target} is {:?}, expected {expected:?}",
                graph.edge_weight(e)
            ));
        }
    }
    Ok(())
}

/// Verifies a detection result against the graph it was computed from:
/// - a deadlock is reported iff the graph has a directed cycle
/// - every cycle is a closed walk along real edges
/// - no node repeats inside a cycle apart from the closing one
/// - process and resource nodes alternate
pub fn check_detection(graph: &WaitForGraph, result: &DetectionResult) -> Result<(), String> {
    let cyclic = is_cyclic_directed(graph.graph());
    if result.has_deadlock() != cyclic {
        return Err(format!(
            "has_deadlock={} but graph cyclic={cyclic}",
            result.has_deadlock()
        ));
    }

    for (i, cycle) in result.cycles().iter().enumerate() {
        let path: Vec<NodeIndex> = cycle
            .nodes()
            .iter()
            .map(|n| {
                graph
                    .node_index(n)
                    .ok_or_else(|| format!("cycle {i}: node {n} not in graph"))
            })
            .collect::<Result<_, _>>()?;
        if !is_valid_cycle(graph, &path) {
            return Err(format!("cycle {i} is not a closed walk: {cycle}"));
        }
        let open = cycle.open();
        let unique: HashSet<_> = open.iter().collect();
        if unique.len() != open.len() {
            return Err(format!("cycle {i} repeats a node: {cycle}"));
        }
        let alternates = cycle
            .nodes()
            .windows(2)
            .all(|w| w[0].as_process().is_some() != w[1].as_process().is_some());
        if !alternates {
            return Err(format!("cycle {i} does not alternate kinds: {cycle}"));
        }
    }
    Ok(())
}

/// Verifies that no two reported cycles are rotations of each other.
pub fn check_no_rotations(result: &DetectionResult) -> Result<(), String> {
    let mut seen = HashSet::new();
    for cycle in result.cycles() {
        let mut labels: Vec<&str> = cycle.open().iter().map(GraphNode::label).collect();
        let Some(min_pos) = labels
            .iter()
            .enumerate()
            .min_by_key(|(_, l)| **l)
            .map(|(i, _)| i)
        else {
            continue;
        };
        labels.rotate_left(min_pos);
        if !seen.insert(labels) {
            return Err(format!("cycle reported twice: {cycle}"));
        }
    }
    Ok(())
}

/// Verifies a resolution plan against the snapshot it started from:
/// - record order, ids and holdings are untouched
/// - each record's requests are a prefix of the original (LIFO removal)
/// - one request is removed per step
/// - the stored result matches a fresh detection
pub fn check_resolution(
    original: &[ProcessSnapshot],
    plan: &ResolutionPlan,
) -> Result<(), String> {
    if plan.processes.len() != original.len() {
        return Err("record count changed".to_owned());
    }
    let mut removed = 0;
    for (before, after) in original.iter().zip(&plan.processes) {
        if before.id != after.id || before.holding != after.holding {
            return Err(format!("record {} changed beyond its requests", before.id));
        }
        if !before.requesting.starts_with(&after.requesting) {
            return Err(format!(
                "requests of {} are not a prefix of the original",
                before.id
            ));
        }
        removed += before.requesting.len() - after.requesting.len();
    }
    if removed != plan.steps.len() {
        return Err(format!(
            "{removed} requests removed over {} steps",
            plan.steps.len()
        ));
    }
    if detect(&plan.processes) != plan.result {
        return Err("stored result differs from re-detection".to_owned());
    }
    Ok(())
}
