/// Cycle enumeration over a [`WaitForGraph`] using three-color DFS.
///
/// Every node starts **white**. The DFS colors a node **gray** while it is on
/// the current path and **black** once all of its outgoing edges have been
/// explored. An edge into a gray node closes a cycle: the path segment from
/// the first occurrence of that node to the current node, plus the node again
/// to close the loop.
///
/// Roots are taken in [`WaitForGraph::roots`] order and black roots are
/// skipped, so each edge is examined once overall and the scan is O(V + E).
/// Black nodes are never re-entered. A cycle that is reachable only through
/// an already-black node was reported when that node was explored, or is not
/// reported separately.
///
/// The traversal is iterative (explicit stack) so a long wait chain cannot
/// overflow the call stack.
use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;

use crate::graph::WaitForGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Enumerates the cycles of `graph`.
///
/// # Returns
///
/// - An empty `Vec` if the graph is acyclic.
/// - Otherwise one `Vec<NodeIndex>` per distinct cycle, in discovery order.
///   Each inner vector lists the cycle in traversal order and repeats the
///   starting node at the end (closed form). No two returned cycles are
///   rotations of one another.
pub fn detect_cycles(graph: &WaitForGraph) -> Vec<Vec<NodeIndex>> {
    let mut color: HashMap<NodeIndex, Color> = HashMap::with_capacity(graph.node_count());
    let mut cycles: Vec<Vec<NodeIndex>> = Vec::new();
    let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
    let mut back_edges: usize = 0;

    for root in graph.roots() {
        if color.get(&root).copied().unwrap_or(Color::White) != Color::White {
            continue;
        }

        // Each stack frame: (node, ordered successors, next successor index).
        // `path` mirrors the gray nodes on the stack, root first.
        let mut path: Vec<NodeIndex> = vec![root];
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> =
            vec![(root, graph.successors(root), 0)];
        color.insert(root, Color::Gray);

        while let Some(frame) = stack.last_mut() {
            let (node, children, child_idx) = frame;
            let node = *node;

            if *child_idx >= children.len() {
                stack.pop();
                path.pop();
                color.insert(node, Color::Black);
                continue;
            }

            let child = children[*child_idx];
            *child_idx += 1;

            match color.get(&child).copied().unwrap_or(Color::White) {
                Color::White => {
                    color.insert(child, Color::Gray);
                    path.push(child);
                    stack.push((child, graph.successors(child), 0));
                }
                Color::Gray => {
                    back_edges += 1;
                    if let Some(start) = path.iter().position(|&n| n == child) {
                        let mut cycle: Vec<NodeIndex> = path[start..].to_vec();
                        cycle.push(child);
                        if seen.insert(rotation_key(&cycle)) {
                            cycles.push(cycle);
                        }
                    }
                }
                Color::Black => {}
            }
        }
    }

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        back_edges,
        cycles = cycles.len(),
        "cycle scan complete"
    );
    cycles
}

/// Returns `true` if `cycle` is a well-formed closed walk in `graph`: at
/// least two entries, first equals last, and every consecutive pair is
/// joined by an edge.
pub fn is_valid_cycle(graph: &WaitForGraph, cycle: &[NodeIndex]) -> bool {
    cycle.len() >= 2
        && cycle.first() == cycle.last()
        && cycle.windows(2).all(|w| graph.has_edge(w[0], w[1]))
}

// ---------------------------------------------------------------------------
// Internal: rotation-invariant identity
// ---------------------------------------------------------------------------

/// Canonical form of a closed cycle: the open sequence rotated so that its
/// smallest node index comes first.
///
/// Two cycles are duplicates iff they traverse the same nodes in the same
/// cyclic order, whatever node the DFS happened to enter them at.
pub(crate) fn rotation_key(cycle: &[NodeIndex]) -> Vec<NodeIndex> {
    let open = match cycle.split_last() {
        Some((last, rest)) if cycle.len() > 1 && Some(last) == cycle.first() => rest,
        Some(_) | None => cycle,
    };
    let Some(min_pos) = open
        .iter()
        .enumerate()
        .min_by_key(|&(_, idx)| *idx)
        .map(|(pos, _)| pos)
    else {
        return Vec::new();
    };
    open[min_pos..]
        .iter()
        .chain(open[..min_pos].iter())
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
