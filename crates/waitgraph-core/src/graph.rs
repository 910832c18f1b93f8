/// Resource-allocation graph construction using `petgraph`.
///
/// [`build_graph`] turns an ordered process snapshot into a directed
/// bipartite [`WaitForGraph`]:
///
/// - `Resource → Process` ([`EdgeKind::HeldBy`]) for every held resource;
/// - `Process → Resource` ([`EdgeKind::WaitsFor`]) for every pending request.
///
/// # Three-Pass Construction
///
/// 1. **Process pass**: one node per process, in input order.
/// 2. **Resource pass**: one node per distinct resource, in order of first
///    appearance (holding before requesting within each process).
/// 3. **Edge pass**: hold edges, then request edges in request order.
///
/// Node indices therefore encode a deterministic root order for the cycle
/// detector, and the edge index of a process's request edges follows its
/// request order. [`WaitForGraph::successors`] relies on the latter.
///
/// Construction is total. Inputs that would be faults elsewhere are absorbed:
/// a self-request yields no edge, a repeated request yields one edge, and a
/// duplicate process id reuses the first node.
pub mod cycles;

use std::collections::HashMap;
use std::fmt;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::newtypes::{ProcessId, ResourceId};
use crate::snapshot::ProcessSnapshot;

// ---------------------------------------------------------------------------
// Weight types
// ---------------------------------------------------------------------------

/// A node of the resource-allocation graph.
///
/// Identity is the pair (kind, id): a process and a resource that happen to
/// share the same id string are different nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum GraphNode {
    /// A process node.
    Process(ProcessId),
    /// A resource node.
    Resource(ResourceId),
}

impl GraphNode {
    /// The display label of the node: its raw id string.
    pub fn label(&self) -> &str {
        match self {
            Self::Process(id) => id.as_str(),
            Self::Resource(id) => id.as_str(),
        }
    }

    /// Returns the process id if this is a process node.
    pub fn as_process(&self) -> Option<&ProcessId> {
        match self {
            Self::Process(id) => Some(id),
            Self::Resource(_) => None,
        }
    }

    /// Returns the resource id if this is a resource node.
    pub fn as_resource(&self) -> Option<&ResourceId> {
        match self {
            Self::Process(_) => None,
            Self::Resource(id) => Some(id),
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weight stored on each graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// `Resource → Process`: the resource is held by the process.
    HeldBy,
    /// `Process → Resource`: the process is waiting for the resource.
    WaitsFor,
}

// ---------------------------------------------------------------------------
// WaitForGraph
// ---------------------------------------------------------------------------

/// A directed bipartite graph of processes and resources.
///
/// Wraps a `petgraph` [`StableDiGraph`] and keeps a `HashMap` from
/// [`GraphNode`] to [`NodeIndex`] for O(1) lookup by id.
///
/// Construct with [`build_graph`].
#[derive(Debug, Default)]
pub struct WaitForGraph {
    graph: StableDiGraph<GraphNode, EdgeKind>,
    index: HashMap<GraphNode, NodeIndex>,
    process_count: usize,
}

impl WaitForGraph {
    /// Returns the number of nodes (processes plus resources).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the number of distinct process nodes.
    pub fn process_count(&self) -> usize {
        self.process_count
    }

    /// Returns the number of distinct resource nodes.
    pub fn resource_count(&self) -> usize {
        self.graph.node_count() - self.process_count
    }

    /// Looks up the index of `node`.
    pub fn node_index(&self, node: &GraphNode) -> Option<NodeIndex> {
        self.index.get(node).copied()
    }

    /// Looks up the index of the process node with the given id.
    pub fn process_index(&self, id: &ProcessId) -> Option<NodeIndex> {
        self.node_index(&GraphNode::Process(id.clone()))
    }

    /// Looks up the index of the resource node with the given id.
    pub fn resource_index(&self, id: &ResourceId) -> Option<NodeIndex> {
        self.node_index(&GraphNode::Resource(id.clone()))
    }

    /// Returns the [`GraphNode`] stored at `idx`.
    pub fn node_weight(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    /// Returns the [`EdgeKind`] stored at `idx`.
    pub fn edge_weight(&self, idx: EdgeIndex) -> Option<&EdgeKind> {
        self.graph.edge_weight(idx)
    }

    /// Returns `true` if there is an edge `from → to`.
    pub fn has_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph.find_edge(from, to).is_some()
    }

    /// All node indices in creation order: processes in input order, then
    /// resources in first-appearance order.
    ///
    /// This is the root order the cycle detector uses.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    /// Successors of `node` in edge-insertion order.
    ///
    /// `petgraph` iterates outgoing edges newest-first; sorting by edge index
    /// restores insertion order, so a process's successors follow its request
    /// order.
    pub fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges(node)
            .map(|e| (e.id(), e.target()))
            .collect();
        out.sort_unstable_by_key(|&(edge, _)| edge);
        out.into_iter().map(|(_, target)| target).collect()
    }

    /// Maps a sequence of indices to their display labels, skipping any
    /// index that no longer refers to a node.
    pub fn labels(&self, path: &[NodeIndex]) -> Vec<String> {
        path.iter()
            .filter_map(|&idx| self.node_weight(idx).map(|n| n.label().to_owned()))
            .collect()
    }

    /// Returns a reference to the underlying [`StableDiGraph`].
    pub fn graph(&self) -> &StableDiGraph<GraphNode, EdgeKind> {
        &self.graph
    }

    fn intern(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.index.insert(node, idx);
        idx
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Builds the resource-allocation graph for an ordered process snapshot.
///
/// Construction is O(P + H + Q) for P processes, H holdings and Q requests.
/// The input is never mutated and the returned graph is owned by the caller.
pub fn build_graph(processes: &[ProcessSnapshot]) -> WaitForGraph {
    let holding_total: usize = processes.iter().map(|p| p.holding.len()).sum();
    let request_total: usize = processes.iter().map(|p| p.requesting.len()).sum();

    let mut g = WaitForGraph {
        graph: StableDiGraph::with_capacity(
            processes.len() + holding_total + request_total,
            holding_total + request_total,
        ),
        index: HashMap::with_capacity(processes.len() + holding_total),
        process_count: 0,
    };

    // Pass 1: process nodes.
    let mut process_nodes: Vec<NodeIndex> = Vec::with_capacity(processes.len());
    for p in processes {
        let key = GraphNode::Process(p.id.clone());
        if g.index.contains_key(&key) {
            tracing::warn!(process = %p.id, "duplicate process id; merging into first occurrence");
        } else {
            g.process_count += 1;
        }
        process_nodes.push(g.intern(key));
    }

    // Pass 2: resource nodes in first-appearance order.
    for p in processes {
        for r in p.holding.iter().chain(p.requesting.iter()) {
            g.intern(GraphNode::Resource(r.clone()));
        }
    }

    // Pass 3: edges.
    for (p, &p_idx) in processes.iter().zip(&process_nodes) {
        for r in &p.holding {
            if let Some(r_idx) = g.resource_index(r) {
                if !g.has_edge(r_idx, p_idx) {
                    tracing::trace!(resource = %r, process = %p.id, "held by");
                    g.graph.add_edge(r_idx, p_idx, EdgeKind::HeldBy);
                }
            }
        }
        for r in &p.requesting {
            if p.holds(r) {
                tracing::trace!(process = %p.id, resource = %r, "self-request ignored");
                continue;
            }
            if let Some(r_idx) = g.resource_index(r) {
                if !g.has_edge(p_idx, r_idx) {
                    tracing::trace!(process = %p.id, resource = %r, "waits for");
                    g.graph.add_edge(p_idx, r_idx, EdgeKind::WaitsFor);
                }
            }
        }
    }

    tracing::debug!(
        processes = g.process_count(),
        resources = g.resource_count(),
        edges = g.edge_count(),
        "built wait-for graph"
    );
    g
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
