// schedule.rs — Dependency ordering for normalized logic graphs
//
// Produces the evaluation order the firmware executes each cycle: every
// node after all the producers it reads. Kahn's algorithm, seeded in node
// declaration order and expanded in edge order, so that nodes which become
// ready together keep a stable relative order.
//
// Preconditions: `graph` is a valid (normally fan-in-normalized) `Graph`.
// Postconditions: returns a `DependencyOrder` containing every node exactly
//                 once, with every edge pointing forward.
// Failure modes: a cycle leaves nodes unplaced → `CompileError::Cycle`.
// Side effects: none.

use std::collections::VecDeque;

use crate::error::CompileError;
use crate::graph::Graph;

// ── Public types ────────────────────────────────────────────────────────────

/// Total evaluation order over node indices of the graph it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOrder {
    pub order: Vec<usize>,
}

impl DependencyOrder {
    /// Node ids in evaluation order.
    pub fn ids<'g>(&self, graph: &'g Graph) -> Vec<&'g str> {
        self.order
            .iter()
            .map(|&i| graph.node(i).id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ── Verification ─────────────────────────────────────────────────────────────

/// Machine-checkable evidence for ordering postconditions (O1-O2).
#[derive(Debug, Clone)]
pub struct OrderCert {
    /// O1: every graph node appears exactly once.
    pub o1_all_nodes_once: bool,
    /// O2: every edge's source precedes its target.
    pub o2_edges_forward: bool,
}

impl crate::pass::StageCert for OrderCert {
    fn all_pass(&self) -> bool {
        self.o1_all_nodes_once && self.o2_edges_forward
    }

    fn obligations(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("O1_all_nodes_once", self.o1_all_nodes_once),
            ("O2_edges_forward", self.o2_edges_forward),
        ]
    }
}

pub fn verify_order(order: &DependencyOrder, graph: &Graph) -> OrderCert {
    let n = graph.nodes().len();
    let mut rank = vec![usize::MAX; n];
    let mut o1 = order.order.len() == n;
    for (pos, &idx) in order.order.iter().enumerate() {
        if idx >= n || rank[idx] != usize::MAX {
            o1 = false;
            break;
        }
        rank[idx] = pos;
    }

    let o2 = o1
        && (0..graph.edges().len()).all(|e| {
            let (src, dst) = graph.link(e);
            rank[src] < rank[dst]
        });

    OrderCert {
        o1_all_nodes_once: o1,
        o2_edges_forward: o2,
    }
}

// ── Topological sort (Kahn's algorithm) ─────────────────────────────────────

/// Compute the dependency order, or report the nodes caught in cycles.
pub fn dependency_order(graph: &Graph) -> Result<DependencyOrder, CompileError> {
    let adj = graph.adjacency();
    let mut in_degree: Vec<usize> = (0..graph.nodes().len())
        .map(|i| adj.in_degree(i))
        .collect();

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &deg)| deg == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(graph.nodes().len());
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &adj.successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < graph.nodes().len() {
        let unplaced: Vec<String> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg > 0)
            .map(|(i, _)| graph.node(i).id.clone())
            .collect();
        tracing::debug!(unplaced = ?unplaced, "dependency order incomplete");
        return Err(CompileError::Cycle { unplaced });
    }

    Ok(DependencyOrder { order })
}

// ── Tests ───────────────────────────────────────────────────────────────────
