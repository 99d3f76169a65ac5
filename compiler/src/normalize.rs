// normalize.rs — Fan-in normalization
//
// Rewrites the graph so that every (node, input handle) pair is driven by at
// most one edge. Where the author wired several producers into one handle,
// an OR node is synthesized and the producers are rewired to its positional
// inputs in source-id order. All edges into an output node count as one
// handle.
//
// Preconditions: `graph` is a valid `Graph`.
// Postconditions: returns a new graph with fan-in ≤ 1 on every handle; the
//                 authored nodes keep their order and come first, synthetic
//                 OR nodes follow; untouched edges keep their relative order.
// Failure modes: none.
// Side effects: none.

use std::collections::{HashMap, HashSet};

use crate::graph::{Edge, GateOp, Graph, Node, NodeKind, IN_HANDLE};

// ── Public types ────────────────────────────────────────────────────────────

/// One synthesized OR node and the edges it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRecord {
    pub node: String,
    pub target: String,
    pub handle: String,
    /// Producers feeding the merge, in `in0..` order.
    pub sources: Vec<String>,
}

/// Result of normalization.
#[derive(Debug, Clone)]
pub struct NormalizedGraph {
    pub graph: Graph,
    pub merges: Vec<MergeRecord>,
}

// ── Verification ─────────────────────────────────────────────────────────────

/// Machine-checkable evidence that normalization's postcondition holds.
#[derive(Debug, Clone)]
pub struct FanInCert {
    /// Every (target, handle) pair, and every output node, has ≤ 1 driver.
    pub single_driver: bool,
    /// Every synthetic node is an OR gate whose fan-in matches its edges.
    pub merges_consistent: bool,
}

impl crate::pass::StageCert for FanInCert {
    fn all_pass(&self) -> bool {
        self.single_driver && self.merges_consistent
    }

    fn obligations(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("N1_single_driver", self.single_driver),
            ("N2_merges_consistent", self.merges_consistent),
        ]
    }
}

pub fn verify_fan_in(graph: &Graph) -> FanInCert {
    let adj = graph.adjacency();

    let mut seen: HashSet<GroupKey> = HashSet::new();
    let single_driver = graph
        .edges()
        .iter()
        .enumerate()
        .all(|(e, edge)| seen.insert(group_key(graph, e, edge)));

    let merges_consistent = graph.nodes().iter().enumerate().all(|(i, node)| {
        if !node.synthetic {
            return true;
        }
        match node.kind {
            NodeKind::Gate {
                op: GateOp::Or,
                fan_in,
            } => fan_in as usize == adj.in_degree(i),
            _ => false,
        }
    });

    FanInCert {
        single_driver,
        merges_consistent,
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Group key: target index plus handle, with the handle erased for sinks.
type GroupKey = (usize, Option<String>);

fn group_key(graph: &Graph, edge_idx: usize, edge: &Edge) -> GroupKey {
    let (_, target) = graph.link(edge_idx);
    if graph.node(target).kind.is_sink() {
        (target, None)
    } else {
        (target, Some(edge.target_handle.clone()))
    }
}

/// Normalize fan-in, producing a new graph.
pub fn normalize(graph: &Graph) -> NormalizedGraph {
    // Group edges by driven handle, in first-appearance order.
    let mut groups: Vec<(GroupKey, Vec<usize>)> = Vec::new();
    let mut lookup: HashMap<GroupKey, usize> = HashMap::new();
    for (e, edge) in graph.edges().iter().enumerate() {
        let key = group_key(graph, e, edge);
        match lookup.get(&key) {
            Some(&g) => groups[g].1.push(e),
            None => {
                lookup.insert(key.clone(), groups.len());
                groups.push((key, vec![e]));
            }
        }
    }

    let merged: HashSet<usize> = groups
        .iter()
        .filter(|(_, members)| members.len() > 1)
        .flat_map(|(_, members)| members.iter().copied())
        .collect();

    let mut nodes: Vec<Node> = graph.nodes().to_vec();
    let mut edges: Vec<Edge> = graph
        .edges()
        .iter()
        .enumerate()
        .filter(|(e, _)| !merged.contains(e))
        .map(|(_, edge)| edge.clone())
        .collect();
    let mut taken: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut merges = Vec::new();

    for ((target, handle), mut members) in groups.into_iter() {
        if members.len() < 2 {
            continue;
        }
        let target_id = graph.node(target).id.clone();
        let handle = handle.unwrap_or_else(|| IN_HANDLE.to_string());
        let merge_id = fresh_id(&target_id, &handle, &taken);
        taken.insert(merge_id.clone());

        // Stable sort: equal source ids keep authored order.
        members.sort_by(|&a, &b| graph.edges()[a].source.cmp(&graph.edges()[b].source));

        let sources: Vec<String> = members
            .iter()
            .map(|&e| graph.edges()[e].source.clone())
            .collect();
        for (k, source) in sources.iter().enumerate() {
            edges.push(Edge::new(source.clone(), merge_id.clone(), format!("in{k}")));
        }
        edges.push(Edge::new(merge_id.clone(), target_id.clone(), handle.clone()));

        nodes.push(Node {
            id: merge_id.clone(),
            kind: NodeKind::Gate {
                op: GateOp::Or,
                fan_in: sources.len() as u32,
            },
            synthetic: true,
        });

        tracing::debug!(
            merge = %merge_id,
            target = %target_id,
            handle = %handle,
            fan_in = sources.len(),
            "synthesized OR for implicit fan-in"
        );
        merges.push(MergeRecord {
            node: merge_id,
            target: target_id,
            handle,
            sources,
        });
    }

    let graph = Graph::new(nodes, edges)
        .unwrap_or_else(|e| unreachable!("normalization broke a valid graph: {e}"));
    NormalizedGraph { graph, merges }
}

/// Derive the merge node id from its target and handle, suffixing on collision.
fn fresh_id(target: &str, handle: &str, taken: &HashSet<String>) -> String {
    let base = format!("{target}.{handle}.or");
    if !taken.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

// ── Tests ───────────────────────────────────────────────────────────────────
