// graph.rs — Typed logic graph model
//
// Nodes are a closed tagged union over the element types the firmware VM
// understands; edges connect a producer's `out` handle to a named or
// positional input handle on the consumer. Node and edge order are
// significant and preserved by every later phase.
//
// Preconditions: none.
// Postconditions: a constructed `Graph` has unique node ids and every edge
//                 endpoint resolves. An edge may leave an output node; its
//                 consumer sees no value from it.
// Failure modes: `GraphError` on any of the above.
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use crate::error::GraphError;

// ── Node configuration ──────────────────────────────────────────────────────

/// The boolean operation of a variable-arity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOp {
    And,
    Or,
    Nand,
    Nor,
    Xor,
}

impl GateOp {
    pub fn name(self) -> &'static str {
        match self {
            GateOp::And => "AND",
            GateOp::Or => "OR",
            GateOp::Nand => "NAND",
            GateOp::Nor => "NOR",
            GateOp::Xor => "XOR",
        }
    }
}

/// Comparison performed by an analog-compare node on its `a` and `b` inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Comparator {
    /// Parse the editor's operator spelling (`>`, `>=`, `<`, `<=`, `==`, `!=`).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            ">" => Some(Comparator::Gt),
            ">=" | "≥" => Some(Comparator::Ge),
            "<" => Some(Comparator::Lt),
            "<=" | "≤" => Some(Comparator::Le),
            "==" | "=" => Some(Comparator::Eq),
            "!=" | "≠" => Some(Comparator::Ne),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }
}

/// The kind of a graph node, with its type-specific configuration.
///
/// Numeric fields are kept wide here; the emitter range-checks them against
/// the byte/word operand they are encoded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A physical input pin. `pin: None` leaves the node unrouted.
    DigitalInput { pin: Option<u32> },
    /// A physical output pin; the only pure sink.
    DigitalOutput { pin: Option<u32> },
    /// Variable-arity boolean gate. `fan_in` is the authored handle count.
    Gate { op: GateOp, fan_in: u32 },
    Not,
    /// Set/reset latch.
    Latch { initial: bool },
    /// Free-running pulse generator (no graph inputs).
    PulseTimer { pulse_ms: u32, interval_ms: u32 },
    /// Flips its output on every rising edge of its input.
    Toggle { initial: bool },
    /// True while the analog input lies within `[min, max]`.
    AnalogRange { min: u32, max: u32 },
    AnalogCompare { comparator: Comparator },
    ShiftRegister { width: u32, initial: u32 },
}

impl NodeKind {
    /// Output nodes consume a value but never produce one.
    pub fn is_sink(&self) -> bool {
        matches!(self, NodeKind::DigitalOutput { .. })
    }

    /// Nodes whose presence downstream switches an input to analog reads.
    pub fn is_analog(&self) -> bool {
        matches!(
            self,
            NodeKind::AnalogRange { .. } | NodeKind::AnalogCompare { .. }
        )
    }

    /// Configured pin, for I/O nodes.
    pub fn pin(&self) -> Option<u32> {
        match self {
            NodeKind::DigitalInput { pin } | NodeKind::DigitalOutput { pin } => *pin,
            _ => None,
        }
    }

    /// Short type name used in logs, listings, and DOT labels.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::DigitalInput { .. } => "input",
            NodeKind::DigitalOutput { .. } => "output",
            NodeKind::Gate { op, .. } => op.name(),
            NodeKind::Not => "NOT",
            NodeKind::Latch { .. } => "latch",
            NodeKind::PulseTimer { .. } => "pulse",
            NodeKind::Toggle { .. } => "toggle",
            NodeKind::AnalogRange { .. } => "analog-range",
            NodeKind::AnalogCompare { .. } => "analog-compare",
            NodeKind::ShiftRegister { .. } => "shift-register",
        }
    }
}

// ── Nodes and edges ─────────────────────────────────────────────────────────

/// Output handle name every producer exposes.
pub const OUT_HANDLE: &str = "out";

/// Default input handle name (single-input nodes and sinks).
pub const IN_HANDLE: &str = "in";

/// A node in the logic graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// True for OR nodes created by fan-in normalization.
    pub synthetic: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            synthetic: false,
        }
    }
}

/// A directed edge from a producer's output to a consumer's input handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub source_handle: String,
    pub target: String,
    pub target_handle: String,
}

impl Edge {
    /// Edge from `source`'s `out` handle to `target`'s `target_handle`.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_handle: OUT_HANDLE.to_string(),
            target: target.into(),
            target_handle: target_handle.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.source, self.source_handle, self.target, self.target_handle
        )
    }
}

// ── Graph ───────────────────────────────────────────────────────────────────

/// A validated logic graph. Node indices (`usize`) are positions in `nodes()`.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
    /// Resolved (source, target) node indices, parallel to `edges`.
    links: Vec<(usize, usize)>,
}

impl Graph {
    /// Validate and build a graph from ordered node and edge lists.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut links = Vec::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            let src = *index
                .get(&edge.source)
                .ok_or_else(|| GraphError::UnknownEndpoint {
                    edge: i,
                    node: edge.source.clone(),
                })?;
            let dst = *index
                .get(&edge.target)
                .ok_or_else(|| GraphError::UnknownEndpoint {
                    edge: i,
                    node: edge.target.clone(),
                })?;
            links.push((src, dst));
        }

        Ok(Self {
            nodes,
            edges,
            index,
            links,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Index of the node with `id`, if present.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Resolved (source, target) indices of edge `edge`.
    pub fn link(&self, edge: usize) -> (usize, usize) {
        self.links[edge]
    }

    /// Successor lists and incoming-edge lists, both in edge order.
    pub fn adjacency(&self) -> Adjacency {
        let mut successors = vec![Vec::new(); self.nodes.len()];
        let mut incoming = vec![Vec::new(); self.nodes.len()];
        for (e, &(src, dst)) in self.links.iter().enumerate() {
            successors[src].push(dst);
            incoming[dst].push(e);
        }
        Adjacency {
            successors,
            incoming,
        }
    }
}

/// Per-node neighbour lists derived from a `Graph`.
///
/// A node appears once per edge in `successors`, so parallel edges between
/// the same pair are counted individually.
#[derive(Debug, Clone)]
pub struct Adjacency {
    /// Target node index of every outgoing edge, per node.
    pub successors: Vec<Vec<usize>>,
    /// Edge index of every incoming edge, per node.
    pub incoming: Vec<Vec<usize>>,
}

impl Adjacency {
    pub fn in_degree(&self, node: usize) -> usize {
        self.incoming[node].len()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
