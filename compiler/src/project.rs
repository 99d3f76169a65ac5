// project.rs — Editor project document loading
//
// Deserializes the editor's saved JSON (nodes, edges, board) and converts it
// into a validated `Graph`. Layout fields the editor stores alongside
// (positions, sizes, selection state, labels) are ignored.
//
// Preconditions: none.
// Postconditions: returns a `LoadedProject` whose graph preserves the
//                 document's node and edge order.
// Failure modes: malformed JSON, unknown node type, unparsable pin or
//                operator, invalid graph structure → `ProjectError`.
// Side effects: none.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::diag::{codes, Diagnostic};
use crate::error::ProjectError;
use crate::graph::{Comparator, Edge, GateOp, Graph, Node, NodeKind, IN_HANDLE, OUT_HANDLE};

// ── Document model ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDoc {
    pub nodes: Vec<NodeDoc>,
    #[serde(default)]
    pub edges: Vec<EdgeDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub data: NodeData,
}

/// Per-node configuration as the editor stores it. Every field is optional;
/// which ones matter depends on the node type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<InitialState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_width: Option<u32>,
}

/// The editor writes pins as strings (`"13"`, `"A0"`); hand-written
/// projects often use numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PinValue {
    Number(u64),
    Label(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialState {
    Flag(bool),
    Level(u32),
}

impl InitialState {
    fn level(self) -> u32 {
        match self {
            InitialState::Flag(b) => u32::from(b),
            InitialState::Level(n) => n,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    #[serde(default = "default_source_handle")]
    pub source_handle: String,
    pub target: String,
    #[serde(default = "default_target_handle")]
    pub target_handle: String,
}

fn default_source_handle() -> String {
    OUT_HANDLE.to_string()
}

fn default_target_handle() -> String {
    IN_HANDLE.to_string()
}

// ── Defaults for unset configuration ────────────────────────────────────────

pub const DEFAULT_RANGE_MIN: u32 = 0;
pub const DEFAULT_RANGE_MAX: u32 = 1023;
pub const DEFAULT_PULSE_MS: u32 = 500;
pub const DEFAULT_INTERVAL_MS: u32 = 1000;
pub const DEFAULT_SHIFT_WIDTH: u32 = 8;

// ── Loading ─────────────────────────────────────────────────────────────────

/// Knobs for loading a project.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Board name overriding the document's `board` field.
    pub board: Option<String>,
}

/// A loaded project: the authored graph plus load-time warnings.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub graph: Graph,
    pub board: Option<Board>,
    pub warnings: Vec<Diagnostic>,
}

/// Parse project JSON and build its graph.
pub fn load(text: &str, options: &LoadOptions) -> Result<LoadedProject, ProjectError> {
    let doc: ProjectDoc = serde_json::from_str(text)?;
    from_doc(&doc, options)
}

pub fn from_doc(doc: &ProjectDoc, options: &LoadOptions) -> Result<LoadedProject, ProjectError> {
    let mut warnings = Vec::new();

    let board_name = options.board.as_deref().or(doc.board.as_deref());
    let board = match board_name {
        Some(name) => {
            let board = Board::from_name(name);
            if board.is_none() {
                warnings.push(Diagnostic::warning(
                    codes::W0001,
                    format!("unknown board '{name}'; pin labels will not be resolved"),
                ));
            }
            board
        }
        None => None,
    };

    let mut nodes = Vec::with_capacity(doc.nodes.len());
    for node_doc in &doc.nodes {
        let kind = node_kind(node_doc, board)?;
        if let (Some(pin), Some(board)) = (kind.pin(), board) {
            if pin >= board.pin_count() {
                warnings.push(
                    Diagnostic::warning(
                        codes::W0002,
                        format!("pin {pin} does not exist on {}", board.name()),
                    )
                    .with_node(node_doc.id.clone()),
                );
            }
        }
        nodes.push(Node::new(node_doc.id.clone(), kind));
    }

    let edges = doc
        .edges
        .iter()
        .map(|e| Edge {
            source: e.source.clone(),
            source_handle: e.source_handle.clone(),
            target: e.target.clone(),
            target_handle: e.target_handle.clone(),
        })
        .collect();

    let graph = Graph::new(nodes, edges)?;
    tracing::debug!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        board = board.map(Board::name),
        "project loaded"
    );

    Ok(LoadedProject {
        graph,
        board,
        warnings,
    })
}

fn node_kind(doc: &NodeDoc, board: Option<Board>) -> Result<NodeKind, ProjectError> {
    let data = &doc.data;
    let gate = |op| NodeKind::Gate {
        op,
        fan_in: data.inputs.unwrap_or(2),
    };
    let initial = data.initial_state.map(InitialState::level).unwrap_or(0);

    let kind = match doc.node_type.as_str() {
        "inputNode" => NodeKind::DigitalInput {
            pin: resolve_pin(doc, board)?,
        },
        "outputNode" => NodeKind::DigitalOutput {
            pin: resolve_pin(doc, board)?,
        },
        "andNode" => gate(GateOp::And),
        "orNode" => gate(GateOp::Or),
        "nandNode" => gate(GateOp::Nand),
        "norNode" => gate(GateOp::Nor),
        "xorNode" => gate(GateOp::Xor),
        "notNode" => NodeKind::Not,
        "latchNode" => NodeKind::Latch {
            initial: initial != 0,
        },
        "pulseNode" | "timerNode" => NodeKind::PulseTimer {
            pulse_ms: data.pulse_ms.unwrap_or(DEFAULT_PULSE_MS),
            interval_ms: data.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS),
        },
        "toggleNode" => NodeKind::Toggle {
            initial: initial != 0,
        },
        "analogRangeNode" => NodeKind::AnalogRange {
            min: data.min.unwrap_or(DEFAULT_RANGE_MIN),
            max: data.max.unwrap_or(DEFAULT_RANGE_MAX),
        },
        "analogCompareNode" => {
            let comparator = match data.operator.as_deref() {
                None => Comparator::Gt,
                Some(op) => {
                    Comparator::from_symbol(op).ok_or_else(|| ProjectError::InvalidOperator {
                        node: doc.id.clone(),
                        operator: op.to_string(),
                    })?
                }
            };
            NodeKind::AnalogCompare { comparator }
        }
        "shiftRegisterNode" => NodeKind::ShiftRegister {
            width: data.output_width.unwrap_or(DEFAULT_SHIFT_WIDTH),
            initial,
        },
        other => {
            return Err(ProjectError::UnknownNodeType {
                node: doc.id.clone(),
                type_tag: other.to_string(),
            })
        }
    };
    Ok(kind)
}

/// Empty or absent pins leave the node unrouted.
fn resolve_pin(doc: &NodeDoc, board: Option<Board>) -> Result<Option<u32>, ProjectError> {
    let invalid = |pin: String| ProjectError::InvalidPin {
        node: doc.id.clone(),
        pin,
    };
    match &doc.data.pin {
        None => Ok(None),
        Some(PinValue::Number(n)) => u32::try_from(*n)
            .map(Some)
            .map_err(|_| invalid(n.to_string())),
        Some(PinValue::Label(label)) => {
            let label = label.trim();
            if label.is_empty() {
                return Ok(None);
            }
            if let Ok(n) = label.parse::<u32>() {
                return Ok(Some(n));
            }
            board
                .and_then(|b| b.analog_pin(label))
                .map(Some)
                .ok_or_else(|| invalid(label.to_string()))
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    fn load_ok(text: &str) -> LoadedProject {
        load(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn editor_layout_fields_are_ignored() {
        let p = load_ok(
            r#"{
                "nodes": [
                    {"id": "n1", "type": "inputNode", "position": {"x": 1.5, "y": 2},
                     "data": {"label": "inputNode", "inputs": 2, "selectedBoard": "arduino_nano", "pin": "2"},
                     "width": 97, "height": 59, "selected": false, "dragging": false}
                ],
                "edges": [],
                "board": "arduino_nano"
            }"#,
        );
        assert_eq!(
            p.graph.node(0).kind,
            NodeKind::DigitalInput { pin: Some(2) }
        );
        assert_eq!(p.board, Some(Board::ArduinoNano));
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn every_type_tag_loads() {
        let p = load_ok(
            r#"{"nodes": [
                {"id": "a", "type": "inputNode", "data": {"pin": 3}},
                {"id": "b", "type": "outputNode", "data": {"pin": "13"}},
                {"id": "c", "type": "andNode", "data": {"inputs": 4}},
                {"id": "d", "type": "orNode"},
                {"id": "e", "type": "nandNode"},
                {"id": "f", "type": "norNode"},
                {"id": "g", "type": "xorNode"},
                {"id": "h", "type": "notNode"},
                {"id": "i", "type": "latchNode", "data": {"initialState": true}},
                {"id": "j", "type": "pulseNode", "data": {"pulseMs": 100}},
                {"id": "k", "type": "toggleNode", "data": {"initialState": 1}},
                {"id": "l", "type": "analogRangeNode", "data": {"min": 600}},
                {"id": "m", "type": "analogCompareNode", "data": {"operator": "<="}},
                {"id": "n", "type": "shiftRegisterNode", "data": {"outputWidth": 4}},
                {"id": "o", "type": "timerNode"}
            ]}"#,
        );
        let kinds: Vec<&NodeKind> = p.graph.nodes().iter().map(|n| &n.kind).collect();
        assert_eq!(kinds[0], &NodeKind::DigitalInput { pin: Some(3) });
        assert_eq!(kinds[1], &NodeKind::DigitalOutput { pin: Some(13) });
        assert_eq!(
            kinds[2],
            &NodeKind::Gate {
                op: GateOp::And,
                fan_in: 4
            }
        );
        assert_eq!(kinds[7], &NodeKind::Not);
        assert_eq!(kinds[8], &NodeKind::Latch { initial: true });
        assert_eq!(
            kinds[9],
            &NodeKind::PulseTimer {
                pulse_ms: 100,
                interval_ms: DEFAULT_INTERVAL_MS
            }
        );
        assert_eq!(kinds[10], &NodeKind::Toggle { initial: true });
        assert_eq!(kinds[11], &NodeKind::AnalogRange { min: 600, max: 1023 });
        assert_eq!(
            kinds[12],
            &NodeKind::AnalogCompare {
                comparator: Comparator::Le
            }
        );
        assert_eq!(
            kinds[13],
            &NodeKind::ShiftRegister {
                width: 4,
                initial: 0
            }
        );
        assert!(matches!(kinds[14], NodeKind::PulseTimer { .. }));
    }

    #[test]
    fn empty_pin_means_unrouted() {
        let p = load_ok(r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": ""}}]}"#);
        assert_eq!(p.graph.node(0).kind, NodeKind::DigitalInput { pin: None });
    }

    #[test]
    fn analog_label_needs_known_board() {
        let text = r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": "A2"}}],
                       "board": "arduino_uno"}"#;
        let p = load_ok(text);
        assert_eq!(p.graph.node(0).kind, NodeKind::DigitalInput { pin: Some(16) });

        let no_board = r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": "A2"}}]}"#;
        let err = load(no_board, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidPin { ref pin, .. } if pin == "A2"));
    }

    #[test]
    fn board_override_wins() {
        let text = r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": "A10"}}],
                       "board": "arduino_nano"}"#;
        let options = LoadOptions {
            board: Some("arduino_mega".into()),
        };
        let p = load(text, &options).unwrap();
        assert_eq!(p.graph.node(0).kind, NodeKind::DigitalInput { pin: Some(64) });
    }

    #[test]
    fn unknown_board_and_out_of_range_pin_warn() {
        let p = load_ok(
            r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": "2"}}], "board": "esp32"}"#,
        );
        assert_eq!(p.warnings[0].code, Some(codes::W0001));

        let p = load_ok(
            r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": "40"}}], "board": "arduino_nano"}"#,
        );
        assert_eq!(p.warnings[0].code, Some(codes::W0002));
        assert_eq!(p.warnings[0].node.as_deref(), Some("a"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = load(
            r#"{"nodes": [{"id": "a", "type": "flipFlopNode"}]}"#,
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::UnknownNodeType { ref type_tag, .. } if type_tag == "flipFlopNode"
        ));
    }

    #[test]
    fn bad_operator_is_rejected() {
        let err = load(
            r#"{"nodes": [{"id": "c", "type": "analogCompareNode", "data": {"operator": "=>"}}]}"#,
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ProjectError::InvalidOperator { .. }));
    }

    #[test]
    fn edge_handles_default() {
        let p = load_ok(
            r#"{"nodes": [{"id": "a", "type": "inputNode", "data": {"pin": 2}},
                          {"id": "o", "type": "outputNode", "data": {"pin": 8}}],
                "edges": [{"source": "a", "target": "o"}]}"#,
        );
        assert_eq!(p.graph.edges()[0], Edge::new("a", "o", "in"));
    }

    #[test]
    fn structural_errors_surface() {
        let err = load(
            r#"{"nodes": [{"id": "a", "type": "notNode"}],
                "edges": [{"source": "a", "target": "missing"}]}"#,
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Graph(GraphError::UnknownEndpoint { .. })
        ));
        assert!(matches!(
            load("{not json", &LoadOptions::default()),
            Err(ProjectError::Json(_))
        ));
    }
}
