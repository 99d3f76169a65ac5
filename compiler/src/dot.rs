// dot.rs — Graphviz DOT output for logic graphs
//
// Transforms a Graph (usually the normalized one) into DOT format suitable
// for rendering with `dot` or other Graphviz layout engines.
//
// Preconditions: `graph` is a constructed Graph; `slots`, when given, was
//                allocated for it.
// Postconditions: returns a valid DOT string representing the graph.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::{self, Write};

use crate::graph::{Graph, NodeKind};
use crate::slots::SlotMap;

/// Emit the graph as a Graphviz DOT string.
pub fn emit_dot(graph: &Graph, slots: Option<&SlotMap>) -> String {
    let mut buf = String::new();
    let _ = write_dot(&mut buf, graph, slots);
    buf
}

fn write_dot(buf: &mut String, graph: &Graph, slots: Option<&SlotMap>) -> fmt::Result {
    writeln!(buf, "digraph logic {{")?;
    writeln!(buf, "    rankdir=LR;")?;
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];")?;
    writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];")?;
    writeln!(buf)?;

    for (idx, node) in graph.nodes().iter().enumerate() {
        let mut label = format!("{}\\n{}", escape(&node.id), node_detail(&node.kind));
        if let Some(slot) = slots.and_then(|s| s.get(idx)) {
            write!(label, "\\nv{slot}")?;
        }
        let shape = match node.kind {
            NodeKind::DigitalInput { .. } => "invhouse",
            NodeKind::DigitalOutput { .. } => "house",
            _ => "box",
        };
        let style = if node.synthetic { ", style=dashed" } else { "" };
        writeln!(buf, "    n{idx} [label=\"{label}\", shape={shape}{style}];")?;
    }

    if !graph.edges().is_empty() {
        writeln!(buf)?;
    }
    for (e, edge) in graph.edges().iter().enumerate() {
        let (src, dst) = graph.link(e);
        writeln!(
            buf,
            "    n{src} -> n{dst} [label=\"{}\"];",
            escape(&edge.target_handle)
        )?;
    }

    writeln!(buf, "}}")
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Type name plus the configuration worth seeing on the canvas.
fn node_detail(kind: &NodeKind) -> String {
    let name = kind.type_name();
    match kind {
        NodeKind::DigitalInput { pin } | NodeKind::DigitalOutput { pin } => match pin {
            Some(p) => format!("{name} pin {p}"),
            None => format!("{name} (no pin)"),
        },
        NodeKind::AnalogRange { min, max } => format!("{name} [{min}, {max}]"),
        NodeKind::AnalogCompare { comparator } => {
            format!("{name} {}", escape(comparator.symbol()))
        }
        NodeKind::PulseTimer {
            pulse_ms,
            interval_ms,
        } => format!("{name} {pulse_ms}/{interval_ms}ms"),
        _ => name.to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Tests ──────────────────────────────────────────────────────────────────
