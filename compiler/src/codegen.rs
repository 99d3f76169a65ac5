// codegen.rs — Bytecode emission for the firmware VM
//
// Walks the dependency order and encodes one instruction per live node,
// after a pin-mode preamble in authored node order.
//
// Preconditions: `graph` is fan-in-normalized; `order` and `slots` were
//                computed from it.
// Postconditions: returns a `Program` whose bytes decode as a sequence of
//                 whole instructions (see `disasm`).
// Failure modes: an operand exceeding its byte/word field
//                → `CompileError::OperandRange`.
// Side effects: none.
//
// Under-specified nodes (no pin, too few inputs, missing named handle) emit
// nothing. A node whose every consumer is dead is dead itself.

use std::collections::HashSet;

use crate::error::CompileError;
use crate::graph::{Adjacency, Graph, NodeKind};
use crate::opcode::{Opcode, UNCONNECTED};
use crate::schedule::DependencyOrder;
use crate::slots::SlotMap;

// ── Public types ────────────────────────────────────────────────────────────

/// A compiled program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub bytes: Vec<u8>,
    /// Number of variable slots the firmware must reserve.
    pub slot_count: usize,
    /// Byte offset where the per-cycle body starts (end of the preamble).
    pub body_offset: usize,
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub fn codegen(
    graph: &Graph,
    order: &DependencyOrder,
    slots: &SlotMap,
) -> Result<Program, CompileError> {
    let adj = graph.adjacency();
    let live = liveness(graph, &adj, order);
    let mut emitter = Emitter {
        graph,
        adj: &adj,
        slots,
        live: &live,
        out: Vec::new(),
    };

    emitter.emit_preamble()?;
    let body_offset = emitter.out.len();
    for &idx in &order.order {
        if !live[idx] {
            tracing::debug!(node = %graph.node(idx).id, "dead node, nothing emitted");
            continue;
        }
        emitter.emit_node(idx)?;
    }

    Ok(Program {
        bytes: emitter.out,
        slot_count: slots.len(),
        body_offset,
    })
}

// ── Liveness ────────────────────────────────────────────────────────────────

/// A node is dead when it is an unrouted I/O node, or when it has consumers
/// and all of them are dead. Visiting in reverse dependency order sees every
/// consumer before its producers.
fn liveness(graph: &Graph, adj: &Adjacency, order: &DependencyOrder) -> Vec<bool> {
    let mut live = vec![false; graph.nodes().len()];
    for &idx in order.order.iter().rev() {
        live[idx] = match &graph.node(idx).kind {
            NodeKind::DigitalOutput { pin } => pin.is_some(),
            NodeKind::DigitalInput { pin: None } => false,
            _ => {
                let succ = &adj.successors[idx];
                succ.is_empty() || succ.iter().any(|&s| live[s])
            }
        };
    }
    live
}

// ── Emitter ─────────────────────────────────────────────────────────────────

struct Emitter<'a> {
    graph: &'a Graph,
    adj: &'a Adjacency,
    slots: &'a SlotMap,
    live: &'a [bool],
    out: Vec<u8>,
}

impl Emitter<'_> {
    fn emit_preamble(&mut self) -> Result<(), CompileError> {
        let graph = self.graph;
        for (idx, node) in graph.nodes().iter().enumerate() {
            if node.synthetic || !self.live[idx] {
                continue;
            }
            let op = match node.kind {
                NodeKind::DigitalInput { pin: Some(_) } => Opcode::SetPinModeInput,
                NodeKind::DigitalOutput { pin: Some(_) } => Opcode::SetPinModeOutput,
                _ => continue,
            };
            let pin = self.pin(idx)?;
            self.push(op, &[pin]);
        }
        Ok(())
    }

    fn emit_node(&mut self, idx: usize) -> Result<(), CompileError> {
        let graph = self.graph;
        let node = graph.node(idx);

        // Every producer has a slot after allocation; outputs never do.
        match (&node.kind, self.slots.get(idx)) {
            (NodeKind::DigitalOutput { .. }, _) => {
                let pin = self.pin(idx)?;
                let source = self.input_slots(idx).first().copied().unwrap_or(0);
                self.push(Opcode::WritePin, &[pin, source]);
            }
            (_, None) => {}
            (NodeKind::DigitalInput { .. }, Some(out)) => {
                let pin = self.pin(idx)?;
                let op = if self.reaches_analog(idx) {
                    Opcode::ReadAnalogPin
                } else {
                    Opcode::ReadPin
                };
                self.push(op, &[pin, out]);
            }
            (NodeKind::Gate { op, .. }, Some(out)) => {
                let inputs = self.input_slots(idx);
                if inputs.len() < 2 {
                    return self.skip(idx, "gate needs at least two inputs");
                }
                let count = self.byte(idx, "input count", inputs.len() as u64)?;
                let mut operands = Vec::with_capacity(inputs.len() + 2);
                operands.push(count);
                operands.extend_from_slice(&inputs);
                operands.push(out);
                self.push(Opcode::from(*op), &operands);
            }
            (NodeKind::Not, Some(out)) => match self.input_slots(idx).first() {
                Some(&input) => self.push(Opcode::Not, &[input, out]),
                None => return self.skip(idx, "no input"),
            },
            (NodeKind::Latch { initial }, Some(out)) => {
                match (self.handle_slot(idx, "set"), self.handle_slot(idx, "reset")) {
                    (Some(set), Some(reset)) => {
                        self.push(Opcode::Latch, &[set, reset, out, u8::from(*initial)])
                    }
                    _ => return self.skip(idx, "set and reset must both be connected"),
                }
            }
            (
                NodeKind::PulseTimer {
                    pulse_ms,
                    interval_ms,
                },
                Some(out),
            ) => {
                let [pl, ph] = self.word(idx, "pulse length", *pulse_ms)?;
                let [il, ih] = self.word(idx, "interval", *interval_ms)?;
                self.push(Opcode::Pulse, &[out, pl, ph, il, ih]);
            }
            (NodeKind::Toggle { initial }, Some(out)) => match self.input_slots(idx).first() {
                Some(&input) => self.push(Opcode::Toggle, &[input, out, u8::from(*initial)]),
                None => return self.skip(idx, "no input"),
            },
            (NodeKind::AnalogRange { min, max }, Some(out)) => {
                let Some(&input) = self.input_slots(idx).first() else {
                    return self.skip(idx, "no input");
                };
                let [min_lo, min_hi] = self.word(idx, "min", *min)?;
                let [max_lo, max_hi] = self.word(idx, "max", *max)?;
                self.push(
                    Opcode::AnalogRange,
                    &[input, min_lo, min_hi, max_lo, max_hi, out],
                );
            }
            (NodeKind::AnalogCompare { comparator }, Some(out)) => {
                match (self.handle_slot(idx, "a"), self.handle_slot(idx, "b")) {
                    (Some(a), Some(b)) => self.push(Opcode::from(*comparator), &[a, b, out]),
                    _ => return self.skip(idx, "a and b must both be connected"),
                }
            }
            (NodeKind::ShiftRegister { width, initial }, Some(out)) => {
                let (Some(data), Some(clock)) =
                    (self.handle_slot(idx, "data"), self.handle_slot(idx, "clock"))
                else {
                    return self.skip(idx, "data and clock must both be connected");
                };
                let reset = self.handle_slot(idx, "reset").unwrap_or(UNCONNECTED);
                let width = self.byte(idx, "output width", u64::from(*width))?;
                let initial = self.byte(idx, "initial state", u64::from(*initial))?;
                self.push(
                    Opcode::ShiftRegister,
                    &[data, clock, reset, width, initial, out],
                );
            }
        }
        Ok(())
    }

    // ── Operand helpers ────────────────────────────────────────────────

    fn push(&mut self, op: Opcode, operands: &[u8]) {
        self.out.push(op.byte());
        self.out.extend_from_slice(operands);
    }

    fn skip(&self, idx: usize, reason: &str) -> Result<(), CompileError> {
        tracing::debug!(node = %self.graph.node(idx).id, reason, "under-specified node skipped");
        Ok(())
    }

    /// Slots of the producers driving `idx`, in edge order. Producers without
    /// a slot are dropped.
    fn input_slots(&self, idx: usize) -> Vec<u8> {
        self.adj.incoming[idx]
            .iter()
            .filter_map(|&e| self.slots.get(self.graph.link(e).0))
            .collect()
    }

    /// Slot driving the named handle of `idx`, if connected.
    fn handle_slot(&self, idx: usize, handle: &str) -> Option<u8> {
        self.adj.incoming[idx]
            .iter()
            .find(|&&e| self.graph.edges()[e].target_handle == handle)
            .and_then(|&e| self.slots.get(self.graph.link(e).0))
    }

    fn pin(&self, idx: usize) -> Result<u8, CompileError> {
        let pin = self.graph.node(idx).kind.pin().unwrap_or(0);
        self.byte(idx, "pin", u64::from(pin))
    }

    fn byte(&self, idx: usize, field: &'static str, value: u64) -> Result<u8, CompileError> {
        u8::try_from(value).map_err(|_| CompileError::OperandRange {
            node: self.graph.node(idx).id.clone(),
            field,
            value,
            max: u64::from(u8::MAX),
        })
    }

    /// Little-endian 16-bit operand.
    fn word(&self, idx: usize, field: &'static str, value: u32) -> Result<[u8; 2], CompileError> {
        u16::try_from(value)
            .map(u16::to_le_bytes)
            .map_err(|_| CompileError::OperandRange {
                node: self.graph.node(idx).id.clone(),
                field,
                value: u64::from(value),
                max: u64::from(u16::MAX),
            })
    }

    /// Whether any analog node is reachable downstream of `start`.
    fn reaches_analog(&self, start: usize) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            for &next in &self.adj.successors[idx] {
                if self.graph.node(next).kind.is_analog() {
                    return true;
                }
                stack.push(next);
            }
        }
        false
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
