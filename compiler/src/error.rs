// error.rs — Typed failures for every compiler phase
//
// Load errors (project document → graph), compile errors (structural and
// value-range), and transport errors (framing, disassembly). Each maps to a
// stable diagnostic code in `diag::codes` for CLI rendering.

use thiserror::Error;

/// Graph construction failed: the node/edge lists are not a valid graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("edge {edge} references unknown node '{node}'")]
    UnknownEndpoint { edge: usize, node: String },
}

/// The project document could not be turned into a graph.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node '{node}' has unknown type '{type_tag}'")]
    UnknownNodeType { node: String, type_tag: String },

    #[error("node '{node}' has invalid pin '{pin}'")]
    InvalidPin { node: String, pin: String },

    #[error("node '{node}' has unknown comparison operator '{operator}'")]
    InvalidOperator { node: String, operator: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Compilation of a well-formed graph failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The dependency resolver could not place these nodes (node-list order).
    #[error("graph contains a cycle; {} node(s) could not be ordered: {}", unplaced.len(), unplaced.join(", "))]
    Cycle { unplaced: Vec<String> },

    #[error("node '{node}': {field} = {value} does not fit (max {max})")]
    OperandRange {
        node: String,
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("{count} variable slots needed, at most {max} are addressable")]
    SlotOverflow { count: usize, max: usize },
}

/// A byte stream could not be framed or unframed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("program is {len} bytes, a frame carries at most {max}")]
    TooLong { len: usize, max: usize },

    #[error("frame is {len} bytes, shorter than the 3-byte envelope")]
    Truncated { len: usize },

    #[error("frame starts with 0x{found:02X}, expected 0x7E")]
    BadStart { found: u8 },

    #[error("frame declares {declared} payload bytes but carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("checksum 0x{found:02X} does not match computed 0x{expected:02X}")]
    Checksum { expected: u8, found: u8 },
}

/// A byte stream is not a valid instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode { offset: usize, opcode: u8 },

    #[error("{mnemonic} at offset {offset} needs {needed} operand bytes, {available} left")]
    Truncated {
        offset: usize,
        mnemonic: &'static str,
        needed: usize,
        available: usize,
    },
}
