// diag.rs — Unified diagnostics model
//
// Provides the diagnostic type the CLI renders for every phase, and the
// conversions from each typed error into it.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::error::{CompileError, FrameError, GraphError, ProjectError};

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`, `W0001`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // Load (E00xx)
    pub const E0001: DiagCode = DiagCode("E0001"); // malformed project JSON
    pub const E0002: DiagCode = DiagCode("E0002"); // unknown node type
    pub const E0003: DiagCode = DiagCode("E0003"); // invalid pin
    pub const E0004: DiagCode = DiagCode("E0004"); // unknown comparison operator
    pub const E0005: DiagCode = DiagCode("E0005"); // duplicate node id
    pub const E0006: DiagCode = DiagCode("E0006"); // edge endpoint not found

    // Structure (E01xx)
    pub const E0100: DiagCode = DiagCode("E0100"); // cycle

    // Value range (E02xx)
    pub const E0200: DiagCode = DiagCode("E0200"); // operand out of range
    pub const E0201: DiagCode = DiagCode("E0201"); // too many slots

    // Transport (E03xx)
    pub const E0300: DiagCode = DiagCode("E0300"); // program too long for a frame

    // Verification (E06xx)
    pub const E0600: DiagCode = DiagCode("E0600"); // fan-in certificate failed
    pub const E0601: DiagCode = DiagCode("E0601"); // order certificate failed

    // Warnings
    pub const W0001: DiagCode = DiagCode("W0001"); // unknown board
    pub const W0002: DiagCode = DiagCode("W0002"); // pin outside board range
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A compiler diagnostic emitted by any phase.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    /// Node the diagnostic is about, when there is one.
    pub node: Option<String>,
    pub message: String,
    pub hint: Option<String>,
    /// Further nodes involved (e.g., the rest of a cycle).
    pub related_nodes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, node, hint, or related nodes.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            node: None,
            message: message.into(),
            hint: None,
            related_nodes: Vec::new(),
        }
    }

    pub fn error(code: DiagCode, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, message).with_code(code)
    }

    pub fn warning(code: DiagCode, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, message).with_code(code)
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the primary node.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a related node.
    pub fn with_related(mut self, node: impl Into<String>) -> Self {
        self.related_nodes.push(node.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", level, code, self.message)?;
        } else {
            write!(f, "{}: {}", level, self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

// ── Conversions from typed errors ────────────────────────────────────────

impl From<&GraphError> for Diagnostic {
    fn from(err: &GraphError) -> Self {
        match err {
            GraphError::DuplicateNode(id) => {
                Diagnostic::error(codes::E0005, err.to_string()).with_node(id.clone())
            }
            GraphError::UnknownEndpoint { node, .. } => {
                Diagnostic::error(codes::E0006, err.to_string())
                    .with_node(node.clone())
                    .with_hint("remove the edge or restore the node it points to")
            }
        }
    }
}

impl From<&ProjectError> for Diagnostic {
    fn from(err: &ProjectError) -> Self {
        match err {
            ProjectError::Json(_) => Diagnostic::error(codes::E0001, err.to_string()),
            ProjectError::UnknownNodeType { node, .. } => {
                Diagnostic::error(codes::E0002, err.to_string()).with_node(node.clone())
            }
            ProjectError::InvalidPin { node, .. } => {
                Diagnostic::error(codes::E0003, err.to_string())
                    .with_node(node.clone())
                    .with_hint("use a pin number, or an analog label such as A0 with a known board")
            }
            ProjectError::InvalidOperator { node, .. } => {
                Diagnostic::error(codes::E0004, err.to_string())
                    .with_node(node.clone())
                    .with_hint("expected one of >, >=, <, <=, ==, !=")
            }
            ProjectError::Graph(inner) => Diagnostic::from(inner),
        }
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(err: &CompileError) -> Self {
        match err {
            CompileError::Cycle { unplaced } => {
                let mut d = Diagnostic::error(codes::E0100, err.to_string())
                    .with_hint("break the feedback loop; every value must be computed from earlier values");
                if let Some((first, rest)) = unplaced.split_first() {
                    d = d.with_node(first.clone());
                    for id in rest {
                        d = d.with_related(id.clone());
                    }
                }
                d
            }
            CompileError::OperandRange { node, .. } => {
                Diagnostic::error(codes::E0200, err.to_string()).with_node(node.clone())
            }
            CompileError::SlotOverflow { .. } => Diagnostic::error(codes::E0201, err.to_string())
                .with_hint("split the project; the firmware addresses one byte of slots"),
        }
    }
}

impl From<&FrameError> for Diagnostic {
    fn from(err: &FrameError) -> Self {
        Diagnostic::error(codes::E0300, err.to_string())
    }
}
