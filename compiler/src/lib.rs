// logicc — Logic graph compiler
//
// Library root. Compiles an editor-authored logic graph into the bytecode
// the controller firmware interprets once per control cycle.

pub mod board;
pub mod codegen;
pub mod diag;
pub mod disasm;
pub mod dot;
pub mod encode;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod opcode;
pub mod pass;
pub mod pipeline;
pub mod project;
pub mod schedule;
pub mod slots;

use crate::codegen::Program;
use crate::error::CompileError;
use crate::graph::Graph;

/// Compile an authored graph straight through every pass.
///
/// Equivalent to `pipeline::run_pipeline` up to `PassId::Codegen`, without
/// certificate checks or diagnostics collection.
pub fn compile(graph: &Graph) -> Result<Program, CompileError> {
    let normalized = normalize::normalize(graph);
    let order = schedule::dependency_order(&normalized.graph)?;
    let slots = slots::allocate_slots(&normalized.graph, &order)?;
    codegen::codegen(&normalized.graph, &order, &slots)
}
