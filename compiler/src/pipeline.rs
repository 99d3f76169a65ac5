// pipeline.rs — Compilation state and pass orchestration
//
// Holds all pass artifacts and runs the minimal set of passes for a given
// terminal PassId, verifying stage certificates along the way.
//
// Preconditions: the authored graph is set before calling run_pipeline.
// Postconditions: all artifacts for required passes are populated, or has_error is set.
// Failure modes: any pass emitting error-level diagnostics; certificate failure.
// Side effects: calls on_pass_complete callback after each pass for immediate display.

use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::codegen::Program;
use crate::diag::codes;
use crate::diag::Diagnostic;
use crate::graph::Graph;
use crate::normalize::{FanInCert, NormalizedGraph};
use crate::pass::{descriptor, required_passes, PassId, StageCert};
use crate::schedule::{DependencyOrder, OrderCert};
use crate::slots::SlotMap;

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for `--emit build-info`.
///
/// `project_hash`: SHA-256 of the raw project JSON text.
/// `program_hash`: SHA-256 of the emitted bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub project_hash: String,
    pub program_hash: String,
    pub program_len: usize,
    pub slot_count: usize,
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Pretty-printed JSON, newline-terminated.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut s = serde_json::to_string_pretty(self)?;
        s.push('\n');
        Ok(s)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(bytes);
    let mut s = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// Compute provenance from the project text and the program it compiled to.
pub fn compute_provenance(project_text: &str, program: &Program) -> Provenance {
    Provenance {
        project_hash: sha256_hex(project_text.as_bytes()),
        program_hash: sha256_hex(&program.bytes),
        program_len: program.bytes.len(),
        slot_count: program.slot_count,
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Artifact storage ───────────────────────────────────────────────────────

/// Holds all compilation artifacts and accumulated diagnostics.
pub struct CompilationState {
    /// The authored graph, as loaded.
    pub graph: Graph,
    pub normalized: Option<NormalizedGraph>,
    pub fan_in_cert: Option<FanInCert>,
    pub order: Option<DependencyOrder>,
    pub order_cert: Option<OrderCert>,
    pub slots: Option<SlotMap>,
    pub program: Option<Program>,
    pub diagnostics: Vec<Diagnostic>,
    pub has_error: bool,
}

impl CompilationState {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            normalized: None,
            fan_in_cert: None,
            order: None,
            order_cert: None,
            slots: None,
            program: None,
            diagnostics: Vec::new(),
            has_error: false,
        }
    }

    /// The graph later passes operate on: normalized once that pass ran.
    pub fn working_graph(&self) -> &Graph {
        self.normalized
            .as_ref()
            .map(|n| &n.graph)
            .unwrap_or(&self.graph)
    }
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Pipeline execution failed due to error-level diagnostics in a pass.
/// The specific diagnostics are available in `CompilationState.diagnostics`.
#[derive(Debug)]
pub struct PipelineError {
    /// The pass that produced the error.
    pub failing_pass: PassId,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn has_error_diags(diags: &[Diagnostic]) -> bool {
    diags.iter().any(Diagnostic::is_error)
}

/// Per-pass post-processing: callback, accumulate, trace, error check.
fn finish_pass(
    state: &mut CompilationState,
    pass_id: PassId,
    diags: Vec<Diagnostic>,
    elapsed: Duration,
    on_pass_complete: &mut impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    on_pass_complete(pass_id, &diags);
    let is_err = has_error_diags(&diags);
    state.diagnostics.extend(diags);
    tracing::debug!(
        pass = descriptor(pass_id).name,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "pass complete"
    );
    if is_err {
        state.has_error = true;
        return Err(PipelineError {
            failing_pass: pass_id,
        });
    }
    Ok(())
}

/// Error diagnostic for a certificate with broken obligations, if any.
fn cert_diag(cert: &impl StageCert, what: &str, code: crate::diag::DiagCode) -> Option<Diagnostic> {
    if cert.all_pass() {
        return None;
    }
    Some(Diagnostic::error(
        code,
        format!("{what} verification failed: {}", cert.failed().join(", ")),
    ))
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce `terminal`.
///
/// Per-pass sequence: execute → verify → on_pass_complete(callback) → error check.
///
/// Preconditions: `state.graph` is set.
/// Postconditions: artifacts for all passes in `required_passes(terminal)` are populated,
///   or `state.has_error` is true.
/// Failure modes: any pass producing error-level diagnostics; certificate failure.
/// Side effects: calls `on_pass_complete` after each pass for immediate diagnostic display.
pub fn run_pipeline(
    state: &mut CompilationState,
    terminal: PassId,
    mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    for pass_id in required_passes(terminal) {
        let t = Instant::now();
        let mut diags = Vec::new();
        match pass_id {
            PassId::Normalize => {
                let normalized = crate::normalize::normalize(&state.graph);
                let cert = crate::normalize::verify_fan_in(&normalized.graph);
                diags.extend(cert_diag(&cert, "fan-in", codes::E0600));
                state.normalized = Some(normalized);
                state.fan_in_cert = Some(cert);
            }
            PassId::Order => {
                let graph = state.working_graph();
                match crate::schedule::dependency_order(graph) {
                    Ok(order) => {
                        let cert = crate::schedule::verify_order(&order, graph);
                        diags.extend(cert_diag(&cert, "dependency order", codes::E0601));
                        state.order = Some(order);
                        state.order_cert = Some(cert);
                    }
                    Err(e) => diags.push(Diagnostic::from(&e)),
                }
            }
            PassId::Allocate => {
                let order = state
                    .order
                    .as_ref()
                    .expect("order pass runs before allocate");
                match crate::slots::allocate_slots(state.working_graph(), order) {
                    Ok(slots) => state.slots = Some(slots),
                    Err(e) => diags.push(Diagnostic::from(&e)),
                }
            }
            PassId::Codegen => {
                let order = state
                    .order
                    .as_ref()
                    .expect("order pass runs before codegen");
                let slots = state
                    .slots
                    .as_ref()
                    .expect("allocate pass runs before codegen");
                match crate::codegen::codegen(state.working_graph(), order, slots) {
                    Ok(program) => state.program = Some(program),
                    Err(e) => diags.push(Diagnostic::from(&e)),
                }
            }
        }
        finish_pass(state, pass_id, diags, t.elapsed(), &mut on_pass_complete)?;
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
