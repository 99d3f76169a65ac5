// pass.rs — Pass descriptor module: metadata, dependency resolution, artifact IDs
//
// Declares the compiler's 4 passes (project loading is outside the runner),
// their dependency edges, and the artifacts they produce. Used by the pipeline
// runner to compute minimal pass subsets for each --emit target.

use std::collections::HashSet;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each compiler pass. Project loading happens before the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    Normalize,
    Order,
    Allocate,
    Codegen,
}

/// Machine-readable artifact identifiers. Each maps to a concrete type
/// in the compilation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Normalized, // NormalizedGraph
    FanInCert,  // FanInCert
    Order,      // DependencyOrder
    OrderCert,  // OrderCert
    Slots,      // SlotMap
    Program,    // Program
}

// ── Stage certificates ─────────────────────────────────────────────────────

/// Machine-checkable evidence that a pass met its postconditions.
pub trait StageCert {
    /// True when every obligation holds.
    fn all_pass(&self) -> bool;

    /// Named obligations and whether each holds.
    fn obligations(&self) -> Vec<(&'static str, bool)>;

    /// Names of the obligations that do not hold.
    fn failed(&self) -> Vec<&'static str> {
        self.obligations()
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a compiler pass.
pub struct PassDescriptor {
    /// Human-readable name for diagnostics/verbose output.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
    /// Artifacts this pass produces.
    pub outputs: &'static [ArtifactId],
    /// Pre/post conditions (documentation only).
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::Normalize => PassDescriptor {
            name: "normalize",
            inputs: &[],
            outputs: &[ArtifactId::Normalized, ArtifactId::FanInCert],
            invariants: "every (node, handle) and every output has at most one driver",
        },
        PassId::Order => PassDescriptor {
            name: "order",
            inputs: &[PassId::Normalize],
            outputs: &[ArtifactId::Order, ArtifactId::OrderCert],
            invariants: "every node once; every edge points forward",
        },
        PassId::Allocate => PassDescriptor {
            name: "allocate",
            inputs: &[PassId::Order],
            outputs: &[ArtifactId::Slots],
            invariants: "dense slots in dependency order, none for outputs",
        },
        PassId::Codegen => PassDescriptor {
            name: "codegen",
            inputs: &[PassId::Allocate],
            outputs: &[ArtifactId::Program],
            invariants: "preamble then one instruction per live node",
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 4] = [
    PassId::Normalize,
    PassId::Order,
    PassId::Allocate,
    PassId::Codegen,
];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────
