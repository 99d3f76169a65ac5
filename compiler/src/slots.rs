// slots.rs — Variable slot allocation
//
// Assigns the dense, zero-based value cells the firmware keeps for every
// producing node, in dependency order. Output nodes never get a slot.
//
// Preconditions: `order` was computed from `graph`.
// Postconditions: slots 0..count are assigned, one per non-sink node.
// Failure modes: more slots than a one-byte operand can address
//                → `CompileError::SlotOverflow`.
// Side effects: none.

use crate::error::CompileError;
use crate::graph::Graph;
use crate::opcode::UNCONNECTED;
use crate::schedule::DependencyOrder;

/// Highest number of slots a program may use. Slot 255 is reserved as the
/// "not connected" operand.
pub const MAX_SLOTS: usize = UNCONNECTED as usize;

/// Slot assignment, indexed by node index of the graph it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMap {
    slots: Vec<Option<u8>>,
    count: usize,
}

impl SlotMap {
    /// Slot of node `idx`, or `None` for sinks.
    pub fn get(&self, idx: usize) -> Option<u8> {
        self.slots.get(idx).copied().flatten()
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// (node id, slot) pairs in slot order.
    pub fn assignments<'g>(&self, graph: &'g Graph) -> Vec<(&'g str, u8)> {
        let mut pairs: Vec<(&str, u8)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|slot| (graph.node(i).id.as_str(), slot)))
            .collect();
        pairs.sort_by_key(|&(_, slot)| slot);
        pairs
    }
}

pub fn allocate_slots(graph: &Graph, order: &DependencyOrder) -> Result<SlotMap, CompileError> {
    let needed = graph
        .nodes()
        .iter()
        .filter(|n| !n.kind.is_sink())
        .count();
    if needed > MAX_SLOTS {
        return Err(CompileError::SlotOverflow {
            count: needed,
            max: MAX_SLOTS,
        });
    }

    let mut slots = vec![None; graph.nodes().len()];
    let mut next: u8 = 0;
    for &idx in &order.order {
        if graph.node(idx).kind.is_sink() {
            continue;
        }
        slots[idx] = Some(next);
        next = next.wrapping_add(1);
    }

    Ok(SlotMap {
        slots,
        count: needed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node, NodeKind};
    use crate::schedule::dependency_order;

    #[test]
    fn sinks_are_skipped_and_slots_are_dense() {
        let g = Graph::new(
            vec![
                Node::new("o", NodeKind::DigitalOutput { pin: Some(8) }),
                Node::new("n", NodeKind::Not),
                Node::new("a", NodeKind::DigitalInput { pin: Some(2) }),
            ],
            vec![Edge::new("a", "n", "in"), Edge::new("n", "o", "in")],
        )
        .unwrap();
        let order = dependency_order(&g).unwrap();
        let slots = allocate_slots(&g, &order).unwrap();
        assert_eq!(slots.get(2), Some(0));
        assert_eq!(slots.get(1), Some(1));
        assert_eq!(slots.get(0), None);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.assignments(&g), vec![("a", 0), ("n", 1)]);
    }

    #[test]
    fn unrouted_nodes_still_get_slots() {
        let g = Graph::new(
            vec![
                Node::new("a", NodeKind::DigitalInput { pin: None }),
                Node::new("n", NodeKind::Not),
            ],
            vec![],
        )
        .unwrap();
        let order = dependency_order(&g).unwrap();
        let slots = allocate_slots(&g, &order).unwrap();
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn exactly_max_slots_fit() {
        let nodes: Vec<Node> = (0..MAX_SLOTS)
            .map(|i| Node::new(format!("n{i}"), NodeKind::Not))
            .collect();
        let g = Graph::new(nodes, vec![]).unwrap();
        let order = dependency_order(&g).unwrap();
        let slots = allocate_slots(&g, &order).unwrap();
        assert_eq!(slots.get(MAX_SLOTS - 1), Some(254));
    }

    #[test]
    fn too_many_slots_is_an_error() {
        let nodes: Vec<Node> = (0..=MAX_SLOTS)
            .map(|i| Node::new(format!("n{i}"), NodeKind::Not))
            .collect();
        let g = Graph::new(nodes, vec![]).unwrap();
        let order = dependency_order(&g).unwrap();
        assert_eq!(
            allocate_slots(&g, &order),
            Err(CompileError::SlotOverflow {
                count: 256,
                max: 255
            })
        );
    }
}
