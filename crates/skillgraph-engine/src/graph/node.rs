use serde::{Deserialize, Serialize};

use crate::nodes::NodeKind;

/// Index of a node inside its graph.
pub type NodeId = u32;

/// A node in a skill graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Author-facing name, used in diagnostics and logs.
    pub label: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id,
            label: label.into(),
            kind: kind.into(),
        }
    }

    pub fn is_event(&self) -> bool {
        self.kind.is_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{ConditionNode, EventNode};

    #[test]
    fn test_node_builder() {
        let node = Node::new(3, "crit", EventNode::CriticalHit);
        assert_eq!(node.id, 3);
        assert_eq!(node.label, "crit");
        assert!(node.is_event());

        let node = Node::new(4, "targets", ConditionNode::TargetCount { preview: 1.0 });
        assert!(!node.is_event());
        assert_eq!(node.kind.type_name(), "TargetCount");
    }
}
