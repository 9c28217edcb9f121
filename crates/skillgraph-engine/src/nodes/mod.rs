pub mod condition;
pub mod event;

pub use condition::{CompareOp, ConditionNode, LogicOp, MathOp, StatPreview};
pub use event::{EventNode, RepositionMode, WarpMode};

use serde::{Deserialize, Serialize};
use skillgraph_core::TypedValue;

use crate::port::{PortDescriptor, PortName};

/// The two node families. A node is one or the other, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "node", rename_all = "snake_case")]
pub enum NodeKind {
    Condition(ConditionNode),
    Event(EventNode),
}

impl NodeKind {
    pub fn is_event(&self) -> bool {
        matches!(self, NodeKind::Event(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Condition(c) => c.type_name(),
            NodeKind::Event(e) => e.type_name(),
        }
    }

    pub fn inputs(&self) -> Vec<PortDescriptor> {
        match self {
            NodeKind::Condition(c) => c.inputs(),
            NodeKind::Event(e) => e.inputs(),
        }
    }

    /// Value outputs. Event nodes only expose the execution flow, which is
    /// not a value port.
    pub fn outputs(&self) -> Vec<PortDescriptor> {
        match self {
            NodeKind::Condition(c) => c.outputs(),
            NodeKind::Event(_) => Vec::new(),
        }
    }

    pub fn input(&self, port: PortName) -> Option<PortDescriptor> {
        self.inputs().into_iter().find(|p| p.name == port)
    }

    pub fn output(&self, port: PortName) -> Option<PortDescriptor> {
        self.outputs().into_iter().find(|p| p.name == port)
    }

    pub fn default_input(&self, port: PortName) -> Option<TypedValue> {
        match self {
            NodeKind::Condition(c) => c.default_input(port),
            NodeKind::Event(e) => e.default_input(port),
        }
    }
}

impl From<ConditionNode> for NodeKind {
    fn from(node: ConditionNode) -> Self {
        NodeKind::Condition(node)
    }
}

impl From<EventNode> for NodeKind {
    fn from(node: EventNode) -> Self {
        NodeKind::Event(node)
    }
}
