use serde::{Deserialize, Serialize};

use super::node::NodeId;
use crate::port::PortName;

/// A value link from a condition output to an input on another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: NodeId,
    pub output: PortName,
    pub to: NodeId,
    pub input: PortName,
}

impl Link {
    pub fn new(from: NodeId, output: PortName, to: NodeId, input: PortName) -> Self {
        Self {
            from,
            output,
            to,
            input,
        }
    }
}

/// An execution flow edge between two event nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    pub from: NodeId,
    pub to: NodeId,
}

impl FlowLink {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}
