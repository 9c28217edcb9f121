use serde::Serialize;
use skillgraph_core::error::{Result, SkillGraphError};
use skillgraph_core::{DiagnosticKind, ExecutionContext, TypedValue};
use tracing::{debug, warn};

use super::edge::{FlowLink, Link};
use super::node::{Node, NodeId};
use crate::nodes::{ConditionNode, EventNode, NodeKind};
use crate::port::{diagnose, PortName, ResolvedInputs};

/// A designer-authored skill: condition nodes wired into the inputs of a
/// linear chain of event nodes.
///
/// Every link is validated when it is added, so a built graph never holds a
/// dangling port, a type mismatch, a value cycle or a branching chain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillGraph {
    name: String,
    nodes: Vec<Node>,
    links: Vec<Link>,
    flow: Vec<FlowLink>,
    trigger: Option<NodeId>,
}

impl SkillGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_node(&mut self, label: impl Into<String>, kind: impl Into<NodeKind>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::new(id, label, kind));
        id
    }

    pub fn add_condition(&mut self, label: impl Into<String>, node: ConditionNode) -> NodeId {
        self.add_node(label, node)
    }

    pub fn add_event(&mut self, label: impl Into<String>, node: EventNode) -> NodeId {
        self.add_node(label, node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn flow(&self) -> &[FlowLink] {
        &self.flow
    }

    /// Find a node by label.
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.label == label).map(|n| n.id)
    }

    fn require(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(SkillGraphError::NodeNotFound(id))
    }

    /// Wire a condition output into an input of another node.
    pub fn connect(
        &mut self,
        from: NodeId,
        output: PortName,
        to: NodeId,
        input: PortName,
    ) -> Result<()> {
        let source = self.require(from)?;
        let target = self.require(to)?;

        if source.is_event() {
            return Err(SkillGraphError::NotACondition(from));
        }
        let out = source.kind.output(output).ok_or_else(|| SkillGraphError::PortNotFound {
            node: from,
            port: output.to_string(),
        })?;
        let inp = target.kind.input(input).ok_or_else(|| SkillGraphError::PortNotFound {
            node: to,
            port: input.to_string(),
        })?;
        if out.value_type != inp.value_type {
            return Err(SkillGraphError::TypeMismatch {
                expected: inp.value_type,
                got: out.value_type,
            });
        }
        if self.upstream(to, input).is_some() {
            return Err(SkillGraphError::InputAlreadyConnected {
                node: to,
                port: input.to_string(),
            });
        }
        if from == to || self.depends_on(from, to) {
            return Err(SkillGraphError::CycleDetected(to));
        }

        debug!(graph = %self.name, from, %output, to, %input, "Linked ports");
        self.links.push(Link::new(from, output, to, input));
        Ok(())
    }

    /// True if evaluating `node` pulls, directly or not, from `ancestor`.
    fn depends_on(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(current) = stack.pop() {
            if current == ancestor {
                return true;
            }
            if std::mem::replace(&mut seen[current as usize], true) {
                continue;
            }
            stack.extend(self.links.iter().filter(|l| l.to == current).map(|l| l.from));
        }
        false
    }

    /// Append `to` after `from` in the execution chain.
    pub fn chain(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for id in [from, to] {
            if !self.require(id)?.is_event() {
                return Err(SkillGraphError::NotAnEvent(id));
            }
        }
        if self.resolve_successor(from).is_some() {
            return Err(SkillGraphError::BranchingFlow(from));
        }
        if self.flow.iter().any(|f| f.to == to) {
            return Err(SkillGraphError::MergingFlow(to));
        }
        // `to` has no predecessor yet, so a cycle means `to` already leads back to `from`.
        let mut cursor = Some(to);
        while let Some(id) = cursor {
            if id == from {
                return Err(SkillGraphError::CycleDetected(to));
            }
            cursor = self.resolve_successor(id);
        }

        debug!(graph = %self.name, from, to, "Chained events");
        self.flow.push(FlowLink::new(from, to));
        Ok(())
    }

    /// Designate the event node an activation starts from.
    pub fn set_trigger(&mut self, id: NodeId) -> Result<()> {
        if !self.require(id)?.is_event() {
            return Err(SkillGraphError::NotAnEvent(id));
        }
        self.trigger = Some(id);
        Ok(())
    }

    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    /// The link feeding an input, if connected.
    pub fn upstream(&self, to: NodeId, input: PortName) -> Option<&Link> {
        self.links.iter().find(|l| l.to == to && l.input == input)
    }

    /// Next event in the chain after `node`.
    pub fn resolve_successor(&self, node: NodeId) -> Option<NodeId> {
        self.flow.iter().find(|f| f.from == node).map(|f| f.to)
    }

    /// Event ids in chain order starting at the trigger.
    pub fn chain_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut cursor = self.trigger;
        while let Some(id) = cursor {
            order.push(id);
            cursor = self.resolve_successor(id);
        }
        order
    }

    /// Check the graph is ready to run.
    pub fn validate(&self) -> Result<()> {
        if self.trigger.is_none() {
            return Err(SkillGraphError::NoTrigger);
        }
        let reachable = self.chain_order();
        for node in self.nodes.iter().filter(|n| n.is_event()) {
            if !reachable.contains(&node.id) {
                warn!(
                    graph = %self.name,
                    node = %node.label,
                    "Event node is not reachable from the trigger"
                );
            }
        }
        Ok(())
    }

    /// Pull the value of one output port.
    ///
    /// Asking for a node or port that does not exist is reported as a
    /// missing dependency and yields `Float(0.0)`.
    pub fn evaluate(
        &self,
        node: NodeId,
        port: PortName,
        ctx: Option<&ExecutionContext>,
    ) -> TypedValue {
        let Some(n) = self.node(node) else {
            let message = format!("no node {}", node);
            diagnose(ctx, &self.name, DiagnosticKind::MissingDependency, message);
            return TypedValue::Float(0.0);
        };
        let NodeKind::Condition(condition) = &n.kind else {
            diagnose(
                ctx,
                &n.label,
                DiagnosticKind::MissingDependency,
                "event nodes have no value outputs",
            );
            return TypedValue::Float(0.0);
        };
        let Some(desc) = condition.outputs().into_iter().find(|p| p.name == port) else {
            diagnose(
                ctx,
                &n.label,
                DiagnosticKind::MissingDependency,
                format!("{} has no output {}", condition.type_name(), port),
            );
            return TypedValue::Float(0.0);
        };

        let inputs = self.pull_inputs(node, ctx);
        let value = condition.evaluate(&n.label, port, &inputs, ctx);
        debug_assert_eq!(value.value_type(), desc.value_type);
        value
    }

    /// Resolve every input of a node: connected inputs are pulled from
    /// upstream, unconnected ones take the node's configured default.
    pub fn pull_inputs(&self, node: NodeId, ctx: Option<&ExecutionContext>) -> ResolvedInputs {
        let mut resolved = ResolvedInputs::new();
        let Some(n) = self.node(node) else {
            return resolved;
        };

        for desc in n.kind.inputs() {
            let fallback = || {
                n.kind
                    .default_input(desc.name)
                    .unwrap_or_else(|| TypedValue::neutral(desc.value_type))
            };
            let value = match self.upstream(node, desc.name) {
                Some(link) => {
                    let value = self.evaluate(link.from, link.output, ctx);
                    if value.value_type() == desc.value_type {
                        value
                    } else {
                        diagnose(
                            ctx,
                            &n.label,
                            DiagnosticKind::TypeMismatch,
                            format!(
                                "input {} got {}, expected {}",
                                desc.name,
                                value.value_type(),
                                desc.value_type
                            ),
                        );
                        fallback()
                    }
                }
                None => fallback(),
            };
            resolved.insert(desc.name, value);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{CompareOp, MathOp, StatPreview};
    use skillgraph_core::{BoundedStatType, StatKind, ValueType};

    fn unit_hp() -> ConditionNode {
        ConditionNode::UnitStat {
            stat: StatKind::Bounded(BoundedStatType::Health).into(),
            preview: StatPreview {
                current: 25.0,
                max: 100.0,
                bonus: 0.0,
            },
        }
    }

    fn hit() -> EventNode {
        EventNode::AffectEnemyStat {
            stat: StatKind::Bounded(BoundedStatType::Health).into(),
            delta: -5.0,
            affect_all: false,
        }
    }

    #[test]
    fn test_connect_checks_ports_and_types() {
        let mut g = SkillGraph::new("t");
        let hp = g.add_condition("hp", unit_hp());
        let cmp = g.add_condition(
            "low",
            ConditionNode::Compare { op: CompareOp::Less, a: 0.0, b: 30.0 },
        );
        let ev = g.add_event("hit", hit());

        assert!(g.connect(hp, PortName::Percentage, cmp, PortName::A).is_ok());
        assert!(matches!(
            g.connect(hp, PortName::Current, cmp, PortName::A),
            Err(SkillGraphError::InputAlreadyConnected { .. })
        ));
        assert!(matches!(
            g.connect(hp, PortName::Result, cmp, PortName::B),
            Err(SkillGraphError::PortNotFound { .. })
        ));
        assert!(matches!(
            g.connect(cmp, PortName::Result, ev, PortName::Delta),
            Err(SkillGraphError::TypeMismatch {
                expected: ValueType::Float,
                got: ValueType::Bool
            })
        ));
        assert!(matches!(
            g.connect(ev, PortName::Value, cmp, PortName::B),
            Err(SkillGraphError::NotACondition(_))
        ));
        assert!(matches!(
            g.connect(hp, PortName::Current, 99, PortName::A),
            Err(SkillGraphError::NodeNotFound(99))
        ));
    }

    #[test]
    fn test_connect_rejects_value_cycles() {
        let mut g = SkillGraph::new("t");
        let a = g.add_condition("a", ConditionNode::Math { op: MathOp::Add, a: 1.0, b: 1.0 });
        let b = g.add_condition("b", ConditionNode::Math { op: MathOp::Add, a: 1.0, b: 1.0 });
        g.connect(a, PortName::Result, b, PortName::A).unwrap();
        assert!(matches!(
            g.connect(b, PortName::Result, a, PortName::A),
            Err(SkillGraphError::CycleDetected(_))
        ));
        assert!(matches!(
            g.connect(a, PortName::Result, a, PortName::B),
            Err(SkillGraphError::CycleDetected(_))
        ));
    }

    #[test]
    fn test_chain_is_linear() {
        let mut g = SkillGraph::new("t");
        let t = g.add_event("start", EventNode::Trigger);
        let x = g.add_event("x", EventNode::CriticalHit);
        let y = g.add_event("y", EventNode::FirstStrike);
        let c = g.add_condition("c", unit_hp());

        g.chain(t, x).unwrap();
        assert!(matches!(g.chain(t, y), Err(SkillGraphError::BranchingFlow(_))));
        assert!(matches!(g.chain(y, x), Err(SkillGraphError::MergingFlow(_))));
        assert!(matches!(g.chain(x, c), Err(SkillGraphError::NotAnEvent(_))));
        g.chain(x, y).unwrap();
        assert!(matches!(g.chain(y, t), Err(SkillGraphError::CycleDetected(_))));
        assert!(matches!(g.set_trigger(c), Err(SkillGraphError::NotAnEvent(_))));

        assert_eq!(g.resolve_successor(t), Some(x));
        assert_eq!(g.resolve_successor(y), None);
    }

    #[test]
    fn test_validate_requires_trigger() {
        let mut g = SkillGraph::new("t");
        let t = g.add_event("start", EventNode::Trigger);
        assert!(matches!(g.validate(), Err(SkillGraphError::NoTrigger)));
        g.set_trigger(t).unwrap();
        assert!(g.validate().is_ok());
        assert_eq!(g.chain_order(), vec![t]);
    }

    #[test]
    fn test_pull_through_links_without_context() {
        let mut g = SkillGraph::new("t");
        let hp = g.add_condition("hp", unit_hp());
        let low = g.add_condition(
            "low",
            ConditionNode::Compare { op: CompareOp::Less, a: 0.0, b: 30.0 },
        );
        g.connect(hp, PortName::Percentage, low, PortName::A).unwrap();

        assert_eq!(g.evaluate(low, PortName::Result, None), TypedValue::Bool(true));
        // Unconnected `b` keeps its configured value.
        let inputs = g.pull_inputs(low, None);
        assert_eq!(inputs.float(PortName::A), 25.0);
        assert_eq!(inputs.float(PortName::B), 30.0);
    }

    #[test]
    fn test_evaluate_unknown_port_is_neutral() {
        let mut g = SkillGraph::new("t");
        let hp = g.add_condition("hp", unit_hp());
        let ev = g.add_event("hit", hit());
        let ctx = ExecutionContext::authoring();
        assert_eq!(g.evaluate(hp, PortName::Turns, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(g.evaluate(ev, PortName::Value, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(g.evaluate(42, PortName::Value, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(ctx.diagnostics().count(DiagnosticKind::MissingDependency), 3);
    }

    #[test]
    fn test_event_inputs_pull_from_conditions() {
        let mut g = SkillGraph::new("t");
        let bonus = g.add_condition(
            "bonus",
            ConditionNode::Constant { value: TypedValue::Float(-12.0) },
        );
        let ev = g.add_event("hit", hit());
        g.connect(bonus, PortName::Value, ev, PortName::Delta).unwrap();

        let inputs = g.pull_inputs(ev, None);
        assert_eq!(inputs.float(PortName::Delta), -12.0);
        assert!(!inputs.bool(PortName::AffectAll));
    }

    #[test]
    fn test_find_by_label() {
        let mut g = SkillGraph::new("t");
        g.add_event("start", EventNode::Trigger);
        let x = g.add_event("crit", EventNode::CriticalHit);
        assert_eq!(g.find("crit"), Some(x));
        assert_eq!(g.find("nope"), None);
    }
}
