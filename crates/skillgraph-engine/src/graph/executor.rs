use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use skillgraph_core::{EngineConfig, ExecutionContext};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::node::NodeId;
use super::skill_graph::SkillGraph;
use crate::nodes::NodeKind;

/// Supplies the live battle context for an activation, if there is one.
pub trait BattleContextProvider {
    fn active_context(&mut self) -> Option<&mut ExecutionContext>;
}

impl BattleContextProvider for ExecutionContext {
    fn active_context(&mut self) -> Option<&mut ExecutionContext> {
        Some(self)
    }
}

impl BattleContextProvider for Option<ExecutionContext> {
    fn active_context(&mut self) -> Option<&mut ExecutionContext> {
        self.as_mut()
    }
}

/// Where an activation is in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChainState {
    Idle,
    /// `node` has just executed.
    Triggered { node: NodeId },
    /// `to` follows `from` and runs on the next step.
    Chained { from: NodeId, to: NodeId },
    Terminal,
}

/// One walk along a graph's execution chain.
///
/// Each call to [`step`](Activation::step) advances the state machine by one
/// transition. Every event node runs at most once.
pub struct Activation<'g> {
    graph: &'g SkillGraph,
    state: ChainState,
    executed: Vec<NodeId>,
    max_chain_length: usize,
    truncated: bool,
}

impl<'g> Activation<'g> {
    pub fn new(graph: &'g SkillGraph, max_chain_length: usize) -> Self {
        Self {
            graph,
            state: ChainState::Idle,
            executed: Vec::new(),
            max_chain_length,
            truncated: false,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn executed(&self) -> &[NodeId] {
        &self.executed
    }

    pub fn is_terminal(&self) -> bool {
        self.state == ChainState::Terminal
    }

    pub fn step(&mut self, ctx: &mut ExecutionContext) -> ChainState {
        self.state = match self.state {
            ChainState::Idle => match self.graph.trigger() {
                Some(_) if self.at_limit() => ChainState::Terminal,
                Some(trigger) => self.run_node(trigger, ctx),
                None => {
                    warn!(graph = %self.graph.name(), "Graph has no trigger, nothing to run");
                    ChainState::Terminal
                }
            },
            ChainState::Triggered { node } => match self.graph.resolve_successor(node) {
                Some(next) => ChainState::Chained { from: node, to: next },
                None => {
                    debug!(node, "No successor, chain complete");
                    ChainState::Terminal
                }
            },
            ChainState::Chained { to, .. } => {
                if self.at_limit() {
                    ChainState::Terminal
                } else if self.executed.contains(&to) {
                    warn!(node = to, "Event node already executed, terminating activation");
                    self.truncated = true;
                    ChainState::Terminal
                } else {
                    self.run_node(to, ctx)
                }
            }
            ChainState::Terminal => ChainState::Terminal,
        };
        self.state
    }

    /// Marks the activation truncated once `max_chain_length` events have run.
    fn at_limit(&mut self) -> bool {
        if self.executed.len() < self.max_chain_length {
            return false;
        }
        warn!(
            graph = %self.graph.name(),
            max = self.max_chain_length,
            "Chain length limit reached, terminating activation"
        );
        self.truncated = true;
        true
    }

    fn run_node(&mut self, id: NodeId, ctx: &mut ExecutionContext) -> ChainState {
        let graph = self.graph;
        let Some(node) = graph.node(id) else {
            warn!(node = id, "Chained node missing from graph, terminating activation");
            return ChainState::Terminal;
        };
        let NodeKind::Event(event) = &node.kind else {
            warn!(node = %node.label, "Chained node is not an event, terminating activation");
            return ChainState::Terminal;
        };

        debug!(node = %node.label, kind = event.type_name(), "Executing event node");
        let inputs = graph.pull_inputs(id, Some(&*ctx));
        event.execute(&node.label, &inputs, ctx);
        self.executed.push(id);
        ChainState::Triggered { node: id }
    }
}

/// Summary of one activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationReport {
    pub activation_id: Uuid,
    pub graph: String,
    /// Event nodes in the order they ran.
    pub executed: Vec<NodeId>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub live: bool,
    /// Stopped early by the chain length guard.
    pub truncated: bool,
    pub diagnostics: usize,
}

/// Runs skill graph activations.
#[derive(Debug, Clone, Copy)]
pub struct ChainExecutor {
    max_chain_length: usize,
}

impl Default for ChainExecutor {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ChainExecutor {
    pub fn new(max_chain_length: usize) -> Self {
        Self { max_chain_length }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.engine.max_chain_length)
    }

    /// Run the chain from the trigger to its end against `ctx`.
    pub fn run(&self, graph: &SkillGraph, ctx: &mut ExecutionContext) -> ActivationReport {
        let activation_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let diagnostics_before = ctx.diagnostics().len();

        info!(
            %activation_id,
            graph = %graph.name(),
            live = ctx.is_live(),
            "Activating skill graph"
        );

        let mut activation = Activation::new(graph, self.max_chain_length);
        while !activation.is_terminal() {
            activation.step(ctx);
        }

        let report = ActivationReport {
            activation_id,
            graph: graph.name().to_string(),
            executed: activation.executed().to_vec(),
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            live: ctx.is_live(),
            truncated: activation.truncated,
            diagnostics: ctx.diagnostics().len() - diagnostics_before,
        };

        info!(
            %activation_id,
            executed = report.executed.len(),
            diagnostics = report.diagnostics,
            elapsed_ms = report.elapsed_ms,
            "Activation complete"
        );
        report
    }

    /// Run against whatever context the provider has. Without one the chain
    /// still runs, against a throwaway authoring context, so every event
    /// reports itself as skipped.
    pub fn activate(
        &self,
        graph: &SkillGraph,
        provider: &mut impl BattleContextProvider,
    ) -> ActivationReport {
        match provider.active_context() {
            Some(ctx) => self.run(graph, ctx),
            None => {
                warn!(
                    graph = %graph.name(),
                    "No battle context available, running in authoring mode"
                );
                self.run(graph, &mut ExecutionContext::authoring())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::EventNode;
    use skillgraph_core::DiagnosticKind;

    fn three_step() -> (SkillGraph, [NodeId; 3]) {
        let mut g = SkillGraph::new("three");
        let a = g.add_event("a", EventNode::SetFlag { key: "A".into(), value: true });
        let b = g.add_event("b", EventNode::SetFlag { key: "B".into(), value: true });
        let c = g.add_event("c", EventNode::SetFlag { key: "C".into(), value: true });
        g.chain(a, b).unwrap();
        g.chain(b, c).unwrap();
        g.set_trigger(a).unwrap();
        (g, [a, b, c])
    }

    #[test]
    fn test_state_machine_transitions() {
        let (g, [a, b, _]) = three_step();
        let mut ctx = ExecutionContext::authoring();
        let mut activation = Activation::new(&g, 16);

        assert_eq!(activation.state(), ChainState::Idle);
        assert_eq!(activation.step(&mut ctx), ChainState::Triggered { node: a });
        assert_eq!(activation.step(&mut ctx), ChainState::Chained { from: a, to: b });
        assert_eq!(activation.step(&mut ctx), ChainState::Triggered { node: b });
        activation.step(&mut ctx);
        activation.step(&mut ctx);
        assert_eq!(activation.step(&mut ctx), ChainState::Terminal);
        assert_eq!(activation.step(&mut ctx), ChainState::Terminal);
    }

    #[test]
    fn test_chain_runs_each_node_once_in_order() {
        let (g, ids) = three_step();
        let mut ctx = ExecutionContext::authoring();
        let report = ChainExecutor::default().run(&g, &mut ctx);
        assert_eq!(report.executed, ids.to_vec());
        assert!(!report.truncated);
        // Authoring mode: each event skips itself with one diagnostic.
        assert_eq!(report.diagnostics, 3);
        assert_eq!(ctx.diagnostics().count(DiagnosticKind::UnavailableContext), 3);
    }

    #[test]
    fn test_chain_length_guard() {
        let (g, ids) = three_step();
        let mut ctx = ExecutionContext::authoring();
        let report = ChainExecutor::new(2).run(&g, &mut ctx);
        assert_eq!(report.executed, ids[..2].to_vec());
        assert!(report.truncated);
    }

    #[test]
    fn test_zero_chain_length_runs_nothing() {
        let (g, _) = three_step();
        let mut ctx = ExecutionContext::authoring();
        let report = ChainExecutor::new(0).run(&g, &mut ctx);
        assert!(report.executed.is_empty());
        assert!(report.truncated);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_no_trigger_is_terminal() {
        let mut g = SkillGraph::new("empty");
        g.add_event("orphan", EventNode::CriticalHit);
        let report = ChainExecutor::default().run(&g, &mut ExecutionContext::authoring());
        assert!(report.executed.is_empty());
    }

    #[test]
    fn test_activate_without_provider_context() {
        let (g, _) = three_step();
        let mut provider: Option<ExecutionContext> = None;
        let report = ChainExecutor::default().activate(&g, &mut provider);
        assert!(!report.live);
        assert_eq!(report.executed.len(), 3);
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig::parse("[engine]\nmax_chain_length = 1").unwrap();
        let (g, _) = three_step();
        let mut ctx = ExecutionContext::authoring();
        let report = ChainExecutor::from_config(&config).run(&g, &mut ctx);
        assert_eq!(report.executed.len(), 1);
    }
}
