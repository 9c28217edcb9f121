//! Skill graph structure and execution.
//!
//! A skill is a graph of condition and event nodes. Condition outputs are
//! wired into inputs with value `Link`s and pulled on demand; event nodes
//! are ordered by `FlowLink`s into a single chain that the `ChainExecutor`
//! walks from the trigger, executing each node once.

pub mod edge;
pub mod executor;
pub mod node;
pub mod skill_graph;

pub use edge::{FlowLink, Link};
pub use executor::{Activation, ActivationReport, BattleContextProvider, ChainExecutor, ChainState};
pub use node::{Node, NodeId};
pub use skill_graph::SkillGraph;
