pub mod graph;
pub mod nodes;
pub mod port;

pub use graph::{
    Activation, ActivationReport, BattleContextProvider, ChainExecutor, ChainState, FlowLink,
    Link, Node, NodeId, SkillGraph,
};
pub use nodes::{
    CompareOp, ConditionNode, EventNode, LogicOp, MathOp, NodeKind, RepositionMode, StatPreview,
    WarpMode,
};
pub use port::{PortDescriptor, PortName, ResolvedInputs};
