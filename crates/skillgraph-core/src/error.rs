use thiserror::Error;

use crate::value::ValueType;

#[derive(Debug, Error)]
pub enum SkillGraphError {
    // Graph construction errors
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Port not found: node {node}, port {port}")]
    PortNotFound { node: u32, port: String },

    #[error("Type mismatch on link: expected {expected}, got {got}")]
    TypeMismatch { expected: ValueType, got: ValueType },

    #[error("Input already connected: node {node}, port {port}")]
    InputAlreadyConnected { node: u32, port: String },

    #[error("Link would create a cycle through node {0}")]
    CycleDetected(u32),

    #[error("Node {0} is not an event node")]
    NotAnEvent(u32),

    #[error("Node {0} is not a condition node")]
    NotACondition(u32),

    #[error("Event node {0} already has a successor (branching flow is unsupported)")]
    BranchingFlow(u32),

    #[error("Event node {0} already has a predecessor")]
    MergingFlow(u32),

    #[error("Graph has no trigger node")]
    NoTrigger,

    // Content errors
    #[error("Unknown node reference: {0}")]
    UnknownNodeRef(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Unknown stat: {0}")]
    UnknownStat(String),

    #[error("Unknown debuff: {0}")]
    UnknownDebuff(String),

    #[error("Content error: {0}")]
    Content(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkillGraphError>;
