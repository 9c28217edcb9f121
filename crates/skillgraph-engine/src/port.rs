//! Named slots on nodes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skillgraph_core::diagnostics::emit;
use skillgraph_core::{DiagnosticKind, ExecutionContext, SkillGraphError, TypedValue, ValueType};

/// Name of an input or output slot.
///
/// The set is closed: a node declares which of these it exposes, and links
/// are checked against those declarations when the graph is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortName {
    Current,
    Max,
    Percentage,
    Bonus,
    BonusActive,
    Value,
    Result,
    Count,
    Active,
    A,
    B,
    Delta,
    AffectAll,
    Percent,
    Duration,
    Intensity,
    Turns,
    Distance,
}

impl PortName {
    pub const ALL: [PortName; 18] = [
        PortName::Current,
        PortName::Max,
        PortName::Percentage,
        PortName::Bonus,
        PortName::BonusActive,
        PortName::Value,
        PortName::Result,
        PortName::Count,
        PortName::Active,
        PortName::A,
        PortName::B,
        PortName::Delta,
        PortName::AffectAll,
        PortName::Percent,
        PortName::Duration,
        PortName::Intensity,
        PortName::Turns,
        PortName::Distance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PortName::Current => "current",
            PortName::Max => "max",
            PortName::Percentage => "percentage",
            PortName::Bonus => "bonus",
            PortName::BonusActive => "bonus_active",
            PortName::Value => "value",
            PortName::Result => "result",
            PortName::Count => "count",
            PortName::Active => "active",
            PortName::A => "a",
            PortName::B => "b",
            PortName::Delta => "delta",
            PortName::AffectAll => "affect_all",
            PortName::Percent => "percent",
            PortName::Duration => "duration",
            PortName::Intensity => "intensity",
            PortName::Turns => "turns",
            PortName::Distance => "distance",
        }
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortName {
    type Err = SkillGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| SkillGraphError::Content(format!("unknown port: {}", s)))
    }
}

/// Port descriptor for a node input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortDescriptor {
    pub name: PortName,
    pub value_type: ValueType,
}

impl PortDescriptor {
    pub const fn new(name: PortName, value_type: ValueType) -> Self {
        Self { name, value_type }
    }
}

/// Input values of one node, already resolved.
///
/// Every declared input is present: connected inputs hold the upstream
/// value, unconnected ones the node's configured default.
#[derive(Debug, Clone, Default)]
pub struct ResolvedInputs {
    values: BTreeMap<PortName, TypedValue>,
}

impl ResolvedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: PortName, value: TypedValue) {
        self.values.insert(port, value);
    }

    pub fn get(&self, port: PortName) -> Option<&TypedValue> {
        self.values.get(&port)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn float(&self, port: PortName) -> f64 {
        match self.values.get(&port) {
            Some(TypedValue::Float(v)) => *v,
            other => {
                debug_assert!(other.is_none(), "input {} resolved to a non-float", port);
                0.0
            }
        }
    }

    pub fn bool(&self, port: PortName) -> bool {
        match self.values.get(&port) {
            Some(TypedValue::Bool(v)) => *v,
            other => {
                debug_assert!(other.is_none(), "input {} resolved to a non-bool", port);
                false
            }
        }
    }

    pub fn str(&self, port: PortName) -> &str {
        match self.values.get(&port) {
            Some(TypedValue::Str(v)) => v.as_str(),
            _ => "",
        }
    }
}

/// Report a diagnostic into the context journal if there is one, or just
/// log it while authoring.
pub(crate) fn diagnose(
    ctx: Option<&ExecutionContext>,
    node: &str,
    kind: DiagnosticKind,
    message: impl Into<String>,
) {
    match ctx {
        Some(ctx) => ctx.report(node, kind, message),
        None => emit(node, kind, &message.into()),
    }
}
