//! Pull-evaluated nodes that read battle state.

use serde::{Deserialize, Serialize};
use skillgraph_core::{
    CharacterRef, DiagnosticKind, EnvironmentalCondition, ExecutionContext, LiveState, Selection,
    SkillId, Stat, StatKind, TypedValue, ValueType,
};

use crate::port::{diagnose, PortDescriptor, PortName, ResolvedInputs};

/// Stat values shown while authoring, when there is no battle to read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatPreview {
    pub current: f64,
    pub max: f64,
    pub bonus: f64,
}

impl Default for StatPreview {
    fn default() -> Self {
        Self {
            current: 100.0,
            max: 100.0,
            bonus: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
    GreaterOrEqual,
    Greater,
}

impl CompareOp {
    pub fn apply(&self, a: f64, b: f64) -> bool {
        match self {
            CompareOp::Less => a < b,
            CompareOp::LessOrEqual => a <= b,
            CompareOp::Equal => a == b,
            CompareOp::NotEqual => a != b,
            CompareOp::GreaterOrEqual => a >= b,
            CompareOp::Greater => a > b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
}

/// Nodes that compute a value from battle state without changing it.
///
/// Fields named after an input port hold the value used when that port is
/// unconnected. `preview` fields are returned while no battle is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionNode {
    /// A stat of the acting unit.
    UnitStat {
        stat: Selection<StatKind>,
        #[serde(default)]
        preview: StatPreview,
    },
    /// A stat of the primary target.
    EnemyStat {
        stat: Selection<StatKind>,
        #[serde(default)]
        preview: StatPreview,
    },
    Constant { value: TypedValue },
    Compare { op: CompareOp, a: f64, b: f64 },
    Logic { op: LogicOp, a: bool, b: bool },
    Not { a: bool },
    Math { op: MathOp, a: f64, b: f64 },
    Environment {
        condition: EnvironmentalCondition,
        #[serde(default)]
        preview: bool,
    },
    SkillUseCount {
        skill: SkillId,
        #[serde(default)]
        preview: f64,
    },
    TargetCount {
        #[serde(default)]
        preview: f64,
    },
    AdjacentAllies {
        #[serde(default)]
        preview: f64,
    },
    /// A boolean written earlier in the activation by another node.
    BagFlag {
        key: String,
        #[serde(default)]
        preview: bool,
    },
}

const STAT_OUTPUTS: [PortDescriptor; 5] = [
    PortDescriptor::new(PortName::Current, ValueType::Float),
    PortDescriptor::new(PortName::Max, ValueType::Float),
    PortDescriptor::new(PortName::Percentage, ValueType::Float),
    PortDescriptor::new(PortName::Bonus, ValueType::Float),
    PortDescriptor::new(PortName::BonusActive, ValueType::Bool),
];

impl ConditionNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConditionNode::UnitStat { .. } => "UnitStat",
            ConditionNode::EnemyStat { .. } => "EnemyStat",
            ConditionNode::Constant { .. } => "Constant",
            ConditionNode::Compare { .. } => "Compare",
            ConditionNode::Logic { .. } => "Logic",
            ConditionNode::Not { .. } => "Not",
            ConditionNode::Math { .. } => "Math",
            ConditionNode::Environment { .. } => "Environment",
            ConditionNode::SkillUseCount { .. } => "SkillUseCount",
            ConditionNode::TargetCount { .. } => "TargetCount",
            ConditionNode::AdjacentAllies { .. } => "AdjacentAllies",
            ConditionNode::BagFlag { .. } => "BagFlag",
        }
    }

    pub fn inputs(&self) -> Vec<PortDescriptor> {
        match self {
            ConditionNode::Compare { .. } | ConditionNode::Math { .. } => vec![
                PortDescriptor::new(PortName::A, ValueType::Float),
                PortDescriptor::new(PortName::B, ValueType::Float),
            ],
            ConditionNode::Logic { .. } => vec![
                PortDescriptor::new(PortName::A, ValueType::Bool),
                PortDescriptor::new(PortName::B, ValueType::Bool),
            ],
            ConditionNode::Not { .. } => vec![PortDescriptor::new(PortName::A, ValueType::Bool)],
            _ => vec![],
        }
    }

    pub fn outputs(&self) -> Vec<PortDescriptor> {
        match self {
            ConditionNode::UnitStat { .. } | ConditionNode::EnemyStat { .. } => {
                STAT_OUTPUTS.to_vec()
            }
            ConditionNode::Constant { value } => {
                vec![PortDescriptor::new(PortName::Value, value.value_type())]
            }
            ConditionNode::Compare { .. }
            | ConditionNode::Logic { .. }
            | ConditionNode::Not { .. } => {
                vec![PortDescriptor::new(PortName::Result, ValueType::Bool)]
            }
            ConditionNode::Math { .. } => {
                vec![PortDescriptor::new(PortName::Result, ValueType::Float)]
            }
            ConditionNode::Environment { .. } => {
                vec![PortDescriptor::new(PortName::Active, ValueType::Bool)]
            }
            ConditionNode::SkillUseCount { .. } | ConditionNode::TargetCount { .. } => {
                vec![PortDescriptor::new(PortName::Count, ValueType::Float)]
            }
            ConditionNode::AdjacentAllies { .. } => vec![
                PortDescriptor::new(PortName::Count, ValueType::Float),
                PortDescriptor::new(PortName::Active, ValueType::Bool),
            ],
            ConditionNode::BagFlag { .. } => {
                vec![PortDescriptor::new(PortName::Value, ValueType::Bool)]
            }
        }
    }

    /// Value used for an unconnected input.
    pub fn default_input(&self, port: PortName) -> Option<TypedValue> {
        match (self, port) {
            (ConditionNode::Compare { a, .. }, PortName::A)
            | (ConditionNode::Math { a, .. }, PortName::A) => Some(TypedValue::Float(*a)),
            (ConditionNode::Compare { b, .. }, PortName::B)
            | (ConditionNode::Math { b, .. }, PortName::B) => Some(TypedValue::Float(*b)),
            (ConditionNode::Logic { a, .. }, PortName::A)
            | (ConditionNode::Not { a }, PortName::A) => Some(TypedValue::Bool(*a)),
            (ConditionNode::Logic { b, .. }, PortName::B) => Some(TypedValue::Bool(*b)),
            _ => None,
        }
    }

    /// Compute the value of one output port.
    ///
    /// Never fails: without a live battle the configured preview is
    /// returned, and any missing dependency yields the neutral value of the
    /// port's type along with a diagnostic.
    pub fn evaluate(
        &self,
        label: &str,
        port: PortName,
        inputs: &ResolvedInputs,
        ctx: Option<&ExecutionContext>,
    ) -> TypedValue {
        let live = ctx.and_then(|c| c.live_state());

        match self {
            ConditionNode::UnitStat { stat, preview } => {
                let who = live.map(|l| (l, l.unit()));
                stat_output(label, port, stat, preview, who, ctx, "acting unit")
            }
            ConditionNode::EnemyStat { stat, preview } => {
                let who = live.map(|l| (l, l.primary_target()));
                stat_output(label, port, stat, preview, who, ctx, "primary target")
            }
            ConditionNode::Constant { value } => value.clone(),
            ConditionNode::Compare { op, .. } => {
                let a = inputs.float(PortName::A);
                let b = inputs.float(PortName::B);
                TypedValue::Bool(op.apply(a, b))
            }
            ConditionNode::Logic { op, .. } => {
                let a = inputs.bool(PortName::A);
                let b = inputs.bool(PortName::B);
                let result = match op {
                    LogicOp::And => a && b,
                    LogicOp::Or => a || b,
                    LogicOp::Xor => a != b,
                };
                TypedValue::Bool(result)
            }
            ConditionNode::Not { .. } => TypedValue::Bool(!inputs.bool(PortName::A)),
            ConditionNode::Math { op, .. } => {
                let a = inputs.float(PortName::A);
                let b = inputs.float(PortName::B);
                let result = match op {
                    MathOp::Add => a + b,
                    MathOp::Subtract => a - b,
                    MathOp::Multiply => a * b,
                    MathOp::Divide if b == 0.0 => {
                        diagnose(ctx, label, DiagnosticKind::MissingDependency, "division by zero");
                        0.0
                    }
                    MathOp::Divide => a / b,
                    MathOp::Min => a.min(b),
                    MathOp::Max => a.max(b),
                };
                TypedValue::Float(result)
            }
            ConditionNode::Environment { condition, preview } => match live {
                Some(l) => TypedValue::Bool(l.environment().is_active(*condition)),
                None => TypedValue::Bool(*preview),
            },
            ConditionNode::SkillUseCount { skill, preview } => match live {
                Some(l) => TypedValue::Float(f64::from(l.skill_uses(skill))),
                None => TypedValue::Float(*preview),
            },
            ConditionNode::TargetCount { preview } => match live {
                Some(l) => TypedValue::Float(l.targets().len() as f64),
                None => TypedValue::Float(*preview),
            },
            ConditionNode::AdjacentAllies { preview } => {
                let count = match live {
                    Some(l) => l.adjacent_allies().len() as f64,
                    None => *preview,
                };
                match port {
                    PortName::Active => TypedValue::Bool(count > 0.0),
                    _ => TypedValue::Float(count),
                }
            }
            ConditionNode::BagFlag { key, preview } => match (ctx, live) {
                (Some(c), Some(_)) => TypedValue::Bool(c.bag_value(label, key, false)),
                _ => TypedValue::Bool(*preview),
            },
        }
    }
}

fn stat_output(
    label: &str,
    port: PortName,
    stat: &Selection<StatKind>,
    preview: &StatPreview,
    who: Option<(&LiveState, Option<&CharacterRef>)>,
    ctx: Option<&ExecutionContext>,
    role: &str,
) -> TypedValue {
    let Some((live, character)) = who else {
        let snapshot = match stat.known() {
            Some(StatKind::Unbounded(_)) => Stat::Unbounded {
                current: preview.current,
                bonus: preview.bonus,
            },
            _ => Stat::Bounded {
                current: preview.current,
                max: preview.max,
                bonus: preview.bonus,
            },
        };
        return stat_port(&snapshot, port);
    };

    let Some(character) = character else {
        diagnose(
            ctx,
            label,
            DiagnosticKind::MissingDependency,
            format!("no {} in the battle context", role),
        );
        return neutral_stat_port(port);
    };

    let Some(kind) = stat.known() else {
        diagnose(
            ctx,
            label,
            DiagnosticKind::UnparseableConfiguration,
            format!("stat {} does not name a known stat", stat),
        );
        return neutral_stat_port(port);
    };

    match live.stats().stat(&character.id, *kind) {
        Some(snapshot) => stat_port(&snapshot, port),
        None => {
            diagnose(
                ctx,
                label,
                DiagnosticKind::AbsentCapability,
                format!("{} has no {} stat", character, kind),
            );
            neutral_stat_port(port)
        }
    }
}

fn stat_port(stat: &Stat, port: PortName) -> TypedValue {
    match port {
        PortName::Current => TypedValue::Float(stat.current()),
        PortName::Max => TypedValue::Float(stat.max().unwrap_or(0.0)),
        PortName::Percentage => TypedValue::Float(stat.ratio().map_or(0.0, |r| r * 100.0)),
        PortName::Bonus => TypedValue::Float(stat.bonus()),
        PortName::BonusActive => TypedValue::Bool(stat.bonus() != 0.0),
        other => {
            debug_assert!(false, "stat nodes have no output {}", other);
            TypedValue::Float(0.0)
        }
    }
}

fn neutral_stat_port(port: PortName) -> TypedValue {
    match port {
        PortName::BonusActive => TypedValue::Bool(false),
        _ => TypedValue::Float(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_core::{
        BoundedStatType, CharacterSheet, EnvironmentalConditions, Roster, UnboundedStatType,
    };

    fn health() -> Selection<StatKind> {
        StatKind::Bounded(BoundedStatType::Health).into()
    }

    fn live_ctx() -> ExecutionContext {
        let roster = Roster::new()
            .with(
                "knight",
                CharacterSheet::new()
                    .with_bounded(BoundedStatType::Health, 50.0, 100.0)
                    .with_unbounded(UnboundedStatType::Strength, 12.0, 3.0),
            )
            .with(
                "goblin",
                CharacterSheet::new().with_bounded(BoundedStatType::Health, 8.0, 16.0),
            );
        ExecutionContext::live(
            LiveState::new(roster)
                .with_unit(CharacterRef::new("knight", "Knight"))
                .with_target(CharacterRef::new("goblin", "Goblin"))
                .with_environment(EnvironmentalConditions {
                    night: true,
                    ..Default::default()
                }),
        )
    }

    fn eval(node: &ConditionNode, port: PortName, ctx: Option<&ExecutionContext>) -> TypedValue {
        let mut inputs = ResolvedInputs::new();
        for desc in node.inputs() {
            if let Some(v) = node.default_input(desc.name) {
                inputs.insert(desc.name, v);
            }
        }
        node.evaluate("test", port, &inputs, ctx)
    }

    #[test]
    fn test_unit_stat_live_outputs() {
        let ctx = live_ctx();
        let node = ConditionNode::UnitStat {
            stat: health(),
            preview: StatPreview::default(),
        };
        assert_eq!(eval(&node, PortName::Current, Some(&ctx)), TypedValue::Float(50.0));
        assert_eq!(eval(&node, PortName::Max, Some(&ctx)), TypedValue::Float(100.0));
        assert_eq!(eval(&node, PortName::Percentage, Some(&ctx)), TypedValue::Float(50.0));
        assert_eq!(eval(&node, PortName::BonusActive, Some(&ctx)), TypedValue::Bool(false));
    }

    #[test]
    fn test_unbounded_stat_has_no_percentage() {
        let ctx = live_ctx();
        let node = ConditionNode::UnitStat {
            stat: StatKind::Unbounded(UnboundedStatType::Strength).into(),
            preview: StatPreview::default(),
        };
        assert_eq!(eval(&node, PortName::Current, Some(&ctx)), TypedValue::Float(12.0));
        assert_eq!(eval(&node, PortName::Percentage, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(eval(&node, PortName::Max, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(eval(&node, PortName::Bonus, Some(&ctx)), TypedValue::Float(3.0));
        assert_eq!(eval(&node, PortName::BonusActive, Some(&ctx)), TypedValue::Bool(true));
    }

    #[test]
    fn test_enemy_stat_reads_primary_target() {
        let ctx = live_ctx();
        let node = ConditionNode::EnemyStat {
            stat: health(),
            preview: StatPreview::default(),
        };
        assert_eq!(eval(&node, PortName::Current, Some(&ctx)), TypedValue::Float(8.0));
        assert_eq!(eval(&node, PortName::Percentage, Some(&ctx)), TypedValue::Float(50.0));
    }

    #[test]
    fn test_stat_preview_without_context_is_idempotent() {
        let node = ConditionNode::UnitStat {
            stat: health(),
            preview: StatPreview {
                current: 30.0,
                max: 40.0,
                bonus: 2.0,
            },
        };
        for _ in 0..3 {
            assert_eq!(eval(&node, PortName::Current, None), TypedValue::Float(30.0));
            assert_eq!(eval(&node, PortName::Percentage, None), TypedValue::Float(75.0));
            assert_eq!(eval(&node, PortName::BonusActive, None), TypedValue::Bool(true));
        }
    }

    #[test]
    fn test_authoring_context_uses_preview() {
        let ctx = ExecutionContext::authoring();
        let node = ConditionNode::Environment {
            condition: EnvironmentalCondition::Rain,
            preview: true,
        };
        assert_eq!(eval(&node, PortName::Active, Some(&ctx)), TypedValue::Bool(true));
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_target_is_neutral() {
        let ctx = ExecutionContext::live(LiveState::new(Roster::new()));
        let node = ConditionNode::EnemyStat {
            stat: health(),
            preview: StatPreview::default(),
        };
        assert_eq!(eval(&node, PortName::Current, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(
            ctx.diagnostics().count(DiagnosticKind::MissingDependency),
            1
        );
    }

    #[test]
    fn test_unrecognized_stat_is_neutral() {
        let ctx = live_ctx();
        let node = ConditionNode::UnitStat {
            stat: Selection::Unrecognized("Charisma".into()),
            preview: StatPreview::default(),
        };
        assert_eq!(eval(&node, PortName::BonusActive, Some(&ctx)), TypedValue::Bool(false));
        assert_eq!(
            ctx.diagnostics()
                .count(DiagnosticKind::UnparseableConfiguration),
            1
        );
    }

    #[test]
    fn test_absent_stat_is_neutral() {
        let ctx = live_ctx();
        let node = ConditionNode::EnemyStat {
            stat: StatKind::Unbounded(UnboundedStatType::Luck).into(),
            preview: StatPreview::default(),
        };
        assert_eq!(eval(&node, PortName::Current, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(ctx.diagnostics().count(DiagnosticKind::AbsentCapability), 1);
    }

    #[test]
    fn test_compare_logic_math_on_defaults() {
        let cmp = ConditionNode::Compare {
            op: CompareOp::Less,
            a: 1.0,
            b: 2.0,
        };
        assert_eq!(eval(&cmp, PortName::Result, None), TypedValue::Bool(true));

        let xor = ConditionNode::Logic {
            op: LogicOp::Xor,
            a: true,
            b: true,
        };
        assert_eq!(eval(&xor, PortName::Result, None), TypedValue::Bool(false));

        let not = ConditionNode::Not { a: false };
        assert_eq!(eval(&not, PortName::Result, None), TypedValue::Bool(true));

        let max = ConditionNode::Math {
            op: MathOp::Max,
            a: -3.0,
            b: 4.0,
        };
        assert_eq!(eval(&max, PortName::Result, None), TypedValue::Float(4.0));
    }

    #[test]
    fn test_divide_by_zero_is_neutral() {
        let ctx = ExecutionContext::authoring();
        let div = ConditionNode::Math {
            op: MathOp::Divide,
            a: 5.0,
            b: 0.0,
        };
        assert_eq!(eval(&div, PortName::Result, Some(&ctx)), TypedValue::Float(0.0));
        assert_eq!(ctx.diagnostics().len(), 1);
    }

    #[test]
    fn test_context_readers() {
        let ctx = live_ctx();
        let night = ConditionNode::Environment {
            condition: EnvironmentalCondition::Night,
            preview: false,
        };
        assert_eq!(eval(&night, PortName::Active, Some(&ctx)), TypedValue::Bool(true));

        let targets = ConditionNode::TargetCount { preview: 9.0 };
        assert_eq!(eval(&targets, PortName::Count, Some(&ctx)), TypedValue::Float(1.0));
        assert_eq!(eval(&targets, PortName::Count, None), TypedValue::Float(9.0));

        let uses = ConditionNode::SkillUseCount {
            skill: SkillId::new("cleave"),
            preview: 1.0,
        };
        assert_eq!(eval(&uses, PortName::Count, Some(&ctx)), TypedValue::Float(0.0));
    }

    #[test]
    fn test_bag_flag_reads_data_bag() {
        let mut ctx = live_ctx();
        let node = ConditionNode::BagFlag {
            key: "Empowered".into(),
            preview: true,
        };
        assert_eq!(eval(&node, PortName::Value, Some(&ctx)), TypedValue::Bool(false));
        ctx.data_bag_mut().set("Empowered", true);
        assert_eq!(eval(&node, PortName::Value, Some(&ctx)), TypedValue::Bool(true));
        assert_eq!(eval(&node, PortName::Value, None), TypedValue::Bool(true));
    }

    #[test]
    fn test_constant_output_type_follows_value() {
        let node = ConditionNode::Constant {
            value: TypedValue::Str("fire".into()),
        };
        assert_eq!(node.outputs()[0].value_type, ValueType::Str);
        assert_eq!(eval(&node, PortName::Value, None), TypedValue::from("fire"));
    }
}
