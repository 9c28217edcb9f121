//! Push-executed nodes that change battle state or post requests to the
//! combat resolver through the data bag.

use serde::{Deserialize, Serialize};
use skillgraph_core::data_bag::{BagRead, IntoPayload};
use skillgraph_core::{
    CharacterRef, DebuffKind, DebuffRequest, DiagnosticKind, Direction, ExecutionContext,
    ExecutionFlow, Intent, MoveCommand, MoveKind, Payload, ReflectDamage, Selection, StatKind,
    TypedValue, ValueType,
};
use tracing::debug;

use crate::port::{PortDescriptor, PortName, ResolvedInputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositionMode {
    Push,
    Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpMode {
    Behind,
    Beside,
}

/// Nodes run in order along the execution flow chain.
///
/// Numeric fields named after an input port are the value used when that
/// port is unconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventNode {
    /// Entry point of a chain. Does nothing itself.
    Trigger,
    AffectUnitStat {
        stat: Selection<StatKind>,
        delta: f64,
    },
    AffectEnemyStat {
        stat: Selection<StatKind>,
        delta: f64,
        #[serde(default)]
        affect_all: bool,
    },
    AffectAdjacentAllyStat {
        stat: Selection<StatKind>,
        delta: f64,
    },
    ApplyDebuff {
        debuff: Selection<DebuffKind>,
        /// Passed through to the resolver, which owns area geometry.
        #[serde(default)]
        radius: f64,
        duration: f64,
        #[serde(default = "default_intensity")]
        intensity: f64,
        #[serde(default)]
        affect_all: bool,
    },
    ReflectDamage {
        percent: f64,
    },
    DisableFollowup {
        #[serde(default)]
        affect_all: bool,
    },
    CriticalHit,
    FirstStrike,
    NegateNextAttack {
        #[serde(default)]
        turns: f64,
    },
    Reposition {
        mode: RepositionMode,
        #[serde(default = "default_distance")]
        distance: f64,
    },
    Warp {
        mode: WarpMode,
    },
    SwapUnitWithTarget,
    SetFlag {
        key: String,
        #[serde(default = "default_true")]
        value: bool,
    },
    SelectDirection {
        direction: Direction,
    },
}

fn default_intensity() -> f64 { 1.0 }
fn default_distance() -> f64 { 1.0 }
fn default_true() -> bool { true }

impl EventNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventNode::Trigger => "Trigger",
            EventNode::AffectUnitStat { .. } => "AffectUnitStat",
            EventNode::AffectEnemyStat { .. } => "AffectEnemyStat",
            EventNode::AffectAdjacentAllyStat { .. } => "AffectAdjacentAllyStat",
            EventNode::ApplyDebuff { .. } => "ApplyDebuff",
            EventNode::ReflectDamage { .. } => "ReflectDamage",
            EventNode::DisableFollowup { .. } => "DisableFollowup",
            EventNode::CriticalHit => "CriticalHit",
            EventNode::FirstStrike => "FirstStrike",
            EventNode::NegateNextAttack { .. } => "NegateNextAttack",
            EventNode::Reposition { .. } => "Reposition",
            EventNode::Warp { .. } => "Warp",
            EventNode::SwapUnitWithTarget => "SwapUnitWithTarget",
            EventNode::SetFlag { .. } => "SetFlag",
            EventNode::SelectDirection { .. } => "SelectDirection",
        }
    }

    pub fn inputs(&self) -> Vec<PortDescriptor> {
        let delta = PortDescriptor::new(PortName::Delta, ValueType::Float);
        let affect_all = PortDescriptor::new(PortName::AffectAll, ValueType::Bool);
        match self {
            EventNode::AffectUnitStat { .. } | EventNode::AffectAdjacentAllyStat { .. } => {
                vec![delta]
            }
            EventNode::AffectEnemyStat { .. } => vec![delta, affect_all],
            EventNode::ApplyDebuff { .. } => vec![
                PortDescriptor::new(PortName::Duration, ValueType::Float),
                PortDescriptor::new(PortName::Intensity, ValueType::Float),
                affect_all,
            ],
            EventNode::ReflectDamage { .. } => {
                vec![PortDescriptor::new(PortName::Percent, ValueType::Float)]
            }
            EventNode::DisableFollowup { .. } => vec![affect_all],
            EventNode::NegateNextAttack { .. } => {
                vec![PortDescriptor::new(PortName::Turns, ValueType::Float)]
            }
            EventNode::Reposition { .. } => {
                vec![PortDescriptor::new(PortName::Distance, ValueType::Float)]
            }
            EventNode::SetFlag { .. } => {
                vec![PortDescriptor::new(PortName::Value, ValueType::Bool)]
            }
            EventNode::Trigger
            | EventNode::CriticalHit
            | EventNode::FirstStrike
            | EventNode::Warp { .. }
            | EventNode::SwapUnitWithTarget
            | EventNode::SelectDirection { .. } => vec![],
        }
    }

    /// Value used for an unconnected input.
    pub fn default_input(&self, port: PortName) -> Option<TypedValue> {
        let value = match (self, port) {
            (EventNode::AffectUnitStat { delta, .. }, PortName::Delta)
            | (EventNode::AffectEnemyStat { delta, .. }, PortName::Delta)
            | (EventNode::AffectAdjacentAllyStat { delta, .. }, PortName::Delta) => {
                TypedValue::Float(*delta)
            }
            (EventNode::AffectEnemyStat { affect_all, .. }, PortName::AffectAll)
            | (EventNode::ApplyDebuff { affect_all, .. }, PortName::AffectAll)
            | (EventNode::DisableFollowup { affect_all }, PortName::AffectAll) => {
                TypedValue::Bool(*affect_all)
            }
            (EventNode::ApplyDebuff { duration, .. }, PortName::Duration) => {
                TypedValue::Float(*duration)
            }
            (EventNode::ApplyDebuff { intensity, .. }, PortName::Intensity) => {
                TypedValue::Float(*intensity)
            }
            (EventNode::ReflectDamage { percent }, PortName::Percent) => {
                TypedValue::Float(*percent)
            }
            (EventNode::NegateNextAttack { turns }, PortName::Turns) => TypedValue::Float(*turns),
            (EventNode::Reposition { distance, .. }, PortName::Distance) => {
                TypedValue::Float(*distance)
            }
            (EventNode::SetFlag { value, .. }, PortName::Value) => TypedValue::Bool(*value),
            _ => return None,
        };
        Some(value)
    }

    /// Apply this node's effect to the context.
    ///
    /// Always completes: problems are recorded as diagnostics on the context
    /// and the node does as much of its work as it can.
    pub fn execute(
        &self,
        label: &str,
        inputs: &ResolvedInputs,
        ctx: &mut ExecutionContext,
    ) -> ExecutionFlow {
        if matches!(self, EventNode::Trigger) {
            return ExecutionFlow;
        }
        if !ctx.is_live() {
            ctx.report(
                label,
                DiagnosticKind::UnavailableContext,
                format!("{} skipped: not in a live battle", self.type_name()),
            );
            return ExecutionFlow;
        }

        match self {
            EventNode::Trigger => {}
            EventNode::AffectUnitStat { stat, .. } => {
                let kind = known_stat(label, stat, ctx);
                let unit = acting_unit(label, ctx);
                if let (Some(kind), Some(unit)) = (kind, unit) {
                    ctx.apply_stat_delta(label, &unit, kind, inputs.float(PortName::Delta));
                }
            }
            EventNode::AffectEnemyStat { stat, .. } => {
                let Some(kind) = known_stat(label, stat, ctx) else {
                    return ExecutionFlow;
                };
                let delta = inputs.float(PortName::Delta);
                for target in affected_targets(label, inputs, ctx) {
                    ctx.apply_stat_delta(label, &target, kind, delta);
                }
            }
            EventNode::AffectAdjacentAllyStat { stat, .. } => {
                let Some(kind) = known_stat(label, stat, ctx) else {
                    return ExecutionFlow;
                };
                let allies: Vec<CharacterRef> = ctx
                    .live_state()
                    .map(|l| l.adjacent_allies().into_iter().map(|(_, c)| c.clone()).collect())
                    .unwrap_or_default();
                if allies.is_empty() {
                    ctx.report(label, DiagnosticKind::MissingDependency, "no adjacent allies");
                }
                let delta = inputs.float(PortName::Delta);
                for ally in allies {
                    ctx.apply_stat_delta(label, &ally, kind, delta);
                }
            }
            EventNode::ApplyDebuff { debuff, radius, .. } => {
                let Some(kind) = debuff.known().copied() else {
                    ctx.report(
                        label,
                        DiagnosticKind::UnparseableConfiguration,
                        format!("debuff {} does not name a known debuff", debuff),
                    );
                    return ExecutionFlow;
                };
                let request = DebuffRequest {
                    kind,
                    duration: to_count(inputs.float(PortName::Duration)),
                    intensity: inputs.float(PortName::Intensity),
                    radius: *radius,
                };
                for target in affected_targets(label, inputs, ctx) {
                    post(ctx, label, Intent::ApplyDebuff.key_for(&target.id), request.clone());
                }
            }
            EventNode::ReflectDamage { .. } => {
                if let Some(unit) = acting_unit(label, ctx) {
                    let percent = inputs.float(PortName::Percent);
                    let key = Intent::ReflectDamage.key_for(&unit.id);
                    post(ctx, label, key, ReflectDamage { percent });
                }
            }
            EventNode::DisableFollowup { .. } => {
                for target in affected_targets(label, inputs, ctx) {
                    post(ctx, label, Intent::DisableFollowup.key_for(&target.id), true);
                }
            }
            EventNode::CriticalHit => flag_unit(label, Intent::CriticalHit, ctx),
            EventNode::FirstStrike => flag_unit(label, Intent::FirstStrike, ctx),
            EventNode::NegateNextAttack { .. } => {
                if let Some(unit) = acting_unit(label, ctx) {
                    let turns = to_count(inputs.float(PortName::Turns));
                    let payload = if turns == 0 {
                        Payload::Flag { value: true }
                    } else {
                        Payload::Count { value: i64::from(turns) }
                    };
                    post(ctx, label, Intent::NegateNextAttack.key_for(&unit.id), payload);
                }
            }
            EventNode::Reposition { mode, .. } => {
                let kind = match mode {
                    RepositionMode::Push => MoveKind::Push,
                    RepositionMode::Pull => MoveKind::Pull,
                };
                let distance = to_count(inputs.float(PortName::Distance));
                let direction = selected_direction(label, ctx);
                // The neighbour is the one that moves.
                if let Some(cmd) = move_command(label, kind, distance, direction, ctx) {
                    post(ctx, label, Intent::Reposition.key_for(&cmd.anchor), cmd);
                }
            }
            EventNode::Warp { mode } => {
                let kind = match mode {
                    WarpMode::Behind => MoveKind::WarpBehind,
                    WarpMode::Beside => MoveKind::WarpBeside,
                };
                let direction = selected_direction(label, ctx);
                if let Some(cmd) = move_command(label, kind, 1, direction, ctx) {
                    post(ctx, label, Intent::Warp.key_for(&cmd.subject), cmd);
                }
            }
            EventNode::SwapUnitWithTarget => {
                let direction =
                    selected_direction(label, ctx).or_else(|| primary_target_direction(ctx));
                if let Some(cmd) = move_command(label, MoveKind::Swap, 1, direction, ctx) {
                    post(ctx, label, Intent::SwapUnitWithTarget.key_for(&cmd.subject), cmd);
                }
            }
            EventNode::SetFlag { key, .. } => {
                let value = inputs.bool(PortName::Value);
                post(ctx, label, key.clone(), value);
            }
            EventNode::SelectDirection { direction } => {
                post(ctx, label, Intent::SelectedDirection.global_key(), *direction);
            }
        }

        ExecutionFlow
    }
}

fn post(ctx: &mut ExecutionContext, label: &str, key: String, value: impl IntoPayload) {
    let payload = value.into_payload();
    debug!(node = label, key = %key, kind = payload.kind_name(), "Data bag write");
    ctx.data_bag_mut().set(key, payload);
}

fn to_count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

fn known_stat(
    label: &str,
    stat: &Selection<StatKind>,
    ctx: &ExecutionContext,
) -> Option<StatKind> {
    let kind = stat.known().copied();
    if kind.is_none() {
        ctx.report(
            label,
            DiagnosticKind::UnparseableConfiguration,
            format!("stat {} does not name a known stat", stat),
        );
    }
    kind
}

fn acting_unit(label: &str, ctx: &ExecutionContext) -> Option<CharacterRef> {
    let unit = ctx.live_state().and_then(|l| l.unit()).cloned();
    if unit.is_none() {
        ctx.report(label, DiagnosticKind::MissingDependency, "no acting unit");
    }
    unit
}

/// Primary target, or every target when `affect_all` is set on the node or
/// requested earlier through the `AffectAllTargets` bag entry.
fn affected_targets(
    label: &str,
    inputs: &ResolvedInputs,
    ctx: &ExecutionContext,
) -> Vec<CharacterRef> {
    let affect_all = inputs.bool(PortName::AffectAll)
        || ctx.bag_value(label, &Intent::AffectAllTargets.global_key(), false);

    let targets: Vec<CharacterRef> = match ctx.live_state() {
        Some(l) if affect_all => l.targets().to_vec(),
        Some(l) => l.primary_target().cloned().into_iter().collect(),
        None => Vec::new(),
    };
    if targets.is_empty() {
        ctx.report(label, DiagnosticKind::MissingDependency, "no targets");
    }
    targets
}

fn flag_unit(label: &str, intent: Intent, ctx: &mut ExecutionContext) {
    if let Some(unit) = acting_unit(label, ctx) {
        post(ctx, label, intent.key_for(&unit.id), true);
    }
}

fn selected_direction(label: &str, ctx: &ExecutionContext) -> Option<Direction> {
    let key = Intent::SelectedDirection.global_key();
    match ctx.data_bag().read::<Direction>(&key) {
        BagRead::Found(d) => Some(d),
        BagRead::Missing => None,
        BagRead::Mismatch { found } => {
            ctx.report(
                label,
                DiagnosticKind::TypeMismatch,
                format!("{} holds {}, expected direction", key, found),
            );
            None
        }
    }
}

fn primary_target_direction(ctx: &ExecutionContext) -> Option<Direction> {
    let live = ctx.live_state()?;
    let target = live.primary_target()?;
    live.adjacent_units()
        .find(|(_, c)| *c == target)
        .map(|(d, _)| d)
}

fn move_command(
    label: &str,
    kind: MoveKind,
    distance: u32,
    direction: Option<Direction>,
    ctx: &ExecutionContext,
) -> Option<MoveCommand> {
    let Some(direction) = direction else {
        ctx.report(label, DiagnosticKind::MissingDependency, "no direction selected");
        return None;
    };
    let subject = acting_unit(label, ctx)?;
    let Some(anchor) = ctx.live_state().and_then(|l| l.adjacent(direction)).cloned() else {
        ctx.report(
            label,
            DiagnosticKind::MissingDependency,
            format!("nobody to the {}", direction),
        );
        return None;
    };
    Some(MoveCommand {
        kind,
        subject: subject.id,
        anchor: anchor.id,
        direction,
        distance,
    })
}
