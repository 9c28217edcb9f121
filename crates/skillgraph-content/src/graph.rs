//! Skill graph definitions as authored in TOML.
//!
//! ```toml
//! name = "Cleave"
//! trigger = "start"
//!
//! [[nodes]]
//! id = "start"
//! type = "trigger"
//!
//! [[nodes]]
//! id = "hit"
//! type = "affect_enemy_stat"
//! stat = "HP"
//! delta = -10
//! affect_all = true
//!
//! [[flow]]
//! from = "start"
//! to = "hit"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use skillgraph_core::config::ContentConfig;
use skillgraph_core::error::{Result, SkillGraphError};
use skillgraph_core::{
    DebuffKind, Direction, EnvironmentalCondition, Selection, SkillId, StatKind, TypedValue,
};
use skillgraph_engine::{
    CompareOp, ConditionNode, EventNode, LogicOp, MathOp, NodeId, NodeKind, PortName,
    RepositionMode, SkillGraph, StatPreview, WarpMode,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct GraphDefinition {
    pub name: String,
    pub trigger: String,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
    #[serde(default)]
    pub flow: Vec<FlowDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    #[serde(flatten)]
    pub spec: NodeSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkDefinition {
    pub from: String,
    pub output: String,
    pub to: String,
    pub input: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowDefinition {
    pub from: String,
    pub to: String,
}

/// A constant as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Bool(bool),
    Float(f64),
    Str(String),
}

impl From<ConstantValue> for TypedValue {
    fn from(v: ConstantValue) -> Self {
        match v {
            ConstantValue::Bool(b) => TypedValue::Bool(b),
            ConstantValue::Float(f) => TypedValue::Float(f),
            ConstantValue::Str(s) => TypedValue::Str(s),
        }
    }
}

fn default_true() -> bool { true }
fn default_intensity() -> f64 { 1.0 }
fn default_distance() -> f64 { 1.0 }

/// Per-type node fields. Stat, debuff and direction names are free text
/// here and translated when the graph is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSpec {
    UnitStat {
        stat: String,
        #[serde(default = "default_true")]
        bounded: bool,
        #[serde(default)]
        preview: StatPreview,
    },
    EnemyStat {
        stat: String,
        #[serde(default = "default_true")]
        bounded: bool,
        #[serde(default)]
        preview: StatPreview,
    },
    Constant {
        value: ConstantValue,
    },
    Compare {
        op: CompareOp,
        #[serde(default)]
        a: f64,
        #[serde(default)]
        b: f64,
    },
    Logic {
        op: LogicOp,
        #[serde(default)]
        a: bool,
        #[serde(default)]
        b: bool,
    },
    Not {
        #[serde(default)]
        a: bool,
    },
    Math {
        op: MathOp,
        #[serde(default)]
        a: f64,
        #[serde(default)]
        b: f64,
    },
    Environment {
        condition: EnvironmentalCondition,
        #[serde(default)]
        preview: bool,
    },
    SkillUseCount {
        skill: String,
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
    BagFlag {
        key: String,
        #[serde(default)]
        preview: bool,
    },
    Trigger,
    AffectUnitStat {
        stat: String,
        #[serde(default = "default_true")]
        bounded: bool,
        #[serde(default)]
        delta: f64,
    },
    AffectEnemyStat {
        stat: String,
        #[serde(default = "default_true")]
        bounded: bool,
        #[serde(default)]
        delta: f64,
        #[serde(default)]
        affect_all: bool,
    },
    AffectAdjacentAllyStat {
        stat: String,
        #[serde(default = "default_true")]
        bounded: bool,
        #[serde(default)]
        delta: f64,
    },
    ApplyDebuff {
        debuff: String,
        #[serde(default)]
        radius: f64,
        #[serde(default)]
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
        direction: String,
    },
}

impl GraphDefinition {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SkillGraphError::Content(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Translate into a validated graph.
    ///
    /// Unknown node ids and port names are errors. Unknown stat or debuff
    /// names are kept as [`Selection::Unrecognized`] and logged: the node
    /// reports them each time it runs.
    pub fn build(&self, content: &ContentConfig) -> Result<SkillGraph> {
        let mut graph = SkillGraph::new(&self.name);
        let mut ids: HashMap<&str, NodeId> = HashMap::new();

        for def in &self.nodes {
            if ids.contains_key(def.id.as_str()) {
                return Err(SkillGraphError::DuplicateNode(def.id.clone()));
            }
            let kind = translate(&def.id, &def.spec, content)?;
            ids.insert(def.id.as_str(), graph.add_node(&def.id, kind));
        }

        let lookup = |id: &str| {
            ids.get(id)
                .copied()
                .ok_or_else(|| SkillGraphError::UnknownNodeRef(id.to_string()))
        };

        for link in &self.links {
            graph.connect(
                lookup(&link.from)?,
                link.output.parse::<PortName>()?,
                lookup(&link.to)?,
                link.input.parse::<PortName>()?,
            )?;
        }
        for flow in &self.flow {
            graph.chain(lookup(&flow.from)?, lookup(&flow.to)?)?;
        }
        graph.set_trigger(lookup(&self.trigger)?)?;
        graph.validate()?;

        debug!(
            graph = %self.name,
            nodes = self.nodes.len(),
            links = self.links.len(),
            flow = self.flow.len(),
            "Built skill graph"
        );
        Ok(graph)
    }
}

/// Load and build a graph definition file.
pub fn load_graph(path: &Path, content: &ContentConfig) -> Result<SkillGraph> {
    GraphDefinition::load(path)?.build(content)
}

fn stat(node: &str, raw: &str, bounded: bool, content: &ContentConfig) -> Selection<StatKind> {
    match StatKind::parse(content.stat_name(raw), bounded) {
        Ok(kind) => kind.into(),
        Err(_) => {
            warn!(node, stat = raw, bounded, "Unrecognized stat name");
            Selection::Unrecognized(raw.to_string())
        }
    }
}

fn debuff(node: &str, raw: &str, content: &ContentConfig) -> Selection<DebuffKind> {
    match content.debuff_name(raw).parse::<DebuffKind>() {
        Ok(kind) => kind.into(),
        Err(_) => {
            warn!(node, debuff = raw, "Unrecognized debuff name");
            Selection::Unrecognized(raw.to_string())
        }
    }
}

fn translate(node: &str, spec: &NodeSpec, content: &ContentConfig) -> Result<NodeKind> {
    let kind: NodeKind = match spec.clone() {
        NodeSpec::UnitStat { stat: raw, bounded, preview } => ConditionNode::UnitStat {
            stat: stat(node, &raw, bounded, content),
            preview,
        }
        .into(),
        NodeSpec::EnemyStat { stat: raw, bounded, preview } => ConditionNode::EnemyStat {
            stat: stat(node, &raw, bounded, content),
            preview,
        }
        .into(),
        NodeSpec::Constant { value } => ConditionNode::Constant { value: value.into() }.into(),
        NodeSpec::Compare { op, a, b } => ConditionNode::Compare { op, a, b }.into(),
        NodeSpec::Logic { op, a, b } => ConditionNode::Logic { op, a, b }.into(),
        NodeSpec::Not { a } => ConditionNode::Not { a }.into(),
        NodeSpec::Math { op, a, b } => ConditionNode::Math { op, a, b }.into(),
        NodeSpec::Environment { condition, preview } => {
            ConditionNode::Environment { condition, preview }.into()
        }
        NodeSpec::SkillUseCount { skill, preview } => ConditionNode::SkillUseCount {
            skill: SkillId::new(skill),
            preview,
        }
        .into(),
        NodeSpec::TargetCount { preview } => ConditionNode::TargetCount { preview }.into(),
        NodeSpec::AdjacentAllies { preview } => ConditionNode::AdjacentAllies { preview }.into(),
        NodeSpec::BagFlag { key, preview } => ConditionNode::BagFlag { key, preview }.into(),
        NodeSpec::Trigger => EventNode::Trigger.into(),
        NodeSpec::AffectUnitStat { stat: raw, bounded, delta } => EventNode::AffectUnitStat {
            stat: stat(node, &raw, bounded, content),
            delta,
        }
        .into(),
        NodeSpec::AffectEnemyStat { stat: raw, bounded, delta, affect_all } => {
            EventNode::AffectEnemyStat {
                stat: stat(node, &raw, bounded, content),
                delta,
                affect_all,
            }
            .into()
        }
        NodeSpec::AffectAdjacentAllyStat { stat: raw, bounded, delta } => {
            EventNode::AffectAdjacentAllyStat {
                stat: stat(node, &raw, bounded, content),
                delta,
            }
            .into()
        }
        NodeSpec::ApplyDebuff { debuff: raw, radius, duration, intensity, affect_all } => {
            EventNode::ApplyDebuff {
                debuff: debuff(node, &raw, content),
                radius,
                duration,
                intensity,
                affect_all,
            }
            .into()
        }
        NodeSpec::ReflectDamage { percent } => EventNode::ReflectDamage { percent }.into(),
        NodeSpec::DisableFollowup { affect_all } => {
            EventNode::DisableFollowup { affect_all }.into()
        }
        NodeSpec::CriticalHit => EventNode::CriticalHit.into(),
        NodeSpec::FirstStrike => EventNode::FirstStrike.into(),
        NodeSpec::NegateNextAttack { turns } => EventNode::NegateNextAttack { turns }.into(),
        NodeSpec::Reposition { mode, distance } => EventNode::Reposition { mode, distance }.into(),
        NodeSpec::Warp { mode } => EventNode::Warp { mode }.into(),
        NodeSpec::SwapUnitWithTarget => EventNode::SwapUnitWithTarget.into(),
        NodeSpec::SetFlag { key, value } => EventNode::SetFlag { key, value }.into(),
        NodeSpec::SelectDirection { direction } => EventNode::SelectDirection {
            direction: direction.parse::<Direction>()?,
        }
        .into(),
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_core::{BoundedStatType, EngineConfig};

    const CLEAVE: &str = r#"
name = "Cleave"
trigger = "start"

[[nodes]]
id = "start"
type = "trigger"

[[nodes]]
id = "hp"
type = "unit_stat"
stat = "health"

[[nodes]]
id = "desperate"
type = "compare"
op = "less"
b = 50

[[nodes]]
id = "mark"
type = "set_flag"
key = "AffectAllTargets"

[[nodes]]
id = "hit"
type = "affect_enemy_stat"
stat = "HP"
delta = -10

[[links]]
from = "hp"
output = "percentage"
to = "desperate"
input = "a"

[[links]]
from = "desperate"
output = "result"
to = "mark"
input = "value"

[[flow]]
from = "start"
to = "mark"

[[flow]]
from = "mark"
to = "hit"
"#;

    fn aliases() -> ContentConfig {
        EngineConfig::parse("[content.stat_aliases]\nHP = \"Health\"")
            .unwrap()
            .content
    }

    #[test]
    fn test_build_with_aliases() {
        let graph = GraphDefinition::parse(CLEAVE).unwrap().build(&aliases()).unwrap();
        assert_eq!(graph.name(), "Cleave");
        assert_eq!(graph.nodes().len(), 5);
        assert_eq!(graph.links().len(), 2);

        let hit = graph.node(graph.find("hit").unwrap()).unwrap();
        match &hit.kind {
            NodeKind::Event(EventNode::AffectEnemyStat { stat, delta, .. }) => {
                assert_eq!(stat.known(), Some(&StatKind::Bounded(BoundedStatType::Health)));
                assert_eq!(*delta, -10.0);
            }
            other => panic!("unexpected node {:?}", other),
        }
        let order: Vec<&str> = graph
            .chain_order()
            .into_iter()
            .map(|id| graph.node(id).unwrap().label.as_str())
            .collect();
        assert_eq!(order, vec!["start", "mark", "hit"]);
    }

    #[test]
    fn test_unknown_stat_is_kept_unrecognized() {
        let graph = GraphDefinition::parse(CLEAVE)
            .unwrap()
            .build(&ContentConfig::default())
            .unwrap();
        let hit = graph.node(graph.find("hit").unwrap()).unwrap();
        let NodeKind::Event(EventNode::AffectEnemyStat { stat, .. }) = &hit.kind else {
            panic!("unexpected node");
        };
        assert_eq!(stat, &Selection::Unrecognized("HP".to_string()));
    }

    #[test]
    fn test_unknown_references_are_errors() {
        let bad_node = CLEAVE.replace("to = \"hit\"", "to = \"miss\"");
        assert!(matches!(
            GraphDefinition::parse(&bad_node).unwrap().build(&aliases()),
            Err(SkillGraphError::UnknownNodeRef(_))
        ));

        let bad_port = CLEAVE.replace("output = \"percentage\"", "output = \"ratio\"");
        assert!(matches!(
            GraphDefinition::parse(&bad_port).unwrap().build(&aliases()),
            Err(SkillGraphError::Content(_))
        ));

        let dup = format!("{}\n[[nodes]]\nid = \"hp\"\ntype = \"critical_hit\"\n", CLEAVE);
        assert!(matches!(
            GraphDefinition::parse(&dup).unwrap().build(&aliases()),
            Err(SkillGraphError::DuplicateNode(_))
        ));
    }

    #[test]
    fn test_construction_errors_surface() {
        let branching = format!("{}\n[[flow]]\nfrom = \"start\"\nto = \"hit\"\n", CLEAVE);
        assert!(matches!(
            GraphDefinition::parse(&branching).unwrap().build(&aliases()),
            Err(SkillGraphError::BranchingFlow(_))
        ));
    }

    #[test]
    fn test_constants_and_directions() {
        let toml = r#"
name = "Shove"
trigger = "aim"

[[nodes]]
id = "aim"
type = "select_direction"
direction = "North-East"

[[nodes]]
id = "three"
type = "constant"
value = 3

[[nodes]]
id = "label"
type = "constant"
value = "fire"
"#;
        let graph = GraphDefinition::parse(toml).unwrap().build(&aliases()).unwrap();
        let three = graph.find("three").unwrap();
        assert_eq!(graph.evaluate(three, PortName::Value, None), TypedValue::Float(3.0));
        let label = graph.find("label").unwrap();
        assert_eq!(graph.evaluate(label, PortName::Value, None), TypedValue::from("fire"));

        let aim = graph.node(graph.find("aim").unwrap()).unwrap();
        assert_eq!(
            aim.kind,
            NodeKind::Event(EventNode::SelectDirection { direction: Direction::NorthEast })
        );
    }

    #[test]
    fn test_unknown_node_type_is_content_error() {
        let toml = "name = \"x\"\ntrigger = \"a\"\n[[nodes]]\nid = \"a\"\ntype = \"teleport\"\n";
        assert!(matches!(
            GraphDefinition::parse(toml),
            Err(SkillGraphError::Content(_))
        ));
    }
}
