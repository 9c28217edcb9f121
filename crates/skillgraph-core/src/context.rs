//! Per-activation battle snapshot handed to a skill graph.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::character::{CharacterId, CharacterRef};
use crate::data_bag::{BagRead, DataBag, FromPayload};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::intent::Direction;
use crate::stats::{StatAccessor, StatKind};

/// Identity of a skill, used for per-encounter use counters.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SkillId(pub String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentalCondition {
    Night,
    Rain,
    Fog,
    Desert,
    Snow,
    Indoors,
}

/// Environmental flags of the current battlefield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    #[serde(default)]
    pub night: bool,
    #[serde(default)]
    pub rain: bool,
    #[serde(default)]
    pub fog: bool,
    #[serde(default)]
    pub desert: bool,
    #[serde(default)]
    pub snow: bool,
    #[serde(default)]
    pub indoors: bool,
}

impl EnvironmentalConditions {
    pub fn is_active(&self, condition: EnvironmentalCondition) -> bool {
        match condition {
            EnvironmentalCondition::Night => self.night,
            EnvironmentalCondition::Rain => self.rain,
            EnvironmentalCondition::Fog => self.fog,
            EnvironmentalCondition::Desert => self.desert,
            EnvironmentalCondition::Snow => self.snow,
            EnvironmentalCondition::Indoors => self.indoors,
        }
    }

    pub fn set(&mut self, condition: EnvironmentalCondition, active: bool) {
        let flag = match condition {
            EnvironmentalCondition::Night => &mut self.night,
            EnvironmentalCondition::Rain => &mut self.rain,
            EnvironmentalCondition::Fog => &mut self.fog,
            EnvironmentalCondition::Desert => &mut self.desert,
            EnvironmentalCondition::Snow => &mut self.snow,
            EnvironmentalCondition::Indoors => &mut self.indoors,
        };
        *flag = active;
    }
}

/// Battle state available while a skill resolves in combat.
///
/// Absent while content is being authored; nodes then fall back to their
/// configured test values.
#[derive(Debug)]
pub struct LiveState {
    unit: Option<CharacterRef>,
    targets: Vec<CharacterRef>,
    allies: Vec<CharacterRef>,
    adjacent_units: BTreeMap<Direction, CharacterRef>,
    environment: EnvironmentalConditions,
    skill_use_count: HashMap<SkillId, u32>,
    stats: Box<dyn StatAccessor>,
}

impl LiveState {
    pub fn new(stats: impl StatAccessor + 'static) -> Self {
        Self {
            unit: None,
            targets: Vec::new(),
            allies: Vec::new(),
            adjacent_units: BTreeMap::new(),
            environment: EnvironmentalConditions::default(),
            skill_use_count: HashMap::new(),
            stats: Box::new(stats),
        }
    }

    pub fn with_unit(mut self, unit: CharacterRef) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_target(mut self, target: CharacterRef) -> Self {
        self.add_target(target);
        self
    }

    pub fn with_ally(mut self, ally: CharacterRef) -> Self {
        self.add_ally(ally);
        self
    }

    pub fn with_adjacent(mut self, direction: Direction, unit: CharacterRef) -> Self {
        self.set_adjacent(direction, unit);
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentalConditions) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_skill_uses(mut self, skill: SkillId, uses: u32) -> Self {
        self.skill_use_count.insert(skill, uses);
        self
    }

    /// Append a target. Returns `false` (and keeps the order untouched) if
    /// the unit is already targeted.
    pub fn add_target(&mut self, target: CharacterRef) -> bool {
        if self.targets.contains(&target) {
            warn!(target = %target.id, "Duplicate target ignored");
            return false;
        }
        self.targets.push(target);
        true
    }

    /// Append an ally. Returns `false` if already present.
    pub fn add_ally(&mut self, ally: CharacterRef) -> bool {
        if self.allies.contains(&ally) {
            warn!(ally = %ally.id, "Duplicate ally ignored");
            return false;
        }
        self.allies.push(ally);
        true
    }

    /// Place a unit in a direction, returning whoever was there before.
    pub fn set_adjacent(
        &mut self,
        direction: Direction,
        unit: CharacterRef,
    ) -> Option<CharacterRef> {
        self.adjacent_units.insert(direction, unit)
    }

    pub fn unit(&self) -> Option<&CharacterRef> {
        self.unit.as_ref()
    }

    pub fn targets(&self) -> &[CharacterRef] {
        &self.targets
    }

    pub fn primary_target(&self) -> Option<&CharacterRef> {
        self.targets.first()
    }

    pub fn allies(&self) -> &[CharacterRef] {
        &self.allies
    }

    pub fn is_ally(&self, id: &CharacterId) -> bool {
        self.allies.iter().any(|a| &a.id == id)
    }

    pub fn adjacent(&self, direction: Direction) -> Option<&CharacterRef> {
        self.adjacent_units.get(&direction)
    }

    pub fn adjacent_units(&self) -> impl Iterator<Item = (Direction, &CharacterRef)> {
        self.adjacent_units.iter().map(|(d, c)| (*d, c))
    }

    /// Neighbours whose id appears in `allies`, in compass order.
    pub fn adjacent_allies(&self) -> Vec<(Direction, &CharacterRef)> {
        self.adjacent_units()
            .filter(|(_, c)| self.is_ally(&c.id))
            .collect()
    }

    /// Neighbours that are not allies (and not the acting unit).
    pub fn adjacent_enemies(&self) -> Vec<(Direction, &CharacterRef)> {
        self.adjacent_units()
            .filter(|(_, c)| !self.is_ally(&c.id) && self.unit.as_ref() != Some(*c))
            .collect()
    }

    pub fn environment(&self) -> &EnvironmentalConditions {
        &self.environment
    }

    pub fn skill_uses(&self, skill: &SkillId) -> u32 {
        self.skill_use_count.get(skill).copied().unwrap_or(0)
    }

    pub fn record_skill_use(&mut self, skill: SkillId) -> u32 {
        let count = self.skill_use_count.entry(skill).or_insert(0);
        *count += 1;
        *count
    }

    pub fn stats(&self) -> &dyn StatAccessor {
        self.stats.as_ref()
    }

    pub fn stats_mut(&mut self) -> &mut dyn StatAccessor {
        self.stats.as_mut()
    }
}

/// One applied stat mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatChange {
    pub node: String,
    pub character: CharacterId,
    pub stat: StatKind,
    pub before: f64,
    pub after: f64,
}

/// Everything the resolver collects once the activation is over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationOutcome {
    pub data_bag: DataBag,
    pub stat_changes: Vec<StatChange>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Mutable state of one skill activation.
///
/// Built by the combat resolver, mutated in place by event nodes, and
/// consumed once the chain has run. Never shared between activations.
#[derive(Debug)]
pub struct ExecutionContext {
    live: Option<LiveState>,
    data_bag: DataBag,
    diagnostics: Diagnostics,
    journal: Vec<StatChange>,
}

impl ExecutionContext {
    /// Context with no battle behind it.
    pub fn authoring() -> Self {
        Self {
            live: None,
            data_bag: DataBag::new(),
            diagnostics: Diagnostics::new(),
            journal: Vec::new(),
        }
    }

    pub fn live(state: LiveState) -> Self {
        Self {
            live: Some(state),
            ..Self::authoring()
        }
    }

    pub fn with_data_bag(mut self, bag: DataBag) -> Self {
        self.data_bag = bag;
        self
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn live_state(&self) -> Option<&LiveState> {
        self.live.as_ref()
    }

    pub fn live_state_mut(&mut self) -> Option<&mut LiveState> {
        self.live.as_mut()
    }

    pub fn data_bag(&self) -> &DataBag {
        &self.data_bag
    }

    pub fn data_bag_mut(&mut self) -> &mut DataBag {
        &mut self.data_bag
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn journal(&self) -> &[StatChange] {
        &self.journal
    }

    pub fn report(&self, node: &str, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.record(node, kind, message);
    }

    /// Typed bag read that journals a type mismatch.
    pub fn bag_value<T: FromPayload>(&self, node: &str, key: &str, default: T) -> T {
        match self.data_bag.read::<T>(key) {
            BagRead::Found(v) => v,
            BagRead::Missing => default,
            BagRead::Mismatch { found } => {
                self.report(
                    node,
                    DiagnosticKind::TypeMismatch,
                    format!("bag entry '{}' holds {}, expected {}", key, found, T::EXPECTED),
                );
                default
            }
        }
    }

    /// Add `delta` to the current value of a stat on one character.
    ///
    /// The result is stored unclamped. A missing stat is reported as an
    /// absent capability and leaves everything untouched.
    pub fn apply_stat_delta(
        &mut self,
        node: &str,
        who: &CharacterRef,
        kind: StatKind,
        delta: f64,
    ) -> Option<StatChange> {
        let Some(live) = self.live.as_mut() else {
            self.diagnostics.record(
                node,
                DiagnosticKind::UnavailableContext,
                format!("cannot change {} on {}: not in a live battle", kind, who),
            );
            return None;
        };

        let Some(stat) = live.stats().stat(&who.id, kind) else {
            self.diagnostics.record(
                node,
                DiagnosticKind::AbsentCapability,
                format!("{} has no {} stat", who, kind),
            );
            return None;
        };

        let before = stat.current();
        let after = before + delta;
        if !live.stats_mut().set_current(&who.id, kind, after) {
            self.diagnostics.record(
                node,
                DiagnosticKind::AbsentCapability,
                format!("{} rejected a write to {}", who, kind),
            );
            return None;
        }

        info!(
            node,
            character = %who.id,
            stat = %kind,
            before,
            after,
            "Stat changed"
        );

        let change = StatChange {
            node: node.to_string(),
            character: who.id.clone(),
            stat: kind,
            before,
            after,
        };
        self.journal.push(change.clone());
        Some(change)
    }

    /// Consume the context, keeping only the bag.
    pub fn into_data_bag(self) -> DataBag {
        self.data_bag
    }

    /// Hand the results to the resolver.
    pub fn into_outcome(self) -> ActivationOutcome {
        ActivationOutcome {
            data_bag: self.data_bag,
            stat_changes: self.journal,
            diagnostics: self.diagnostics.into_inner(),
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::authoring()
    }
}
