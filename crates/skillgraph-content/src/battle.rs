//! Battle fixtures: a roster plus the live state of one activation.
//!
//! ```toml
//! [[characters]]
//! id = "knight"
//! name = "Knight"
//! bounded = { Health = { current = 30, max = 30 } }
//! unbounded = { Strength = { current = 12, bonus = 2 } }
//!
//! [battle]
//! unit = "knight"
//! targets = ["goblin_1"]
//! adjacent = { north = "goblin_1" }
//! environment = { night = true }
//! bag = { AffectAllTargets = true }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use skillgraph_core::character::{BoundedValue, UnboundedValue};
use skillgraph_core::config::ContentConfig;
use skillgraph_core::error::{Result, SkillGraphError};
use skillgraph_core::{
    BoundedStatType, CharacterId, CharacterRef, CharacterSheet, DataBag, Direction,
    EnvironmentalConditions, ExecutionContext, Intent, LiveState, Payload, Roster, SkillId,
    UnboundedStatType,
};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct BattleFixture {
    #[serde(default)]
    pub characters: Vec<CharacterDefinition>,
    #[serde(default)]
    pub battle: BattleDefinition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bounded: BTreeMap<String, BoundedValue>,
    #[serde(default)]
    pub unbounded: BTreeMap<String, UnboundedValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BattleDefinition {
    pub unit: Option<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub allies: Vec<String>,
    /// Direction name to character id.
    #[serde(default)]
    pub adjacent: BTreeMap<String, String>,
    #[serde(default)]
    pub environment: EnvironmentalConditions,
    #[serde(default)]
    pub skill_uses: HashMap<String, u32>,
    /// Entries seeded into the data bag before the chain runs.
    #[serde(default)]
    pub bag: BTreeMap<String, BagSeed>,
}

/// A seeded bag value as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BagSeed {
    Flag(bool),
    Count(i64),
    Number(f64),
    Text(String),
}

impl BattleFixture {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SkillGraphError::Content(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Build the roster. Stat names go through the configured aliases;
    /// unlike graph content, an unknown stat here is an error.
    pub fn roster(&self, content: &ContentConfig) -> Result<Roster> {
        let mut roster = Roster::new();
        for def in &self.characters {
            let mut sheet = CharacterSheet::new();
            for (raw, value) in &def.bounded {
                let kind: BoundedStatType = content.stat_name(raw).parse()?;
                sheet.bounded.insert(kind, *value);
            }
            for (raw, value) in &def.unbounded {
                let kind: UnboundedStatType = content.stat_name(raw).parse()?;
                sheet.unbounded.insert(kind, *value);
            }
            roster.insert(CharacterId::new(&def.id), sheet);
        }
        Ok(roster)
    }

    /// Build the live context for one activation.
    pub fn into_context(self, content: &ContentConfig) -> Result<ExecutionContext> {
        let roster = self.roster(content)?;
        let character = |id: &str| -> Result<CharacterRef> {
            self.characters
                .iter()
                .find(|c| c.id == id)
                .map(|c| CharacterRef::new(&c.id, &c.name))
                .ok_or_else(|| SkillGraphError::Content(format!("unknown character: {}", id)))
        };

        let battle = &self.battle;
        let mut live = LiveState::new(roster).with_environment(battle.environment);
        if let Some(unit) = &battle.unit {
            live = live.with_unit(character(unit)?);
        }
        for id in &battle.targets {
            live.add_target(character(id)?);
        }
        for id in &battle.allies {
            live.add_ally(character(id)?);
        }
        for (dir, id) in &battle.adjacent {
            let direction: Direction = dir.parse()?;
            live.set_adjacent(direction, character(id)?);
        }
        for (skill, uses) in &battle.skill_uses {
            live = live.with_skill_uses(SkillId::new(skill), *uses);
        }

        let mut bag = DataBag::new();
        for (key, seed) in &battle.bag {
            bag.set(key.as_str(), seed_payload(key, seed)?);
        }

        debug!(
            characters = self.characters.len(),
            targets = battle.targets.len(),
            seeded = bag.len(),
            "Built battle context"
        );
        Ok(ExecutionContext::live(live).with_data_bag(bag))
    }
}

fn seed_payload(key: &str, seed: &BagSeed) -> Result<Payload> {
    let payload = match seed {
        BagSeed::Text(s) if key == Intent::SelectedDirection.as_str() => Payload::Direction {
            value: s.parse()?,
        },
        BagSeed::Flag(b) => Payload::Flag { value: *b },
        BagSeed::Count(n) => Payload::Count { value: *n },
        BagSeed::Number(f) => Payload::Number { value: *f },
        BagSeed::Text(s) => Payload::Text { value: s.clone() },
    };
    Ok(payload)
}

/// Load a fixture file and build its context.
pub fn load_battle(path: &Path, content: &ContentConfig) -> Result<ExecutionContext> {
    BattleFixture::load(path)?.into_context(content)
}
