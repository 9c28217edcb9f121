//! Character handles and the in-memory roster.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::{BoundedStatType, Stat, StatAccessor, StatKind, UnboundedStatType};

/// Stable identifier of one unit instance.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a unit taking part in an activation.
///
/// Holds no combat data; stats are resolved through a [`StatAccessor`].
/// Equality is identity of the id, so the same unit seen through two views
/// compares equal even if the display names differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRef {
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
}

impl CharacterRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(id),
            name: name.into(),
        }
    }
}

impl PartialEq for CharacterRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CharacterRef {}

impl fmt::Display for CharacterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.name, self.id)
        }
    }
}

/// Stored value of a bounded stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundedValue {
    pub current: f64,
    pub max: f64,
    #[serde(default)]
    pub bonus: f64,
}

/// Stored value of an unbounded stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnboundedValue {
    pub current: f64,
    #[serde(default)]
    pub bonus: f64,
}

/// All stats carried by one character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterSheet {
    #[serde(default)]
    pub bounded: BTreeMap<BoundedStatType, BoundedValue>,
    #[serde(default)]
    pub unbounded: BTreeMap<UnboundedStatType, UnboundedValue>,
}

impl CharacterSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounded(mut self, kind: BoundedStatType, current: f64, max: f64) -> Self {
        self.bounded.insert(
            kind,
            BoundedValue {
                current,
                max,
                bonus: 0.0,
            },
        );
        self
    }

    pub fn with_unbounded(mut self, kind: UnboundedStatType, current: f64, bonus: f64) -> Self {
        self.unbounded
            .insert(kind, UnboundedValue { current, bonus });
        self
    }

    /// Set the bonus of an existing stat. Absent stats are left untouched.
    pub fn with_bonus(mut self, kind: StatKind, bonus: f64) -> Self {
        match kind {
            StatKind::Bounded(k) => {
                if let Some(v) = self.bounded.get_mut(&k) {
                    v.bonus = bonus;
                }
            }
            StatKind::Unbounded(k) => {
                if let Some(v) = self.unbounded.get_mut(&k) {
                    v.bonus = bonus;
                }
            }
        }
        self
    }
}

/// In-memory [`StatAccessor`] keyed by character id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    sheets: HashMap<CharacterId, CharacterSheet>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: CharacterId, sheet: CharacterSheet) {
        self.sheets.insert(id, sheet);
    }

    pub fn with(mut self, id: impl Into<String>, sheet: CharacterSheet) -> Self {
        self.insert(CharacterId::new(id), sheet);
        self
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl StatAccessor for Roster {
    fn bounded_stat(&self, who: &CharacterId, kind: BoundedStatType) -> Option<Stat> {
        let v = self.sheets.get(who)?.bounded.get(&kind)?;
        Some(Stat::Bounded {
            current: v.current,
            max: v.max,
            bonus: v.bonus,
        })
    }

    fn unbounded_stat(&self, who: &CharacterId, kind: UnboundedStatType) -> Option<Stat> {
        let v = self.sheets.get(who)?.unbounded.get(&kind)?;
        Some(Stat::Unbounded {
            current: v.current,
            bonus: v.bonus,
        })
    }

    fn set_current(&mut self, who: &CharacterId, kind: StatKind, value: f64) -> bool {
        let Some(sheet) = self.sheets.get_mut(who) else {
            return false;
        };
        match kind {
            StatKind::Bounded(k) => match sheet.bounded.get_mut(&k) {
                Some(v) => {
                    v.current = value;
                    true
                }
                None => false,
            },
            StatKind::Unbounded(k) => match sheet.unbounded.get_mut(&k) {
                Some(v) => {
                    v.current = value;
                    true
                }
                None => false,
            },
        }
    }
}
