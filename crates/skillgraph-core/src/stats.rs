//! Character stats and the accessor seam to the host's stat system.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::character::CharacterId;
use crate::error::SkillGraphError;

/// Stats that have a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoundedStatType {
    Health,
    Mana,
    Stamina,
    Shield,
}

/// Stats without a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnboundedStatType {
    Strength,
    Agility,
    Intellect,
    Defense,
    Resistance,
    Speed,
    Luck,
    Accuracy,
    Evasion,
}

impl BoundedStatType {
    pub const ALL: [BoundedStatType; 4] = [
        BoundedStatType::Health,
        BoundedStatType::Mana,
        BoundedStatType::Stamina,
        BoundedStatType::Shield,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoundedStatType::Health => "Health",
            BoundedStatType::Mana => "Mana",
            BoundedStatType::Stamina => "Stamina",
            BoundedStatType::Shield => "Shield",
        }
    }
}

impl UnboundedStatType {
    pub const ALL: [UnboundedStatType; 9] = [
        UnboundedStatType::Strength,
        UnboundedStatType::Agility,
        UnboundedStatType::Intellect,
        UnboundedStatType::Defense,
        UnboundedStatType::Resistance,
        UnboundedStatType::Speed,
        UnboundedStatType::Luck,
        UnboundedStatType::Accuracy,
        UnboundedStatType::Evasion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnboundedStatType::Strength => "Strength",
            UnboundedStatType::Agility => "Agility",
            UnboundedStatType::Intellect => "Intellect",
            UnboundedStatType::Defense => "Defense",
            UnboundedStatType::Resistance => "Resistance",
            UnboundedStatType::Speed => "Speed",
            UnboundedStatType::Luck => "Luck",
            UnboundedStatType::Accuracy => "Accuracy",
            UnboundedStatType::Evasion => "Evasion",
        }
    }
}

impl FromStr for BoundedStatType {
    type Err = SkillGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| SkillGraphError::UnknownStat(s.to_string()))
    }
}

impl FromStr for UnboundedStatType {
    type Err = SkillGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| SkillGraphError::UnknownStat(s.to_string()))
    }
}

/// Either kind of stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "kind", rename_all = "snake_case")]
pub enum StatKind {
    Bounded(BoundedStatType),
    Unbounded(UnboundedStatType),
}

impl StatKind {
    /// Parse a free-text stat name in the family selected by `bounded`.
    ///
    /// Only used when importing authored content; evaluation works on the
    /// parsed kind.
    pub fn parse(name: &str, bounded: bool) -> Result<Self, SkillGraphError> {
        if bounded {
            name.parse().map(StatKind::Bounded)
        } else {
            name.parse().map(StatKind::Unbounded)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Bounded(k) => k.as_str(),
            StatKind::Unbounded(k) => k.as_str(),
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BoundedStatType> for StatKind {
    fn from(k: BoundedStatType) -> Self {
        StatKind::Bounded(k)
    }
}

impl From<UnboundedStatType> for StatKind {
    fn from(k: UnboundedStatType) -> Self {
        StatKind::Unbounded(k)
    }
}

/// A snapshot of one stat on one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stat {
    Bounded { current: f64, max: f64, bonus: f64 },
    Unbounded { current: f64, bonus: f64 },
}

impl Stat {
    pub fn current(&self) -> f64 {
        match self {
            Stat::Bounded { current, .. } | Stat::Unbounded { current, .. } => *current,
        }
    }

    pub fn max(&self) -> Option<f64> {
        match self {
            Stat::Bounded { max, .. } => Some(*max),
            Stat::Unbounded { .. } => None,
        }
    }

    pub fn bonus(&self) -> f64 {
        match self {
            Stat::Bounded { bonus, .. } | Stat::Unbounded { bonus, .. } => *bonus,
        }
    }

    /// `current / max` for bounded stats. `None` for unbounded stats or a
    /// zero maximum.
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Stat::Bounded { current, max, .. } if *max != 0.0 => Some(current / max),
            _ => None,
        }
    }

    /// Replace `current`. The value is stored as given: no clamping to
    /// `[0, max]`.
    pub fn set_current(&mut self, value: f64) {
        match self {
            Stat::Bounded { current, .. } | Stat::Unbounded { current, .. } => *current = value,
        }
    }
}

/// Seam to the host's stat system.
///
/// Lookups return `None` when the character is unknown or does not carry the
/// stat; callers treat that as "stat unavailable", never as a fault.
pub trait StatAccessor: fmt::Debug {
    fn bounded_stat(&self, who: &CharacterId, kind: BoundedStatType) -> Option<Stat>;

    fn unbounded_stat(&self, who: &CharacterId, kind: UnboundedStatType) -> Option<Stat>;

    /// Store a new `current` value. Returns `false` if the stat is absent.
    fn set_current(&mut self, who: &CharacterId, kind: StatKind, value: f64) -> bool;

    fn stat(&self, who: &CharacterId, kind: StatKind) -> Option<Stat> {
        match kind {
            StatKind::Bounded(k) => self.bounded_stat(who, k),
            StatKind::Unbounded(k) => self.unbounded_stat(who, k),
        }
    }
}

/// A configuration choice made at authoring time.
///
/// Content names that do not map onto a known kind are kept verbatim so the
/// node can report them when it runs instead of failing the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T> {
    Known(T),
    Unrecognized(String),
}

impl<T> Selection<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Selection::Known(v) => Some(v),
            Selection::Unrecognized(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Known(v) => write!(f, "{}", v),
            Selection::Unrecognized(raw) => write!(f, "{:?} (unrecognized)", raw),
        }
    }
}

impl<T> From<T> for Selection<T> {
    fn from(v: T) -> Self {
        Selection::Known(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounded_and_unbounded() {
        assert_eq!(
            StatKind::parse("Health", true).unwrap(),
            StatKind::Bounded(BoundedStatType::Health)
        );
        assert_eq!(
            StatKind::parse(" strength ", false).unwrap(),
            StatKind::Unbounded(UnboundedStatType::Strength)
        );
    }

    #[test]
    fn test_parse_wrong_family_fails() {
        assert!(StatKind::parse("Health", false).is_err());
        assert!(StatKind::parse("Strength", true).is_err());
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = StatKind::parse("Charisma", false).unwrap_err();
        assert!(matches!(err, SkillGraphError::UnknownStat(name) if name == "Charisma"));
    }

    #[test]
    fn test_bounded_ratio() {
        let stat = Stat::Bounded {
            current: 50.0,
            max: 100.0,
            bonus: 0.0,
        };
        assert_eq!(stat.ratio(), Some(0.5));
        assert_eq!(stat.max(), Some(100.0));
    }

    #[test]
    fn test_ratio_undefined() {
        let unbounded = Stat::Unbounded {
            current: 7.0,
            bonus: 1.0,
        };
        assert_eq!(unbounded.ratio(), None);

        let zero_max = Stat::Bounded {
            current: 0.0,
            max: 0.0,
            bonus: 0.0,
        };
        assert_eq!(zero_max.ratio(), None);
    }

    #[test]
    fn test_set_current_does_not_clamp() {
        let mut stat = Stat::Bounded {
            current: 50.0,
            max: 100.0,
            bonus: 0.0,
        };
        stat.set_current(stat.current() - 60.0);
        assert_eq!(stat.current(), -10.0);

        stat.set_current(250.0);
        assert_eq!(stat.current(), 250.0);
    }

    #[test]
    fn test_selection_known() {
        let sel: Selection<StatKind> = StatKind::from(BoundedStatType::Mana).into();
        assert_eq!(sel.known(), Some(&StatKind::Bounded(BoundedStatType::Mana)));

        let bad: Selection<StatKind> = Selection::Unrecognized("Mojo".into());
        assert!(bad.known().is_none());
        assert_eq!(bad.to_string(), "\"Mojo\" (unrecognized)");
    }
}
