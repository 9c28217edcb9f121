//! Data bag key conventions shared with the combat resolver.
//!
//! Keys are `"{Intent}_{characterId}"` for per-character requests and a bare
//! `"{Intent}"` for global ones. The strings below are a wire contract:
//! renaming one breaks every resolver reading it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::character::CharacterId;
use crate::error::SkillGraphError;

/// Requests written into the data bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    ReflectDamage,
    ApplyDebuff,
    DisableFollowup,
    CriticalHit,
    FirstStrike,
    NegateNextAttack,
    Reposition,
    Warp,
    SwapUnitWithTarget,
    // Global
    SelectedDirection,
    AffectAllTargets,
}

impl Intent {
    pub const PER_CHARACTER: [Intent; 9] = [
        Intent::ReflectDamage,
        Intent::ApplyDebuff,
        Intent::DisableFollowup,
        Intent::CriticalHit,
        Intent::FirstStrike,
        Intent::NegateNextAttack,
        Intent::Reposition,
        Intent::Warp,
        Intent::SwapUnitWithTarget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ReflectDamage => "ReflectDamage",
            Intent::ApplyDebuff => "ApplyDebuff",
            Intent::DisableFollowup => "DisableFollowup",
            Intent::CriticalHit => "CriticalHit",
            Intent::FirstStrike => "FirstStrike",
            Intent::NegateNextAttack => "NegateNextAttack",
            Intent::Reposition => "Reposition",
            Intent::Warp => "Warp",
            Intent::SwapUnitWithTarget => "SwapUnitWithTarget",
            Intent::SelectedDirection => "SelectedDirection",
            Intent::AffectAllTargets => "AffectAllTargets",
        }
    }

    /// Key addressed to one character.
    pub fn key_for(&self, who: &CharacterId) -> String {
        format!("{}_{}", self.as_str(), who)
    }

    /// Key of a global intent.
    pub fn global_key(&self) -> String {
        self.as_str().to_string()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a per-character key into its intent and character id.
///
/// Returns `None` for global keys and for authored keys whose prefix is not
/// a per-character intent.
pub fn split_key(key: &str) -> Option<(Intent, &str)> {
    let (prefix, id) = key.split_once('_')?;
    Intent::PER_CHARACTER
        .into_iter()
        .find(|i| i.as_str() == prefix)
        .map(|i| (i, id))
}

/// Eight-way compass direction on the battle grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::NorthEast => "north_east",
            Direction::East => "east",
            Direction::SouthEast => "south_east",
            Direction::South => "south",
            Direction::SouthWest => "south_west",
            Direction::West => "west",
            Direction::NorthWest => "north_west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SkillGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let compact = normalized.replace('_', "");
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized || d.as_str().replace('_', "") == compact)
            .ok_or_else(|| SkillGraphError::Content(format!("unknown direction: {}", s)))
    }
}

/// Status effects the resolver knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebuffKind {
    Stunned,
    Poisoned,
    Burning,
    Slowed,
    Blinded,
    Silenced,
    Weakened,
    Rooted,
}

impl DebuffKind {
    pub const ALL: [DebuffKind; 8] = [
        DebuffKind::Stunned,
        DebuffKind::Poisoned,
        DebuffKind::Burning,
        DebuffKind::Slowed,
        DebuffKind::Blinded,
        DebuffKind::Silenced,
        DebuffKind::Weakened,
        DebuffKind::Rooted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DebuffKind::Stunned => "Stunned",
            DebuffKind::Poisoned => "Poisoned",
            DebuffKind::Burning => "Burning",
            DebuffKind::Slowed => "Slowed",
            DebuffKind::Blinded => "Blinded",
            DebuffKind::Silenced => "Silenced",
            DebuffKind::Weakened => "Weakened",
            DebuffKind::Rooted => "Rooted",
        }
    }
}

impl fmt::Display for DebuffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebuffKind {
    type Err = SkillGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| SkillGraphError::UnknownDebuff(s.to_string()))
    }
}

/// Kind of positional transform requested from the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Move the adjacent unit away from the subject.
    Push,
    /// Move the adjacent unit toward the subject.
    Pull,
    /// Move the subject to the far side of the adjacent unit.
    WarpBehind,
    /// Move the subject next to the adjacent unit.
    WarpBeside,
    /// Exchange positions of the subject and the adjacent unit.
    Swap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        let id = CharacterId::new("goblin_2");
        assert_eq!(Intent::ReflectDamage.key_for(&id), "ReflectDamage_goblin_2");
        assert_eq!(Intent::SelectedDirection.global_key(), "SelectedDirection");
    }

    #[test]
    fn test_split_key_keeps_underscores_in_id() {
        assert_eq!(
            split_key("ApplyDebuff_goblin_2"),
            Some((Intent::ApplyDebuff, "goblin_2"))
        );
        assert_eq!(split_key("SelectedDirection"), None);
        assert_eq!(split_key("Bleed_Stack"), None);
    }

    #[test]
    fn test_direction_opposites() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("North".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("north-east".parse::<Direction>().unwrap(), Direction::NorthEast);
        assert_eq!("SouthWest".parse::<Direction>().unwrap(), Direction::SouthWest);
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn test_debuff_parse() {
        assert_eq!("poisoned".parse::<DebuffKind>().unwrap(), DebuffKind::Poisoned);
        assert!(matches!(
            "Confused".parse::<DebuffKind>(),
            Err(SkillGraphError::UnknownDebuff(_))
        ));
    }
}
