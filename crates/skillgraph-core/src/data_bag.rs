use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::character::CharacterId;
use crate::intent::{split_key, DebuffKind, Direction, MoveKind};

/// Debuff request for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebuffRequest {
    pub kind: DebuffKind,
    pub duration: u32,
    pub intensity: f64,
    /// Informational; area geometry is resolved outside the engine.
    pub radius: f64,
}

/// Positional transform request. The engine never moves units itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub kind: MoveKind,
    pub subject: CharacterId,
    pub anchor: CharacterId,
    pub direction: Direction,
    pub distance: u32,
}

/// Value stored in the data bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Flag { value: bool },
    Number { value: f64 },
    Count { value: i64 },
    Text { value: String },
    Direction { value: Direction },
    ReflectDamage { percent: f64 },
    Debuff(DebuffRequest),
    Move(MoveCommand),
}

impl Payload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Flag { .. } => "flag",
            Payload::Number { .. } => "number",
            Payload::Count { .. } => "count",
            Payload::Text { .. } => "text",
            Payload::Direction { .. } => "direction",
            Payload::ReflectDamage { .. } => "reflect_damage",
            Payload::Debuff(_) => "debuff",
            Payload::Move(_) => "move",
        }
    }
}

/// Percent of incoming damage to reflect back at the attacker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReflectDamage {
    pub percent: f64,
}

/// Types that can be read back out of a [`Payload`].
pub trait FromPayload: Sized {
    /// Name used in diagnostics.
    const EXPECTED: &'static str;

    fn from_payload(payload: &Payload) -> Option<Self>;
}

/// Types that can be stored as a [`Payload`].
pub trait IntoPayload {
    fn into_payload(self) -> Payload;
}

macro_rules! payload_conversions {
    ($ty:ty, $expected:literal, $pat:pat => $out:expr, $value:ident => $build:expr) => {
        impl FromPayload for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_payload(payload: &Payload) -> Option<Self> {
                match payload {
                    $pat => Some($out),
                    _ => None,
                }
            }
        }

        impl IntoPayload for $ty {
            fn into_payload(self) -> Payload {
                let $value = self;
                $build
            }
        }
    };
}

payload_conversions!(bool, "flag",
    Payload::Flag { value } => *value,
    v => Payload::Flag { value: v });
payload_conversions!(f64, "number",
    Payload::Number { value } => *value,
    v => Payload::Number { value: v });
payload_conversions!(i64, "count",
    Payload::Count { value } => *value,
    v => Payload::Count { value: v });
payload_conversions!(String, "text",
    Payload::Text { value } => value.clone(),
    v => Payload::Text { value: v });
payload_conversions!(Direction, "direction",
    Payload::Direction { value } => *value,
    v => Payload::Direction { value: v });
payload_conversions!(ReflectDamage, "reflect_damage",
    Payload::ReflectDamage { percent } => ReflectDamage { percent: *percent },
    v => Payload::ReflectDamage { percent: v.percent });
payload_conversions!(DebuffRequest, "debuff",
    Payload::Debuff(req) => req.clone(),
    v => Payload::Debuff(v));
payload_conversions!(MoveCommand, "move", Payload::Move(cmd) => cmd.clone(), v => Payload::Move(v));

impl IntoPayload for Payload {
    fn into_payload(self) -> Payload {
        self
    }
}

impl IntoPayload for &str {
    fn into_payload(self) -> Payload {
        Payload::Text {
            value: self.to_string(),
        }
    }
}

/// Outcome of a typed read.
#[derive(Debug, Clone, PartialEq)]
pub enum BagRead<T> {
    Found(T),
    Missing,
    Mismatch { found: &'static str },
}

/// String-keyed blackboard for one activation.
///
/// Used by nodes to talk to later nodes and by the engine to hand requests
/// to the combat resolver. Inserts overwrite, nothing expires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataBag {
    entries: BTreeMap<String, Payload>,
}

impl DataBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous entry under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl IntoPayload) {
        self.entries.insert(key.into(), value.into_payload());
    }

    /// Read a typed value without logging.
    pub fn read<T: FromPayload>(&self, key: &str) -> BagRead<T> {
        match self.entries.get(key) {
            None => BagRead::Missing,
            Some(payload) => match T::from_payload(payload) {
                Some(v) => BagRead::Found(v),
                None => BagRead::Mismatch {
                    found: payload.kind_name(),
                },
            },
        }
    }

    /// Typed read with fallback. A missing key returns `default` silently;
    /// a payload of another type returns `default` and logs a warning.
    pub fn get<T: FromPayload>(&self, key: &str, default: T) -> T {
        match self.read::<T>(key) {
            BagRead::Found(v) => v,
            BagRead::Missing => default,
            BagRead::Mismatch { found } => {
                warn!(key, expected = T::EXPECTED, found, "Data bag type mismatch, using default");
                default
            }
        }
    }

    pub fn payload(&self, key: &str) -> Option<&Payload> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Payload> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Payload)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All entries addressed to one character, as `(intent, payload)`.
    pub fn entries_for<'a>(
        &'a self,
        who: &'a CharacterId,
    ) -> impl Iterator<Item = (&'a str, &'a Payload)> + 'a {
        self.entries.iter().filter_map(move |(k, v)| match split_key(k) {
            Some((intent, id)) if id == who.as_str() => Some((intent.as_str(), v)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_payload_types() {
        let mut bag = DataBag::new();
        bag.set("flag", true);
        bag.set("num", 1.25);
        bag.set("count", 3i64);
        bag.set("text", "hello");
        bag.set("dir", Direction::West);
        bag.set("reflect", ReflectDamage { percent: 25.0 });
        let debuff = DebuffRequest {
            kind: DebuffKind::Poisoned,
            duration: 3,
            intensity: 0.5,
            radius: 2.0,
        };
        bag.set("debuff", debuff.clone());
        let cmd = MoveCommand {
            kind: MoveKind::Push,
            subject: CharacterId::new("a"),
            anchor: CharacterId::new("b"),
            direction: Direction::East,
            distance: 1,
        };
        bag.set("move", cmd.clone());

        assert!(bag.get("flag", false));
        assert_eq!(bag.get("num", 0.0), 1.25);
        assert_eq!(bag.get("count", 0i64), 3);
        assert_eq!(bag.get("text", String::new()), "hello");
        assert_eq!(bag.get("dir", Direction::North), Direction::West);
        assert_eq!(
            bag.get("reflect", ReflectDamage { percent: 0.0 }).percent,
            25.0
        );
        assert_eq!(bag.read::<DebuffRequest>("debuff"), BagRead::Found(debuff));
        assert_eq!(bag.read::<MoveCommand>("move"), BagRead::Found(cmd));
    }

    #[test]
    fn test_missing_key_returns_default() {
        let bag = DataBag::new();
        assert_eq!(bag.get("nothing", 7.0), 7.0);
        assert_eq!(bag.read::<bool>("nothing"), BagRead::Missing);
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let mut bag = DataBag::new();
        bag.set("k", 2.0);
        assert!(!bag.get("k", false));
        assert_eq!(bag.read::<bool>("k"), BagRead::Mismatch { found: "number" });
    }

    #[test]
    fn test_set_overwrites() {
        let mut bag = DataBag::new();
        bag.set("k", true);
        bag.set("k", 5i64);
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("k", 0i64), 5);
    }

    #[test]
    fn test_entries_for_character() {
        let mut bag = DataBag::new();
        let goblin = CharacterId::new("goblin_1");
        bag.set("CriticalHit_goblin_1", true);
        bag.set("DisableFollowup_goblin_1", true);
        bag.set("CriticalHit_knight", true);
        bag.set("SelectedDirection", Direction::North);

        let intents: Vec<&str> = bag.entries_for(&goblin).map(|(i, _)| i).collect();
        assert_eq!(intents, vec!["CriticalHit", "DisableFollowup"]);
    }

    #[test]
    fn test_entries_for_ignores_authored_keys() {
        let mut bag = DataBag::new();
        bag.set("Bleed_Stack", true);
        bag.set("Warp_Stack", 2i64);

        let stack = CharacterId::new("Stack");
        let intents: Vec<&str> = bag.entries_for(&stack).map(|(i, _)| i).collect();
        assert_eq!(intents, vec!["Warp"]);
    }

    #[test]
    fn test_serialization_is_flat_map() {
        let mut bag = DataBag::new();
        bag.set("ReflectDamage_u1", ReflectDamage { percent: 30.0 });
        let json = serde_json::to_value(&bag).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ReflectDamage_u1": {"type": "reflect_damage", "percent": 30.0}})
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut bag = DataBag::new();
        bag.set("a", true);
        bag.set("b", true);
        assert!(bag.remove("a").is_some());
        assert!(!bag.contains("a"));
        bag.clear();
        assert!(bag.is_empty());
    }
}
