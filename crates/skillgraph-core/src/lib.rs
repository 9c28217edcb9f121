pub mod character;
pub mod config;
pub mod context;
pub mod data_bag;
pub mod diagnostics;
pub mod error;
pub mod intent;
pub mod stats;
pub mod value;

pub use character::{CharacterId, CharacterRef, CharacterSheet, Roster};
pub use config::EngineConfig;
pub use context::{
    ActivationOutcome, EnvironmentalCondition, EnvironmentalConditions, ExecutionContext,
    LiveState, SkillId, StatChange,
};
pub use data_bag::{DataBag, DebuffRequest, MoveCommand, Payload, ReflectDamage};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Result, SkillGraphError};
pub use intent::{DebuffKind, Direction, Intent, MoveKind};
pub use stats::{BoundedStatType, Selection, Stat, StatAccessor, StatKind, UnboundedStatType};
pub use value::{ExecutionFlow, TypedValue, ValueType};
