//! Authored content: TOML skill graphs and battle fixtures.
//!
//! This is the only layer that deals in free-text stat, debuff, port and
//! direction names. Everything past it works on the closed enums.

pub mod battle;
pub mod graph;

pub use battle::{load_battle, BattleFixture};
pub use graph::{load_graph, GraphDefinition};
