//! Fixtures shared by the skillgraph test suites.
//!
//! The standard battle: a knight (the acting unit) flanked by a cleric ally
//! to the west, facing three goblins. The first goblin stands north of the
//! knight and is the primary target; the third has no Health stat.

use std::io::Write;

use skillgraph_core::{
    BoundedStatType, CharacterRef, CharacterSheet, Direction, ExecutionContext, LiveState, Roster,
    UnboundedStatType,
};
use tempfile::NamedTempFile;

pub fn knight() -> CharacterRef {
    CharacterRef::new("knight", "Knight")
}

pub fn cleric() -> CharacterRef {
    CharacterRef::new("cleric", "Cleric")
}

pub fn goblin(n: u32) -> CharacterRef {
    CharacterRef::new(format!("goblin_{}", n), format!("Goblin {}", n))
}

pub fn roster() -> Roster {
    Roster::new()
        .with(
            "knight",
            CharacterSheet::new()
                .with_bounded(BoundedStatType::Health, 30.0, 30.0)
                .with_bounded(BoundedStatType::Mana, 50.0, 100.0)
                .with_unbounded(UnboundedStatType::Strength, 14.0, 2.0),
        )
        .with(
            "cleric",
            CharacterSheet::new()
                .with_bounded(BoundedStatType::Health, 12.0, 24.0)
                .with_bounded(BoundedStatType::Mana, 40.0, 40.0),
        )
        .with(
            "goblin_1",
            CharacterSheet::new().with_bounded(BoundedStatType::Health, 10.0, 10.0),
        )
        .with(
            "goblin_2",
            CharacterSheet::new().with_bounded(BoundedStatType::Health, 10.0, 10.0),
        )
        .with(
            "goblin_3",
            CharacterSheet::new().with_unbounded(UnboundedStatType::Speed, 6.0, 0.0),
        )
}

pub fn battle() -> LiveState {
    LiveState::new(roster())
        .with_unit(knight())
        .with_target(goblin(1))
        .with_target(goblin(2))
        .with_target(goblin(3))
        .with_ally(cleric())
        .with_adjacent(Direction::North, goblin(1))
        .with_adjacent(Direction::West, cleric())
}

pub fn live_context() -> ExecutionContext {
    ExecutionContext::live(battle())
}

/// Current value of a bounded stat in a live context.
///
/// Panics if the context is not live or the stat is absent.
pub fn bounded(ctx: &ExecutionContext, who: &CharacterRef, kind: BoundedStatType) -> f64 {
    ctx.live_state()
        .expect("live context")
        .stats()
        .bounded_stat(&who.id, kind)
        .expect("stat present")
        .current()
}

/// Write `content` to a fresh temp file.
pub fn write_temp(content: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    tmp.write_all(content.as_bytes()).expect("write temp file");
    tmp
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skillgraph=debug")),
        )
        .with_test_writer()
        .try_init();
}
