use skillgraph_content::{load_battle, load_graph};
use skillgraph_core::config::EngineConfig;
use skillgraph_core::{
    BoundedStatType, CharacterId, DiagnosticKind, ExecutionContext, Payload, StatKind,
};
use skillgraph_engine::ChainExecutor;
use skillgraph_test_utils::{init_test_logging, write_temp};

const BATTLE: &str = r#"
[[characters]]
id = "knight"
name = "Knight"
bounded = { HP = { current = 30, max = 30 } }

[[characters]]
id = "goblin_1"
name = "Goblin"
bounded = { HP = { current = 10, max = 10 } }

[[characters]]
id = "goblin_2"
name = "Goblin"
bounded = { HP = { current = 10, max = 10 } }

[[characters]]
id = "bat"
name = "Bat"
unbounded = { Speed = { current = 9, bonus = 0 } }

[battle]
unit = "knight"
targets = ["goblin_1", "goblin_2", "bat"]
adjacent = { north = "goblin_1" }
"#;

const SELF_HARM: &str = r#"
name = "Blood Price"
trigger = "start"

[[nodes]]
id = "start"
type = "trigger"

[[nodes]]
id = "pay"
type = "affect_unit_stat"
stat = "HP"
delta = -10

[[flow]]
from = "start"
to = "pay"
"#;

const WHIRLWIND: &str = r#"
name = "Whirlwind"
trigger = "start"

[[nodes]]
id = "start"
type = "trigger"

[[nodes]]
id = "everyone"
type = "set_flag"
key = "AffectAllTargets"

[[nodes]]
id = "spin"
type = "affect_enemy_stat"
stat = "HP"
delta = -3

[[nodes]]
id = "aim"
type = "select_direction"
direction = "north"

[[nodes]]
id = "shove"
type = "reposition"
mode = "push"
distance = 2

[[flow]]
from = "start"
to = "everyone"

[[flow]]
from = "everyone"
to = "spin"

[[flow]]
from = "spin"
to = "aim"

[[flow]]
from = "aim"
to = "shove"
"#;

fn config() -> EngineConfig {
    EngineConfig::parse("[content.stat_aliases]\nHP = \"Health\"\n").unwrap()
}

fn health(ctx: &ExecutionContext, id: &str) -> f64 {
    ctx.live_state()
        .unwrap()
        .stats()
        .stat(&CharacterId::new(id), StatKind::Bounded(BoundedStatType::Health))
        .unwrap()
        .current()
}

#[test]
fn test_self_damage_from_files() {
    init_test_logging();
    let config = config();
    let graph_file = write_temp(SELF_HARM);
    let battle_file = write_temp(BATTLE);

    let graph = load_graph(graph_file.path(), &config.content).unwrap();
    let mut ctx = load_battle(battle_file.path(), &config.content).unwrap();
    let report = ChainExecutor::from_config(&config).run(&graph, &mut ctx);

    assert!(report.live);
    assert!(!report.truncated);
    assert_eq!(report.executed.len(), 2);
    assert_eq!(health(&ctx, "knight"), 20.0);
    assert_eq!(health(&ctx, "goblin_1"), 10.0);
}

#[test]
fn test_whirlwind_hits_each_target_independently() {
    init_test_logging();
    let config = config();
    let graph_file = write_temp(WHIRLWIND);
    let battle_file = write_temp(BATTLE);

    let graph = load_graph(graph_file.path(), &config.content).unwrap();
    let mut ctx = load_battle(battle_file.path(), &config.content).unwrap();
    let report = ChainExecutor::from_config(&config).run(&graph, &mut ctx);

    assert_eq!(health(&ctx, "goblin_1"), 7.0);
    assert_eq!(health(&ctx, "goblin_2"), 7.0);
    // The bat has no Health; it is skipped with a diagnostic.
    assert_eq!(report.diagnostics, 1);
    assert_eq!(ctx.diagnostics().count(DiagnosticKind::AbsentCapability), 1);

    let outcome = ctx.into_outcome();
    assert_eq!(outcome.stat_changes.len(), 2);
    assert!(matches!(
        outcome.data_bag.payload("Reposition_goblin_1"),
        Some(Payload::Move(m)) if m.distance == 2
    ));

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["stat_changes"][0]["node"], "spin");
}

#[test]
fn test_authoring_run_leaves_no_effects() {
    let config = config();
    let graph_file = write_temp(WHIRLWIND);
    let graph = load_graph(graph_file.path(), &config.content).unwrap();

    let mut ctx = ExecutionContext::authoring();
    let report = ChainExecutor::from_config(&config).run(&graph, &mut ctx);

    assert!(!report.live);
    assert_eq!(report.executed.len(), 5);

    let outcome = ctx.into_outcome();
    assert!(outcome.stat_changes.is_empty());
    assert!(outcome
        .diagnostics
        .iter()
        .all(|d| d.kind == DiagnosticKind::UnavailableContext));
}

#[test]
fn test_chain_guard_from_config() {
    let mut config = config();
    config.engine.max_chain_length = 2;
    let graph_file = write_temp(WHIRLWIND);
    let battle_file = write_temp(BATTLE);

    let graph = load_graph(graph_file.path(), &config.content).unwrap();
    let mut ctx = load_battle(battle_file.path(), &config.content).unwrap();
    let report = ChainExecutor::from_config(&config).run(&graph, &mut ctx);

    assert!(report.truncated);
    assert_eq!(report.executed.len(), 2);
    assert_eq!(health(&ctx, "goblin_1"), 10.0);
}
