use skillgraph_core::Selection;
use skillgraph_engine::{ConditionNode, EventNode, NodeKind, SkillGraph};

struct CheckResult {
    label: String,
    ok: bool,
    detail: String,
}

/// Print a health report for a built graph. Returns the number of issues.
pub fn run_checks(graph: &SkillGraph) -> usize {
    let checks = vec![
        check_chain(graph),
        check_reachability(graph),
        check_names(graph),
        check_unused_conditions(graph),
    ];

    let mut ok_count = 0;
    let mut fail_count = 0;

    println!(
        "  Graph '{}': {} nodes, {} links",
        graph.name(),
        graph.nodes().len(),
        graph.links().len()
    );
    for check in &checks {
        let icon = if check.ok { "[OK]" } else { "[!!]" };
        println!("  {} {}: {}", icon, check.label, check.detail);
        if check.ok {
            ok_count += 1;
        } else {
            fail_count += 1;
        }
    }

    println!();
    println!("  {} passed, {} issues found", ok_count, fail_count);
    fail_count
}

fn label(graph: &SkillGraph, id: u32) -> String {
    graph
        .node(id)
        .map(|n| n.label.clone())
        .unwrap_or_else(|| id.to_string())
}

fn check_chain(graph: &SkillGraph) -> CheckResult {
    let order: Vec<String> = graph.chain_order().into_iter().map(|id| label(graph, id)).collect();
    CheckResult {
        label: "Chain".into(),
        ok: !order.is_empty(),
        detail: order.join(" -> "),
    }
}

fn check_reachability(graph: &SkillGraph) -> CheckResult {
    let order = graph.chain_order();
    let orphans: Vec<&str> = graph
        .nodes()
        .iter()
        .filter(|n| n.is_event() && !order.contains(&n.id))
        .map(|n| n.label.as_str())
        .collect();

    if orphans.is_empty() {
        CheckResult {
            label: "Reachability".into(),
            ok: true,
            detail: "Every event runs from the trigger".into(),
        }
    } else {
        CheckResult {
            label: "Reachability".into(),
            ok: false,
            detail: format!("Never run: {}", orphans.join(", ")),
        }
    }
}

fn unrecognized(kind: &NodeKind) -> Option<String> {
    let raw = match kind {
        NodeKind::Condition(ConditionNode::UnitStat { stat, .. })
        | NodeKind::Condition(ConditionNode::EnemyStat { stat, .. })
        | NodeKind::Event(EventNode::AffectUnitStat { stat, .. })
        | NodeKind::Event(EventNode::AffectEnemyStat { stat, .. })
        | NodeKind::Event(EventNode::AffectAdjacentAllyStat { stat, .. }) => match stat {
            Selection::Unrecognized(raw) => raw,
            Selection::Known(_) => return None,
        },
        NodeKind::Event(EventNode::ApplyDebuff { debuff, .. }) => match debuff {
            Selection::Unrecognized(raw) => raw,
            Selection::Known(_) => return None,
        },
        _ => return None,
    };
    Some(raw.clone())
}

fn check_names(graph: &SkillGraph) -> CheckResult {
    let bad: Vec<String> = graph
        .nodes()
        .iter()
        .filter_map(|n| unrecognized(&n.kind).map(|raw| format!("{} ({:?})", n.label, raw)))
        .collect();

    if bad.is_empty() {
        CheckResult {
            label: "Names".into(),
            ok: true,
            detail: "All stat and debuff names recognized".into(),
        }
    } else {
        CheckResult {
            label: "Names".into(),
            ok: false,
            detail: format!("Unrecognized: {}", bad.join(", ")),
        }
    }
}

fn check_unused_conditions(graph: &SkillGraph) -> CheckResult {
    let unused: Vec<&str> = graph
        .nodes()
        .iter()
        .filter(|n| !n.is_event() && !graph.links().iter().any(|l| l.from == n.id))
        .map(|n| n.label.as_str())
        .collect();

    CheckResult {
        label: "Conditions".into(),
        ok: unused.is_empty(),
        detail: if unused.is_empty() {
            "All conditions are wired".into()
        } else {
            format!("Not wired to anything: {}", unused.join(", "))
        },
    }
}
