mod check;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use skillgraph_content::{load_battle, load_graph};
use skillgraph_core::config::{EngineConfig, LogConfig};
use skillgraph_core::{ActivationOutcome, ExecutionContext, Payload};
use skillgraph_engine::{ActivationReport, ChainExecutor, SkillGraph};

#[derive(Parser)]
#[command(name = "skillgraph", version, about = "Run designer-authored skill graphs")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "skillgraph.toml", env = "SKILLGRAPH_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one activation of a skill graph
    Run {
        /// Graph definition (TOML)
        #[arg(long)]
        graph: PathBuf,
        /// Battle fixture (TOML). Without one the graph runs in authoring mode.
        #[arg(long)]
        battle: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a graph and report problems
    Validate {
        #[arg(long)]
        graph: PathBuf,
    },
    /// List every node with its ports
    Ports {
        #[arg(long)]
        graph: PathBuf,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Serialize)]
struct RunOutput<'a> {
    report: &'a ActivationReport,
    outcome: &'a ActivationOutcome,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "skillgraph", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config)?;
    init_tracing(&config.log);

    match cli.command {
        Commands::Run { graph, battle, json } => run(&config, &graph, battle.as_deref(), json),
        Commands::Validate { graph } => {
            let graph = load_graph(&graph, &config.content)?;
            let issues = check::run_checks(&graph);
            if issues > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Ports { graph } => {
            let graph = load_graph(&graph, &config.content)?;
            print_ports(&graph);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    if path.exists() {
        Ok(EngineConfig::load(path)?)
    } else {
        Ok(EngineConfig::default())
    }
}

/// Logs go to stderr so `run --json` output stays machine-readable.
fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(
    config: &EngineConfig,
    graph: &Path,
    battle: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let graph = load_graph(graph, &config.content)?;
    let mut ctx = match battle {
        Some(path) => load_battle(path, &config.content)?,
        None => {
            warn!("No battle fixture given, running in authoring mode");
            ExecutionContext::authoring()
        }
    };

    let report = ChainExecutor::from_config(config).run(&graph, &mut ctx);
    let outcome = ctx.into_outcome();
    info!(activation_id = %report.activation_id, "Run finished");

    if json {
        let output = RunOutput {
            report: &report,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let executed: Vec<&str> = report
        .executed
        .iter()
        .filter_map(|id| graph.node(*id).map(|n| n.label.as_str()))
        .collect();
    println!("Skill: {}", graph.name());
    println!("Mode: {}", if report.live { "live" } else { "authoring" });
    println!("Executed: {}", executed.join(" -> "));
    if report.truncated {
        println!("  (stopped by max_chain_length = {})", config.engine.max_chain_length);
    }

    println!();
    println!("Stat changes:");
    if outcome.stat_changes.is_empty() {
        println!("  (none)");
    }
    for change in &outcome.stat_changes {
        println!(
            "  {} {}: {} -> {}  [{}]",
            change.character, change.stat, change.before, change.after, change.node
        );
    }

    println!();
    println!("Data bag:");
    if outcome.data_bag.is_empty() {
        println!("  (empty)");
    }
    for (key, payload) in outcome.data_bag.iter() {
        println!("  {} = {}", key, describe(payload));
    }

    if !outcome.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for d in &outcome.diagnostics {
            println!("  [{}] {}: {}", d.kind, d.node, d.message);
        }
    }
    Ok(())
}

fn describe(payload: &Payload) -> String {
    match payload {
        Payload::Flag { value } => value.to_string(),
        Payload::Number { value } => value.to_string(),
        Payload::Count { value } => value.to_string(),
        Payload::Text { value } => format!("{:?}", value),
        Payload::Direction { value } => value.to_string(),
        Payload::ReflectDamage { percent } => format!("reflect {}%", percent),
        Payload::Debuff(d) => format!(
            "{} for {} turns (intensity {}, radius {})",
            d.kind, d.duration, d.intensity, d.radius
        ),
        Payload::Move(m) => format!(
            "{:?} {} around {} towards {} ({} tiles)",
            m.kind, m.subject, m.anchor, m.direction, m.distance
        ),
    }
}

fn print_ports(graph: &SkillGraph) {
    for node in graph.nodes() {
        let family = if node.is_event() { "event" } else { "condition" };
        println!("{} [{} {}]", node.label, family, node.kind.type_name());
        for port in node.kind.inputs() {
            let source = match graph.upstream(node.id, port.name) {
                Some(link) => {
                    let from = graph
                        .node(link.from)
                        .map(|n| n.label.as_str())
                        .unwrap_or("?");
                    format!("<- {}.{}", from, link.output)
                }
                None => match node.kind.default_input(port.name) {
                    Some(v) => format!("= {}", v),
                    None => "(unset)".to_string(),
                },
            };
            println!("  in  {}: {} {}", port.name, port.value_type, source);
        }
        for port in node.kind.outputs() {
            println!("  out {}: {}", port.name, port.value_type);
        }
        if let Some(next) = graph.resolve_successor(node.id).and_then(|id| graph.node(id)) {
            println!("  then {}", next.label);
        }
    }
}
