//! skilltree: load a skill tree, run actions against it, print the result.
//!
//! Usage:
//!   skilltree <TREE> [--config <path>] [--script <path>] [--do <action>]...
//!
//! Example:
//!   skilltree merged.json --points-cap 30 --do "max Verdo" --do "unlock Smite01" --events

mod report;
mod script;

use clap::Parser;
use script::{Action, ScriptError, parse_script};
use skilltree_core::config::EngineConfig;
use skilltree_core::validation::check_invariants;
use skilltree_data::{load_config, load_engine};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "skilltree")]
#[command(about = "Run unlock actions against a tiered skill tree", long_about = None)]
struct Args {
    /// Tree definition (.json, .ron or .toml)
    tree: PathBuf,

    /// Engine config file (.json, .ron or .toml)
    #[arg(short, long, env = "SKILLTREE_CONFIG")]
    config: Option<PathBuf>,

    /// Talent point ceiling (overrides config file)
    #[arg(long, env = "SKILLTREE_POINTS_CAP")]
    points_cap: Option<u32>,

    /// Seal ceiling (overrides config file)
    #[arg(long, env = "SKILLTREE_SEAL_CAP")]
    seal_cap: Option<u32>,

    /// Base-tier nodes needed to open specializations (overrides config file)
    #[arg(long)]
    threshold: Option<u32>,

    /// File of actions, one per line
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Action to run after the script, e.g. "unlock v1". Repeatable.
    #[arg(short = 'd', long = "do", value_name = "ACTION")]
    actions: Vec<String>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Print events as they occur
    #[arg(short, long)]
    events: bool,

    /// Verify engine invariants after every action
    #[arg(long)]
    check: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("skilltree_core=info,skilltree_data=info,skilltree_cli=info")
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(cap) = args.points_cap {
        config.points_cap = cap;
    }
    if let Some(cap) = args.seal_cap {
        config.seal_cap = cap;
    }
    if let Some(threshold) = args.threshold {
        config.base_completion_threshold = Some(threshold);
    }

    let actions = collect_actions(&args)?;
    let mut engine = load_engine(&args.tree, &config)?;
    info!(actions = actions.len(), "running actions");

    for action in &actions {
        let summary = action.apply(&mut engine);
        debug!(%action, "applied");
        if !args.json {
            println!("> {action}: {summary}");
        }

        let events = engine.drain_events();
        if args.events && !args.json {
            for event in &events {
                println!("    {}", report::describe_event(engine.graph(), event));
            }
        }

        if args.check {
            let violations = check_invariants(&engine);
            if !violations.is_empty() {
                let detail: Vec<String> = violations.iter().map(ToString::to_string).collect();
                return Err(format!("after '{action}': {}", detail.join("; ")).into());
            }
        }
    }

    let snapshot = engine.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("\n{}", report::render_snapshot(&snapshot));
    }
    Ok(())
}

/// Script actions first, then `--do` actions. A bad `--do` entry is
/// reported by its position among the `--do` flags.
fn collect_actions(args: &Args) -> Result<Vec<Action>, Box<dyn std::error::Error>> {
    let mut actions = match &args.script {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            parse_script(&source).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => Vec::new(),
    };
    for (index, text) in args.actions.iter().enumerate() {
        let action = text.parse::<Action>().map_err(|source| ScriptError {
            line: index + 1,
            source,
        })?;
        actions.push(action);
    }
    Ok(actions)
}
