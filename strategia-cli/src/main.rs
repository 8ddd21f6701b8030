//! Strategia CLI — evaluate snapshots, query the decision log, manage rules.
//!
//! Commands:
//! - `evaluate` — run the decision pipeline on a JSON snapshot and record it
//! - `latest` — print the most recent recorded decision
//! - `history` — print recent decisions as JSON or CSV
//! - `validate` — report scenario matrix completeness for the active rules
//! - `replay` — re-decide the recorded history under the active rules
//! - `rules export` — write the active rule set as TOML

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use strategia_core::briefing::brief;
use strategia_core::IndicatorSnapshot;
use strategia_runner::{
    export_history_csv, export_history_json, replay, EngineConfig, EngineError,
    PersistenceOutcome, StrategicEngine,
};

#[derive(Parser)]
#[command(
    name = "strategia",
    about = "Strategia CLI — strategic decision engine for leveraged positions"
)]
struct Cli {
    /// Engine config (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rule set (TOML). Overrides `[rules] path` from the config.
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Decision log (JSONL). Overrides `[audit] path` from the config.
    #[arg(long, global = true)]
    audit: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the decision pipeline on an indicator snapshot.
    Evaluate {
        /// JSON file holding one indicator snapshot.
        #[arg(long)]
        snapshot: PathBuf,

        /// Compute the decision without recording it.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print the most recent recorded decision.
    Latest,
    /// Print recent decisions, newest first.
    History {
        /// Maximum number of decisions.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Report scenario matrix completeness for the active rules.
    Validate,
    /// Re-decide recorded history under the active rules and report drift.
    Replay {
        /// Maximum number of recorded decisions to replay.
        #[arg(long, default_value_t = 1000)]
        limit: usize,
    },
    /// Rule set commands.
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Write the active rule set as TOML.
    Export {
        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.rules, cli.audit)?;

    match cli.command {
        Commands::Evaluate { snapshot, dry_run } => run_evaluate(&config, &snapshot, dry_run),
        Commands::Latest => run_latest(&config),
        Commands::History { limit, format } => run_history(&config, limit, format),
        Commands::Validate => run_validate(&config),
        Commands::Replay { limit } => run_replay(&config, limit),
        Commands::Rules { action } => match action {
            RulesAction::Export { out } => run_rules_export(&config, out.as_deref()),
        },
    }
}

fn load_config(
    path: Option<&Path>,
    rules: Option<PathBuf>,
    audit: Option<PathBuf>,
) -> Result<EngineConfig> {
    let mut config = match path {
        Some(p) => EngineConfig::from_file(p)?,
        None => EngineConfig::default(),
    };
    if rules.is_some() {
        config.rules.path = rules;
    }
    if let Some(audit) = audit {
        config.audit.path = audit;
    }
    Ok(config)
}

fn read_snapshot(path: &Path) -> Result<IndicatorSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_evaluate(config: &EngineConfig, snapshot_path: &Path, dry_run: bool) -> Result<()> {
    let engine = StrategicEngine::from_config(config)?;
    let snapshot = read_snapshot(snapshot_path)?;

    if dry_run {
        let decision = engine.decide(&snapshot)?;
        return print_json(&json!({
            "decision": decision,
            "briefing": brief(&decision),
        }));
    }

    let evaluation = engine.evaluate(&snapshot)?;
    print_json(&json!({
        "decision": evaluation.decision,
        "persistence": evaluation.persistence,
        "briefing": brief(&evaluation.decision),
    }))?;

    if let PersistenceOutcome::Failed { reason } = &evaluation.persistence {
        eprintln!("Warning: decision was not recorded: {reason}");
        std::process::exit(2);
    }
    Ok(())
}

fn run_latest(config: &EngineConfig) -> Result<()> {
    let engine = StrategicEngine::from_config(config)?;
    match engine.get_latest_decision() {
        Ok(stored) => print_json(&json!({ "id": stored.id, "decision": stored.decision })),
        Err(EngineError::NotFound) => {
            println!("No decisions recorded in {}", config.audit.path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_history(config: &EngineConfig, limit: usize, format: Format) -> Result<()> {
    let engine = StrategicEngine::from_config(config)?;
    let history = engine.get_decision_history(limit)?;
    let out = match format {
        Format::Json => export_history_json(&history)?,
        Format::Csv => export_history_csv(&history)?,
    };
    print!("{out}");
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_validate(config: &EngineConfig) -> Result<()> {
    let rules = config.load_rules()?;
    let report = rules.validate_scenario_matrix();
    println!("Rule set {} ({})", rules.version(), &rules.hash()[..12]);
    println!(
        "Scenarios: {} of {} expected",
        report.total_scenarios, report.expected_total
    );
    for (group, count) in &report.counts_by_group {
        println!("  {:<8} {count}", group.as_str());
    }
    println!("Tactical rules: {}", rules.tactical().rules().len());
    if !report.complete {
        bail!(
            "scenario matrix is incomplete: {} of {} scenarios",
            report.total_scenarios,
            report.expected_total
        );
    }
    println!("Matrix complete");
    Ok(())
}

fn run_replay(config: &EngineConfig, limit: usize) -> Result<()> {
    let engine = StrategicEngine::from_config(config)?;
    let history = engine.get_decision_history(limit)?;
    let report = replay(&history, &engine.rules(), engine.protection());
    print_json(&report)?;
    if !report.is_clean() {
        info!(drifted = report.drifted.len(), "replay found drift");
    }
    Ok(())
}

fn run_rules_export(config: &EngineConfig, out: Option<&Path>) -> Result<()> {
    let rules = config.load_rules()?;
    let toml = rules.to_toml()?;
    match out {
        Some(path) => {
            std::fs::write(path, &toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Rule set {} written to {}",
                rules.version(),
                path.display()
            );
        }
        None => print!("{toml}"),
    }
    Ok(())
}
