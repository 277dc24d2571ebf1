//! Plan staffing for one scenario file
//!
//! Loads an optional TOML config and a JSON scenario (forecast, roster and
//! cost for one scope) and prints the resulting plan as JSON, or as one line
//! per coverage gap with `--summary`.
//!
//! Usage:
//!   staffing-plan --config demos/staffing.toml demos/scenario.json
//!   staffing-plan --summary demos/scenario.json

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use rvoip_staffing_engine::logging::setup_logging;
use rvoip_staffing_engine::prelude::*;

#[derive(Parser, Debug)]
#[command(about = "Size, allocate and score staffing for a contact center scenario")]
struct Args {
    /// Scenario JSON file
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print compact instead of pretty JSON
    #[arg(long)]
    compact: bool,

    /// Print one line per coverage gap instead of JSON
    #[arg(long, conflicts_with = "compact")]
    summary: bool,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    scope_id: ScopeId,
    period: IntervalWindow,
    forecast: Vec<ForecastInterval>,
    workers: Vec<WorkerRecord>,
    #[serde(default)]
    cost: CostConfig,
    /// Reference data used to label gaps in the summary
    #[serde(default)]
    skills: Vec<Skill>,
}

/// Render a gap with the skill's display name when one is known
fn describe_gap(gap: &CoverageGap, names: &BTreeMap<SkillId, String>) -> String {
    let skill = match &gap.skill_id {
        Some(id) => names.get(id).cloned().unwrap_or_else(|| id.to_string()),
        None => "all skills".to_string(),
    };
    let mut line = format!(
        "{} {}: required {}, available {}, gap {} [{}]",
        gap.interval, skill, gap.required_count, gap.available_count, gap.gap_count, gap.severity
    );
    if gap.estimated_cost_impact > 0.0 {
        line.push_str(&format!(", cost {:.2}", gap.estimated_cost_impact));
    }
    if !gap.suggested_actions.is_empty() {
        let actions: Vec<String> = gap.suggested_actions.iter().map(ToString::to_string).collect();
        line.push_str(&format!(" -> {}", actions.join("; ")));
    }
    line
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StaffingConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StaffingConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json = true;
    }
    setup_logging(&config.logging).context("initializing logging")?;

    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scenario {}", args.scenario.display()))?;

    let names: BTreeMap<SkillId, String> = scenario
        .skills
        .iter()
        .map(|skill| (skill.id.clone(), skill.name.clone()))
        .collect();

    let store = InMemoryProviders::shared();
    store.set_forecast(scenario.scope_id.clone(), scenario.forecast);
    store.set_roster(scenario.scope_id.clone(), scenario.workers);
    store.set_cost_config(scenario.scope_id.clone(), scenario.cost);

    let engine = StaffingEngine::new(config, EngineProviders::from_shared(store)).context("creating engine")?;
    let plan = engine
        .plan_scope(&scenario.scope_id, scenario.period)
        .await
        .with_context(|| format!("planning scope {}", scenario.scope_id))?;

    if args.summary {
        for gap in &plan.gaps {
            println!("{}", describe_gap(gap, &names));
        }
        return Ok(());
    }

    let output = if args.compact {
        serde_json::to_string(&plan)
    } else {
        serde_json::to_string_pretty(&plan)
    }
    .context("serializing plan")?;
    println!("{}", output);
    Ok(())
}
