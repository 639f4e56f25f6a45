//! Sleuth Replay - run a recorded incident through the hypothesis validator
//!
//! Loads a scenario (agent recordings plus data-source fixtures), gathers the
//! agents' hypotheses, attempts to disprove the top candidates and prints the
//! ranked report as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sleuth_validator::{
    gather_hypotheses, Budget, HypothesisValidator, SpecialistAgent, StrategyRegistry,
    ValidatorConfig,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod scenario;

use scenario::{ReplayAgent, Scenario};

/// Sleuth Replay CLI
#[derive(Parser)]
#[command(name = "sleuth-replay")]
#[command(about = "Replay a recorded incident through the hypothesis validator", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Validator configuration file (TOML)
    #[arg(short, long, env = "SLEUTH_CONFIG")]
    config: Option<PathBuf>,

    /// Cost units available to the whole run
    #[arg(short, long, env = "SLEUTH_BUDGET", default_value_t = 100)]
    budget: u64,

    /// Wall-clock limit for the run, in seconds
    #[arg(long, env = "SLEUTH_TIME_LIMIT")]
    time_limit: Option<u64>,

    /// Per-agent observation timeout, in milliseconds
    #[arg(long, default_value_t = 5_000)]
    agent_timeout_ms: u64,

    /// Write every audit trail as JSON lines to this file
    #[arg(long)]
    trails: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "SLEUTH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "SLEUTH_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays machine-readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());
    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = match &cli.config {
        Some(path) => ValidatorConfig::load(path)?,
        None => ValidatorConfig::default(),
    };
    config.validate()?;

    let scenario = Scenario::load(&cli.scenario)?;
    let incident = scenario.incident_context();
    let source = Arc::new(scenario.data_source());
    info!(
        incident = %incident.incident_id,
        agents = scenario.agents.len(),
        fixtures = scenario.fixtures.len(),
        "Scenario loaded"
    );

    let agents: Vec<Arc<dyn SpecialistAgent>> = scenario
        .agents
        .into_iter()
        .map(|spec| Arc::new(ReplayAgent::new(spec)) as Arc<dyn SpecialistAgent>)
        .collect();
    let candidates =
        gather_hypotheses(&agents, &incident, Duration::from_millis(cli.agent_timeout_ms)).await;

    let mut budget = Budget::with_limit(cli.budget);
    if let Some(secs) = cli.time_limit {
        budget = budget.with_time_limit(Duration::from_secs(secs));
    }

    let validator = HypothesisValidator::new(config, source, incident);
    let report = validator
        .investigate(candidates, &StrategyRegistry::standard(), &budget)
        .await?;
    report.verify_trails()?;

    if let Some(path) = &cli.trails {
        let mut lines = String::new();
        for trail in &report.trails {
            lines.push_str(&trail.to_json_lines()?);
        }
        std::fs::write(path, lines)
            .with_context(|| format!("writing trails to {}", path.display()))?;
    }

    println!("{}", report.to_json()?);
    info!(
        tested = report.summary.tested,
        supported = report.summary.supported,
        disproven = report.summary.disproven,
        inconclusive = report.summary.inconclusive,
        untested = report.summary.untested,
        spent = budget.spent(),
        "Replay finished"
    );

    for breach in &report.violations {
        warn!(
            hypothesis_id = %breach.hypothesis_id,
            strategy = %breach.strategy,
            reason = %breach.reason,
            "Hypothesis withheld"
        );
    }
    if !report.is_clean() {
        anyhow::bail!(
            "{} strategy contract violation(s) during replay",
            report.violations.len()
        );
    }
    Ok(())
}
