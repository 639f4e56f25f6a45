//! Recorded incident scenarios.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sleuth_types::{Hypothesis, HypothesisMetadata};
use sleuth_validator::{
    FixtureRecord, FixtureSource, IncidentContext, Observation, Observations, QueryError,
    QueryResult, SpecialistAgent, TimeWindow,
};

/// A recorded incident: what the agents saw and what the data sources said.
#[derive(Debug, Deserialize, Serialize)]
pub struct Scenario {
    pub incident: IncidentSpec,
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub fixtures: Vec<FixtureRecord>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IncidentSpec {
    pub id: String,
    pub onset: DateTime<Utc>,
    #[serde(default)]
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub baseline: Option<TimeWindow>,
}

/// How a recorded agent behaves when replayed.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentBehaviour {
    #[default]
    Respond,
    Fail,
    Hang,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub behaviour: AgentBehaviour,
    #[serde(default)]
    pub observations: Vec<String>,
    #[serde(default)]
    pub hypotheses: Vec<HypothesisSeed>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HypothesisSeed {
    pub statement: String,
    pub initial_confidence: f64,
    #[serde(default)]
    pub metadata: HypothesisMetadata,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn incident_context(&self) -> IncidentContext {
        let mut ctx = IncidentContext::new(self.incident.id.clone(), self.incident.onset);
        if let Some(window) = &self.incident.window {
            ctx = ctx.with_window(window.clone());
        }
        if let Some(baseline) = &self.incident.baseline {
            ctx = ctx.with_baseline(baseline.clone());
        }
        ctx
    }

    pub fn data_source(&self) -> FixtureSource {
        FixtureSource::from_records("scenario", self.fixtures.iter().cloned())
    }
}

/// Replays an agent recorded in a scenario.
pub struct ReplayAgent {
    spec: AgentSpec,
}

impl ReplayAgent {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl SpecialistAgent for ReplayAgent {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn observe(&self, _incident: &IncidentContext) -> QueryResult<Observations> {
        match self.spec.behaviour {
            AgentBehaviour::Respond => {
                let mut observations = Observations::new(self.spec.name.clone());
                for summary in &self.spec.observations {
                    observations.push(Observation::new("recording", summary.clone()));
                }
                Ok(observations)
            }
            AgentBehaviour::Fail => Err(QueryError::Unavailable {
                source_name: self.spec.name.clone(),
                reason: "recorded failure".into(),
            }),
            AgentBehaviour::Hang => std::future::pending().await,
        }
    }

    fn propose(&self, _observations: &Observations) -> Vec<Hypothesis> {
        self.spec
            .hypotheses
            .iter()
            .filter_map(|seed| {
                match Hypothesis::new(self.spec.name.clone(), seed.statement.clone(), seed.initial_confidence) {
                    Ok(h) => Some(h.with_metadata(seed.metadata.clone())),
                    Err(e) => {
                        tracing::warn!(agent = %self.spec.name, error = %e, "Skipping invalid seed");
                        None
                    }
                }
            })
            .collect()
    }
}
