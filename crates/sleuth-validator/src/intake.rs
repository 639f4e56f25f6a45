//! Hypothesis intake from upstream specialist agents.
//!
//! Agents run concurrently, each bounded by its own timeout. An agent that
//! fails or times out contributes zero hypotheses; the investigation goes on
//! with whatever the others proposed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sleuth_types::Hypothesis;
use tracing::{debug, info, instrument, warn};

use crate::error::QueryResult;
use crate::query::IncidentContext;

/// One finding an agent made while looking at the incident.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub source: String,
    pub summary: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(source: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            summary: summary.into(),
            attributes: BTreeMap::new(),
            observed_at: Utc::now(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Everything one agent observed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    pub agent: String,
    pub items: Vec<Observation>,
}

impl Observations {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, observation: Observation) {
        self.items.push(observation);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Upstream domain specialist (database, network, deploys, ...).
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Look at the incident.
    async fn observe(&self, incident: &IncidentContext) -> QueryResult<Observations>;

    /// Turn observations into candidate hypotheses.
    fn propose(&self, observations: &Observations) -> Vec<Hypothesis>;
}

/// Run all agents concurrently and collect their hypotheses in agent order.
#[instrument(skip_all, fields(incident = %incident.incident_id, agents = agents.len()))]
pub async fn gather_hypotheses(
    agents: &[Arc<dyn SpecialistAgent>],
    incident: &IncidentContext,
    timeout: Duration,
) -> Vec<Hypothesis> {
    let runs = agents.iter().map(|agent| async move {
        match tokio::time::timeout(timeout, agent.observe(incident)).await {
            Ok(Ok(observations)) => {
                let proposed = agent.propose(&observations);
                debug!(
                    agent = agent.name(),
                    observations = observations.items.len(),
                    proposed = proposed.len(),
                    "Agent proposed hypotheses"
                );
                proposed
            }
            Ok(Err(e)) => {
                warn!(agent = agent.name(), error = %e, "Agent observation failed");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    agent = agent.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Agent timed out"
                );
                Vec::new()
            }
        }
    });

    let hypotheses: Vec<Hypothesis> = futures::future::join_all(runs)
        .await
        .into_iter()
        .flatten()
        .collect();
    info!(hypotheses = hypotheses.len(), "Hypotheses gathered");
    hypotheses
}
