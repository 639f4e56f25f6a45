//! Shared fixtures for validator integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sleuth_types::{
    AttemptOutcome, AttemptReport, Evidence, EvidenceQuality, Hypothesis, HypothesisMetadata,
};
use sleuth_validator::{
    DisproofStrategy, FixtureSource, IncidentContext, QueryContext, QueryRequest, QueryResponse,
    StrategyKind,
};

pub const INCIDENT: &str = "INC-2041";

pub fn onset() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn incident() -> IncidentContext {
    IncidentContext::new(INCIDENT, onset())
}

/// A candidate blaming a deploy for checkout errors.
pub fn deploy_hypothesis(initial: f64) -> Hypothesis {
    Hypothesis::new("deploy-agent", "deploy-42 broke checkout", initial)
        .unwrap()
        .with_metadata(HypothesisMetadata {
            affected_systems: vec!["checkout".into()],
            suspected_cause: Some("deploy-42".into()),
            symptom: Some("checkout".into()),
            ..Default::default()
        })
}

/// Fixture in which deploy-42 lands `offset` relative to the checkout symptom.
pub fn timeline(offset: Duration) -> FixtureSource {
    FixtureSource::new("fixture")
        .respond(
            QueryRequest::EventTime {
                subject: "deploy-42".into(),
            },
            QueryResponse::Timestamp(onset() + offset),
        )
        .respond(
            QueryRequest::EventTime {
                subject: "checkout".into(),
            },
            QueryResponse::Timestamp(onset()),
        )
        .respond(
            QueryRequest::AffectedScope {
                incident_id: INCIDENT.into(),
            },
            QueryResponse::Systems(vec!["checkout".into()]),
        )
}

/// Strategy with a fixed verdict and no data access.
pub struct Scripted {
    pub name: String,
    pub outcome: AttemptOutcome,
}

impl Scripted {
    pub fn arc(name: impl Into<String>, outcome: AttemptOutcome) -> Arc<dyn DisproofStrategy> {
        Arc::new(Self {
            name: name.into(),
            outcome,
        })
    }
}

#[async_trait]
impl DisproofStrategy for Scripted {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Custom
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        format!("{} holds for {}", self.name, hypothesis.id())
    }

    async fn attempt(&self, hypothesis: &Hypothesis, _ctx: &QueryContext) -> AttemptReport {
        let report = AttemptReport {
            strategy: self.name.clone(),
            expectation: self.expectation(hypothesis),
            observed: format!("scripted {}", self.outcome),
            outcome: self.outcome,
            evidence: Vec::new(),
        };
        match self.outcome {
            AttemptOutcome::Survived => report.with_evidence(Evidence::supporting(
                "script",
                EvidenceQuality::Corroborated,
                0.7,
                "held",
            )),
            AttemptOutcome::Failed => report.with_evidence(Evidence::contradicting(
                "script",
                EvidenceQuality::Direct,
                0.9,
                "contradicted",
            )),
            AttemptOutcome::Inconclusive => report,
        }
    }
}
