//! Disproof attempts: what a strategy expected, what it saw, and the verdict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::ids::EvidenceRef;

/// Verdict of a single disproof attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The expectation held; the hypothesis was not contradicted.
    Survived,
    /// The observation clearly contradicts the expectation.
    Failed,
    /// Data unavailable, ambiguous, or the attempt was abandoned.
    Inconclusive,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Survived => write!(f, "survived"),
            Self::Failed => write!(f, "failed"),
            Self::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

/// The unapplied result a strategy hands back to the validator.
///
/// Strategies never touch the hypothesis; the validator checks the report and
/// turns it into a [`DisproofAttempt`] by appending it to the hypothesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Name of the strategy that produced this report.
    pub strategy: String,
    /// "If the hypothesis is true, we expect X."
    pub expectation: String,
    /// What was actually observed.
    pub observed: String,
    /// Verdict.
    pub outcome: AttemptOutcome,
    /// Evidence produced while testing.
    pub evidence: Vec<Evidence>,
}

impl AttemptReport {
    fn new(
        strategy: impl Into<String>,
        expectation: impl Into<String>,
        observed: impl Into<String>,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            expectation: expectation.into(),
            observed: observed.into(),
            outcome,
            evidence: Vec::new(),
        }
    }

    /// The expectation held.
    pub fn survived(
        strategy: impl Into<String>,
        expectation: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self::new(strategy, expectation, observed, AttemptOutcome::Survived)
    }

    /// The observation contradicts the expectation.
    pub fn failed(
        strategy: impl Into<String>,
        expectation: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self::new(strategy, expectation, observed, AttemptOutcome::Failed)
    }

    /// Nothing could be concluded.
    pub fn inconclusive(
        strategy: impl Into<String>,
        expectation: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self::new(strategy, expectation, observed, AttemptOutcome::Inconclusive)
    }

    /// Attach one evidence item.
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// Attach several evidence items.
    pub fn with_all_evidence(mut self, evidence: impl IntoIterator<Item = Evidence>) -> Self {
        self.evidence.extend(evidence);
        self
    }
}

/// A recorded, immutable disproof attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisproofAttempt {
    /// Strategy that ran.
    pub strategy: String,
    /// The falsifiable expectation stated before querying.
    pub expectation: String,
    /// What was observed.
    pub observed: String,
    /// Verdict.
    pub outcome: AttemptOutcome,
    /// Confidence after the attempt minus confidence before it.
    pub confidence_delta: f64,
    /// Evidence this attempt appended to the hypothesis's ledger.
    pub evidence: Vec<EvidenceRef>,
    /// When the attempt was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl DisproofAttempt {
    /// Whether this attempt refuted the hypothesis.
    pub fn is_failed(&self) -> bool {
        self.outcome == AttemptOutcome::Failed
    }

    /// Whether the hypothesis withstood this attempt.
    pub fn is_survived(&self) -> bool {
        self.outcome == AttemptOutcome::Survived
    }
}
