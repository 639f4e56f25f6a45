//! Investigation steps: the replayable record of every action taken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::HypothesisId;

/// What kind of action a step records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Candidate selection before any testing.
    Selection,
    /// Declared intent to start testing a hypothesis.
    Intent,
    /// One disproof strategy ran.
    StrategyExecution,
    /// Testing stopped and a terminal state was assigned.
    Termination,
    /// A strategy broke its contract.
    ContractViolation,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selection => write!(f, "selection"),
            Self::Intent => write!(f, "intent"),
            Self::StrategyExecution => write!(f, "strategy-execution"),
            Self::Termination => write!(f, "termination"),
            Self::ContractViolation => write!(f, "contract-violation"),
        }
    }
}

/// Content of a step before it is sequenced and sealed into a trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepDraft {
    pub kind: StepKind,
    pub hypothesis_id: Option<HypothesisId>,
    pub purpose: String,
    pub method: String,
    pub data_sources: Vec<String>,
    pub outcome: String,
    pub cost: u64,
    pub elapsed_ms: u64,
}

impl StepDraft {
    /// Start a draft with the given kind and purpose.
    pub fn new(kind: StepKind, purpose: impl Into<String>) -> Self {
        Self {
            kind,
            hypothesis_id: None,
            purpose: purpose.into(),
            method: String::new(),
            data_sources: Vec::new(),
            outcome: String::new(),
            cost: 0,
            elapsed_ms: 0,
        }
    }

    pub fn hypothesis(mut self, id: &HypothesisId) -> Self {
        self.hypothesis_id = Some(id.clone());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn data_sources(mut self, sources: Vec<String>) -> Self {
        self.data_sources = sources;
        self
    }

    pub fn outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = outcome.into();
        self
    }

    pub fn cost(mut self, cost: u64) -> Self {
        self.cost = cost;
        self
    }

    pub fn elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }
}

/// A sealed audit-trail entry.
///
/// `digest` covers every other field plus `previous_digest`, chaining each
/// step to the one before it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvestigationStep {
    /// 0-based position in its trail.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: StepKind,
    pub hypothesis_id: Option<HypothesisId>,
    /// Why the step was taken.
    pub purpose: String,
    /// How it was carried out.
    pub method: String,
    /// Data sources touched.
    pub data_sources: Vec<String>,
    /// What actually happened.
    pub outcome: String,
    /// Budget units charged.
    pub cost: u64,
    /// Wall-clock time spent.
    pub elapsed_ms: u64,
    /// Digest of the preceding step, empty for the first step.
    pub previous_digest: String,
    /// BLAKE3 digest of this step.
    pub digest: String,
}

impl InvestigationStep {
    /// Seal a draft at `sequence`, chained to `previous_digest`.
    pub fn seal(draft: StepDraft, sequence: u64, previous_digest: Option<&str>) -> Self {
        let mut step = Self {
            sequence,
            timestamp: Utc::now(),
            kind: draft.kind,
            hypothesis_id: draft.hypothesis_id,
            purpose: draft.purpose,
            method: draft.method,
            data_sources: draft.data_sources,
            outcome: draft.outcome,
            cost: draft.cost,
            elapsed_ms: draft.elapsed_ms,
            previous_digest: previous_digest.unwrap_or_default().to_string(),
            digest: String::new(),
        };
        step.digest = step.compute_digest();
        step
    }

    /// Recompute the digest from the step's current content.
    pub fn compute_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.sequence.to_le_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        hasher.update(self.kind.to_string().as_bytes());
        if let Some(id) = &self.hypothesis_id {
            hasher.update(id.0.as_bytes());
        }
        for field in [&self.purpose, &self.method, &self.outcome] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        for source in &self.data_sources {
            hasher.update(&(source.len() as u64).to_le_bytes());
            hasher.update(source.as_bytes());
        }
        hasher.update(&self.cost.to_le_bytes());
        hasher.update(&self.elapsed_ms.to_le_bytes());
        hasher.update(self.previous_digest.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Whether the stored digest matches the content.
    pub fn is_intact(&self) -> bool {
        self.digest == self.compute_digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> StepDraft {
        StepDraft::new(StepKind::StrategyExecution, "check timeline")
            .hypothesis(&HypothesisId("h1".into()))
            .method("temporal-contradiction")
            .data_sources(vec!["fixture:event_time(deploy)".into()])
            .outcome("survived")
            .cost(2)
            .elapsed_ms(15)
    }

    #[test]
    fn sealed_step_is_intact() {
        let step = InvestigationStep::seal(draft(), 0, None);
        assert_eq!(step.sequence, 0);
        assert!(step.previous_digest.is_empty());
        assert_eq!(step.digest.len(), 64);
        assert!(step.is_intact());
    }

    #[test]
    fn tampering_breaks_digest() {
        let mut step = InvestigationStep::seal(draft(), 0, None);
        step.outcome = "failed".into();
        assert!(!step.is_intact());
    }

    #[test]
    fn digest_depends_on_previous() {
        let a = InvestigationStep::seal(draft(), 1, Some("aaaa"));
        let mut b = a.clone();
        b.previous_digest = "bbbb".into();
        assert_ne!(a.digest, b.compute_digest());
    }
}
