//! Investigation output handed to the presentation layer.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sleuth_types::{Hypothesis, HypothesisId, HypothesisState};

use crate::audit::AuditTrail;
use crate::error::ValidatorResult;

/// Counts per terminal state and the cost this run charged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub tested: usize,
    pub supported: usize,
    pub disproven: usize,
    pub inconclusive: usize,
    pub untested: usize,
    /// Hypotheses withheld because a strategy broke its contract.
    #[serde(default)]
    pub violations: usize,
    pub cost_charged: u64,
}

/// A strategy that broke its contract while testing a hypothesis.
///
/// The hypothesis is withheld from the ranking; its trail, ending in the
/// `ContractViolation` step, stays in [`InvestigationReport::trails`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractBreach {
    pub hypothesis_id: HypothesisId,
    pub agent: String,
    pub statement: String,
    pub strategy: String,
    pub reason: String,
}

/// Result of an investigation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvestigationReport {
    pub incident_id: String,
    /// Tested hypotheses, highest final confidence first.
    pub ranked: Vec<Hypothesis>,
    /// Candidates beyond the selection cap, still `Generated`.
    pub untested: Vec<Hypothesis>,
    /// Run-level trail first, then one trail per tested hypothesis.
    pub trails: Vec<AuditTrail>,
    /// Contract violations contained during the run.
    #[serde(default)]
    pub violations: Vec<ContractBreach>,
    pub summary: RunSummary,
}

impl InvestigationReport {
    pub fn new(
        incident_id: impl Into<String>,
        ranked: Vec<Hypothesis>,
        untested: Vec<Hypothesis>,
        trails: Vec<AuditTrail>,
    ) -> Self {
        let ranked = rank(ranked);
        let count = |state| ranked.iter().filter(|h| h.state() == state).count();
        let summary = RunSummary {
            tested: ranked.len(),
            supported: count(HypothesisState::Supported),
            disproven: count(HypothesisState::Disproven),
            inconclusive: count(HypothesisState::Inconclusive),
            untested: untested.len(),
            violations: 0,
            cost_charged: trails.iter().map(AuditTrail::total_cost).sum(),
        };
        Self {
            incident_id: incident_id.into(),
            ranked,
            untested,
            trails,
            violations: Vec::new(),
            summary,
        }
    }

    pub fn with_violations(mut self, violations: Vec<ContractBreach>) -> Self {
        self.summary.violations = violations.len();
        self.violations = violations;
        self
    }

    /// No strategy broke its contract during the run.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Best-ranked hypothesis, if any was tested.
    pub fn top(&self) -> Option<&Hypothesis> {
        self.ranked.first()
    }

    /// Trail recorded for a tested hypothesis.
    pub fn trail_for(&self, id: &HypothesisId) -> Option<&AuditTrail> {
        let scope = id.to_string();
        self.trails.iter().find(|t| t.scope() == scope)
    }

    /// Verify every trail's hash chain.
    pub fn verify_trails(&self) -> ValidatorResult<()> {
        self.trails.iter().try_for_each(AuditTrail::verify)
    }

    pub fn to_json(&self) -> ValidatorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Final confidence descending; ties go to the earlier-created hypothesis.
/// The sort is stable, so identical inputs give identical output.
pub fn rank(mut hypotheses: Vec<Hypothesis>) -> Vec<Hypothesis> {
    hypotheses.sort_by(|a, b| by_rank(a, b));
    hypotheses
}

fn by_rank(a: &Hypothesis, b: &Hypothesis) -> Ordering {
    b.confidence()
        .total_cmp(&a.confidence())
        .then_with(|| a.created_at().cmp(&b.created_at()))
}
