//! Disproof strategies.
//!
//! A strategy attacks one hypothesis with one falsifiable test:
//!
//! 1. state the expectation ("if the hypothesis holds, X") before querying,
//! 2. query the minimum data needed to check it,
//! 3. classify the result as SURVIVED, FAILED or INCONCLUSIVE,
//! 4. return an [`AttemptReport`] with quality-rated evidence.
//!
//! Strategies never mutate the hypothesis and never fail: an unreachable or
//! misbehaving data source yields an INCONCLUSIVE report.

mod signals;
mod structural;

pub use signals::{
    BaselineComparisonStrategy, CorrelationStrategy, MetricThresholdStrategy,
    SimilarIncidentStrategy,
};
pub use structural::{
    AlternativeExplanationStrategy, DependencyAnalysisStrategy, ScopeContradictionStrategy,
    TemporalContradictionStrategy,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sleuth_types::{AttemptOutcome, AttemptReport, Hypothesis};

use crate::error::{QueryError, ValidatorError, ValidatorResult};
use crate::query::QueryContext;

/// Families of disproof strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TemporalContradiction,
    ScopeContradiction,
    CorrelationTesting,
    SimilarIncidentComparison,
    MetricThresholdValidation,
    DependencyAnalysis,
    AlternativeExplanationSearch,
    BaselineComparison,
    /// Application-defined strategy.
    Custom,
}

impl StrategyKind {
    /// Canonical strategy name.
    pub fn label(self) -> &'static str {
        match self {
            Self::TemporalContradiction => "temporal-contradiction",
            Self::ScopeContradiction => "scope-contradiction",
            Self::CorrelationTesting => "correlation-testing",
            Self::SimilarIncidentComparison => "similar-incident-comparison",
            Self::MetricThresholdValidation => "metric-threshold-validation",
            Self::DependencyAnalysis => "dependency-analysis",
            Self::AlternativeExplanationSearch => "alternative-explanation-search",
            Self::BaselineComparison => "baseline-comparison",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A pluggable attempt to disprove a hypothesis.
#[async_trait]
pub trait DisproofStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Name recorded in attempts and audit steps.
    fn name(&self) -> &str {
        self.kind().label()
    }

    /// Budget units one execution costs; `None` uses the configured default.
    fn cost(&self) -> Option<u64> {
        None
    }

    /// The falsifiable expectation, stated before any query is issued.
    /// [`attempt`](Self::attempt) must report exactly this expectation.
    fn expectation(&self, hypothesis: &Hypothesis) -> String;

    /// Run the test. Must not fail; data problems become INCONCLUSIVE.
    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport;
}

/// Report for an attempt whose data could not be obtained.
pub(crate) fn data_unavailable(
    strategy: &str,
    expectation: String,
    error: &QueryError,
) -> AttemptReport {
    AttemptReport::inconclusive(strategy, expectation, format!("data unavailable: {error}"))
}

/// Check a report against the contract of the strategy that produced it.
pub fn check_contract(
    strategy: &str,
    stated_expectation: &str,
    report: &AttemptReport,
) -> ValidatorResult<()> {
    let violation = |reason: String| ValidatorError::ContractViolation {
        strategy: strategy.to_string(),
        reason,
    };

    if report.strategy != strategy {
        return Err(violation(format!(
            "report attributed to {:?}",
            report.strategy
        )));
    }
    if report.expectation.trim().is_empty() {
        return Err(violation("missing expectation".into()));
    }
    if report.expectation != stated_expectation {
        return Err(violation(format!(
            "expectation changed after querying: stated {:?}, reported {:?}",
            stated_expectation, report.expectation
        )));
    }
    if report.outcome == AttemptOutcome::Failed && report.observed.trim().is_empty() {
        return Err(violation("failed outcome without an observation".into()));
    }
    for (index, evidence) in report.evidence.iter().enumerate() {
        if evidence.source.trim().is_empty() {
            return Err(violation(format!("evidence {index} has no source")));
        }
        if !evidence.local_confidence.is_finite()
            || !(0.0..=1.0).contains(&evidence.local_confidence)
        {
            return Err(violation(format!(
                "evidence {index} has local confidence {}",
                evidence.local_confidence
            )));
        }
    }
    Ok(())
}
