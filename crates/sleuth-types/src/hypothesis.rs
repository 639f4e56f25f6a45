//! Candidate root-cause hypotheses and their lifecycle.
//!
//! A [`Hypothesis`] owns two append-only ledgers (evidence and disproof
//! attempts). Its current confidence is never set by callers: every mutation
//! goes through a method that appends to a ledger and then recomputes the
//! value with [`crate::confidence::compute`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attempt::{AttemptOutcome, AttemptReport, DisproofAttempt};
use crate::confidence::{self, ConfidenceBreakdown};
use crate::error::{ModelError, ModelResult};
use crate::evidence::Evidence;
use crate::ids::{EvidenceRef, HypothesisId};
use crate::ledger::Ledger;

// ── Lifecycle ───────────────────────────────────────────────────────────

/// Lifecycle state of a hypothesis.
///
/// `Generated → Testing → {Supported | Disproven | Inconclusive}`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisState {
    /// Proposed upstream, not yet tested.
    Generated,
    /// Disproof strategies are running.
    Testing,
    /// Survived its full strategy sequence.
    Supported,
    /// At least one disproof attempt succeeded.
    Disproven,
    /// Testing ended without a verdict.
    Inconclusive,
}

impl HypothesisState {
    /// Whether the state is final.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Supported | Self::Disproven | Self::Inconclusive)
    }
}

impl std::fmt::Display for HypothesisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Testing => write!(f, "testing"),
            Self::Supported => write!(f, "supported"),
            Self::Disproven => write!(f, "disproven"),
            Self::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

// ── Metadata ────────────────────────────────────────────────────────────

/// Direction a metric must cross its threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    Above,
    Below,
}

impl std::fmt::Display for ThresholdDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "above"),
            Self::Below => write!(f, "below"),
        }
    }
}

/// "If the hypothesis holds, `metric` must go `direction` `threshold`."
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricExpectation {
    pub metric: String,
    pub threshold: f64,
    pub direction: ThresholdDirection,
}

/// Structured claims a hypothesis makes, read by disproof strategies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HypothesisMetadata {
    /// Systems the hypothesis implies were affected (its blast radius).
    #[serde(default)]
    pub affected_systems: Vec<String>,
    /// Component or change suspected of causing the incident.
    #[serde(default)]
    pub suspected_cause: Option<String>,
    /// Symptom the cause is supposed to explain.
    #[serde(default)]
    pub symptom: Option<String>,
    /// Suspected failure mechanism (e.g. "connection-pool-exhaustion").
    #[serde(default)]
    pub suspected_mechanism: Option<String>,
    /// Metrics the hypothesis implies should co-move.
    #[serde(default)]
    pub implied_metrics: Vec<String>,
    /// Metric thresholds the hypothesis implies were crossed.
    #[serde(default)]
    pub expected_thresholds: Vec<MetricExpectation>,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

// ── Hypothesis ──────────────────────────────────────────────────────────

/// A falsifiable candidate explanation for an incident's root cause.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "HypothesisRecord")]
pub struct Hypothesis {
    id: HypothesisId,
    agent: String,
    statement: String,
    initial_confidence: f64,
    current_confidence: f64,
    evidence: Ledger<Evidence>,
    attempts: Ledger<DisproofAttempt>,
    state: HypothesisState,
    metadata: HypothesisMetadata,
    created_at: DateTime<Utc>,
}

impl Hypothesis {
    /// Create a hypothesis in state `Generated`.
    pub fn new(
        agent: impl Into<String>,
        statement: impl Into<String>,
        initial_confidence: f64,
    ) -> ModelResult<Self> {
        if !initial_confidence.is_finite() || !(0.0..=1.0).contains(&initial_confidence) {
            return Err(ModelError::ConfidenceOutOfRange {
                value: initial_confidence,
            });
        }
        Ok(Self {
            id: HypothesisId::new(),
            agent: agent.into(),
            statement: statement.into(),
            initial_confidence,
            current_confidence: initial_confidence,
            evidence: Ledger::new(),
            attempts: Ledger::new(),
            state: HypothesisState::Generated,
            metadata: HypothesisMetadata::default(),
            created_at: Utc::now(),
        })
    }

    /// Attach structured claims.
    pub fn with_metadata(mut self, metadata: HypothesisMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the creation time (used when replaying recorded proposals).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &HypothesisId {
        &self.id
    }

    /// Tag of the agent that proposed this hypothesis.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn initial_confidence(&self) -> f64 {
        self.initial_confidence
    }

    /// Current, derived confidence.
    pub fn confidence(&self) -> f64 {
        self.current_confidence
    }

    pub fn state(&self) -> HypothesisState {
        self.state
    }

    pub fn metadata(&self) -> &HypothesisMetadata {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Evidence ledger.
    pub fn evidence(&self) -> &Ledger<Evidence> {
        &self.evidence
    }

    /// Disproof history.
    pub fn attempts(&self) -> &Ledger<DisproofAttempt> {
        &self.attempts
    }

    /// Resolve an evidence reference.
    pub fn evidence_at(&self, reference: EvidenceRef) -> ModelResult<&Evidence> {
        self.evidence
            .get(reference.0)
            .ok_or(ModelError::UnknownEvidence { index: reference.0 })
    }

    /// Evidence produced by a given attempt.
    pub fn evidence_for<'a>(
        &'a self,
        attempt: &'a DisproofAttempt,
    ) -> impl Iterator<Item = &'a Evidence> + 'a {
        attempt.evidence.iter().filter_map(|r| self.evidence.get(r.0))
    }

    /// Whether any attempt refuted this hypothesis.
    pub fn is_refuted(&self) -> bool {
        self.attempts.iter().any(DisproofAttempt::is_failed)
    }

    /// Number of attempts the hypothesis survived.
    pub fn survived_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_survived()).count()
    }

    /// Every term of the current confidence.
    pub fn breakdown(&self) -> ConfidenceBreakdown {
        confidence::breakdown(
            self.initial_confidence,
            self.evidence.as_slice(),
            self.attempts.as_slice(),
        )
    }

    // ── Mutation ───────────────────────────────────────────────────────

    /// `Generated → Testing`.
    pub fn begin_testing(&mut self) -> ModelResult<()> {
        self.ensure_open()?;
        if self.state != HypothesisState::Generated {
            return Err(ModelError::InvalidTransition {
                from: self.state,
                to: HypothesisState::Testing,
            });
        }
        self.state = HypothesisState::Testing;
        Ok(())
    }

    /// Append evidence gathered outside a disproof attempt.
    pub fn attach_evidence(&mut self, evidence: Evidence) -> ModelResult<EvidenceRef> {
        self.ensure_open()?;
        let reference = EvidenceRef(self.evidence.append(evidence));
        self.recompute();
        Ok(reference)
    }

    /// Apply a strategy's report: append its evidence and the resulting
    /// attempt, then recompute confidence. Only allowed while `Testing`.
    pub fn record_attempt(&mut self, report: AttemptReport) -> ModelResult<DisproofAttempt> {
        self.ensure_open()?;
        if self.state != HypothesisState::Testing {
            return Err(ModelError::InvalidTransition {
                from: self.state,
                to: HypothesisState::Testing,
            });
        }

        let before = self.current_confidence;
        let references: Vec<EvidenceRef> = report
            .evidence
            .into_iter()
            .map(|e| EvidenceRef(self.evidence.append(e)))
            .collect();

        let mut attempt = DisproofAttempt {
            strategy: report.strategy,
            expectation: report.expectation,
            observed: report.observed,
            outcome: report.outcome,
            confidence_delta: 0.0,
            evidence: references,
            recorded_at: Utc::now(),
        };
        // The delta is known only after the attempt counts towards the
        // survival bonus or ceiling, so derive it from the would-be history.
        let mut history = self.attempts.as_slice().to_vec();
        history.push(attempt.clone());
        let after = confidence::compute(
            self.initial_confidence,
            self.evidence.as_slice(),
            &history,
        );
        attempt.confidence_delta = after - before;

        self.attempts.append(attempt.clone());
        self.recompute();
        Ok(attempt)
    }

    /// `Testing → terminal`.
    ///
    /// `Disproven` is the only terminal state reachable once any attempt has
    /// failed, and it is unreachable otherwise.
    pub fn conclude(&mut self, outcome: HypothesisState) -> ModelResult<()> {
        self.ensure_open()?;
        let allowed = self.state == HypothesisState::Testing
            && outcome.is_terminal()
            && (outcome == HypothesisState::Disproven) == self.is_refuted();
        if !allowed {
            return Err(ModelError::InvalidTransition {
                from: self.state,
                to: outcome,
            });
        }
        self.state = outcome;
        Ok(())
    }

    fn ensure_open(&self) -> ModelResult<()> {
        if self.state.is_terminal() {
            return Err(ModelError::Frozen {
                id: self.id.clone(),
                state: self.state,
            });
        }
        Ok(())
    }

    fn recompute(&mut self) {
        self.current_confidence = confidence::compute(
            self.initial_confidence,
            self.evidence.as_slice(),
            self.attempts.as_slice(),
        );
    }
}

// ── Persistence ─────────────────────────────────────────────────────────

/// Wire shape of a hypothesis. Deserialization goes through this record so
/// the stored confidence is re-derived from the ledgers, never trusted.
#[derive(Deserialize)]
struct HypothesisRecord {
    id: HypothesisId,
    agent: String,
    statement: String,
    initial_confidence: f64,
    #[serde(default)]
    #[allow(dead_code)]
    current_confidence: Option<f64>,
    #[serde(default)]
    evidence: Ledger<Evidence>,
    #[serde(default)]
    attempts: Ledger<DisproofAttempt>,
    state: HypothesisState,
    #[serde(default)]
    metadata: HypothesisMetadata,
    created_at: DateTime<Utc>,
}

impl TryFrom<HypothesisRecord> for Hypothesis {
    type Error = ModelError;

    fn try_from(record: HypothesisRecord) -> Result<Self, Self::Error> {
        let mut hypothesis = Hypothesis::new(
            record.agent,
            record.statement,
            record.initial_confidence,
        )?;
        hypothesis.id = record.id;
        hypothesis.evidence = record.evidence;
        hypothesis.attempts = record.attempts;
        hypothesis.metadata = record.metadata;
        hypothesis.created_at = record.created_at;

        for attempt in hypothesis.attempts.iter() {
            if let Some(missing) = attempt
                .evidence
                .iter()
                .find(|r| r.0 >= hypothesis.evidence.len())
            {
                return Err(ModelError::UnknownEvidence { index: missing.0 });
            }
        }
        let refuted = hypothesis.is_refuted();
        let consistent = match record.state {
            HypothesisState::Disproven => refuted,
            HypothesisState::Generated => hypothesis.attempts.is_empty(),
            HypothesisState::Testing => true,
            HypothesisState::Supported | HypothesisState::Inconclusive => !refuted,
        };
        if !consistent {
            return Err(ModelError::InvalidTransition {
                from: HypothesisState::Testing,
                to: record.state,
            });
        }
        hypothesis.state = record.state;
        hypothesis.recompute();
        Ok(hypothesis)
    }
}

/// Count of attempts per outcome, in outcome order survived/failed/inconclusive.
pub fn outcome_counts(attempts: &[DisproofAttempt]) -> [usize; 3] {
    let mut counts = [0; 3];
    for attempt in attempts {
        let slot = match attempt.outcome {
            AttemptOutcome::Survived => 0,
            AttemptOutcome::Failed => 1,
            AttemptOutcome::Inconclusive => 2,
        };
        counts[slot] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::RULED_OUT_THRESHOLD;
    use crate::evidence::EvidenceQuality;

    fn hypothesis(initial: f64) -> Hypothesis {
        Hypothesis::new("db-agent", "primary database ran out of connections", initial).unwrap()
    }

    #[test]
    fn new_rejects_out_of_range_confidence() {
        assert!(matches!(
            Hypothesis::new("a", "s", 1.2),
            Err(ModelError::ConfidenceOutOfRange { .. })
        ));
        assert!(Hypothesis::new("a", "s", f64::NAN).is_err());
        assert!(Hypothesis::new("a", "s", -0.1).is_err());
    }

    #[test]
    fn new_hypothesis_starts_generated_at_initial_confidence() {
        let h = hypothesis(0.6);
        assert_eq!(h.state(), HypothesisState::Generated);
        assert_eq!(h.confidence(), 0.6);
        assert!(h.evidence().is_empty());
        assert!(h.attempts().is_empty());
    }

    #[test]
    fn record_attempt_requires_testing() {
        let mut h = hypothesis(0.5);
        let err = h
            .record_attempt(AttemptReport::survived("s", "e", "o"))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidTransition { .. }));
    }

    #[test]
    fn record_attempt_links_evidence_and_delta() {
        let mut h = hypothesis(0.5);
        h.begin_testing().unwrap();
        let report = AttemptReport::survived("scope", "blast radius matches", "3/3 systems")
            .with_evidence(Evidence::supporting(
                "fixture",
                EvidenceQuality::Direct,
                0.9,
                "all implied systems affected",
            ));
        let attempt = h.record_attempt(report).unwrap();
        assert_eq!(attempt.evidence, vec![EvidenceRef(0)]);
        assert!(attempt.confidence_delta > 0.0);
        assert!((h.confidence() - (0.5 + attempt.confidence_delta)).abs() < 1e-12);
        assert_eq!(h.evidence_for(&attempt).count(), 1);
        assert_eq!(h.evidence_at(EvidenceRef(0)).unwrap().source, "fixture");
        assert!(h.evidence_at(EvidenceRef(1)).is_err());
    }

    #[test]
    fn failed_attempt_rules_out_and_only_allows_disproven() {
        let mut h = hypothesis(0.9);
        h.begin_testing().unwrap();
        h.record_attempt(AttemptReport::failed("temporal", "cause precedes symptom", "cause came after"))
            .unwrap();
        assert!(h.confidence() < RULED_OUT_THRESHOLD);
        assert!(h.conclude(HypothesisState::Supported).is_err());
        assert!(h.conclude(HypothesisState::Inconclusive).is_err());
        h.conclude(HypothesisState::Disproven).unwrap();
        assert_eq!(h.state(), HypothesisState::Disproven);
    }

    #[test]
    fn disproven_requires_a_failed_attempt() {
        let mut h = hypothesis(0.4);
        h.begin_testing().unwrap();
        assert!(h.conclude(HypothesisState::Disproven).is_err());
    }

    #[test]
    fn terminal_hypothesis_is_frozen() {
        let mut h = hypothesis(0.4);
        h.begin_testing().unwrap();
        h.conclude(HypothesisState::Inconclusive).unwrap();
        let err = h
            .attach_evidence(Evidence::supporting("x", EvidenceQuality::Weak, 0.1, "late"))
            .unwrap_err();
        assert!(matches!(err, ModelError::Frozen { .. }));
        assert!(h.begin_testing().is_err());
        assert!(h.conclude(HypothesisState::Supported).is_err());
    }

    #[test]
    fn begin_testing_only_from_generated() {
        let mut h = hypothesis(0.4);
        h.begin_testing().unwrap();
        assert!(matches!(
            h.begin_testing(),
            Err(ModelError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn serialization_rederives_confidence() {
        let mut h = hypothesis(0.5).with_metadata(HypothesisMetadata {
            suspected_cause: Some("deploy-42".into()),
            ..Default::default()
        });
        h.begin_testing().unwrap();
        h.record_attempt(
            AttemptReport::survived("s", "e", "o").with_evidence(Evidence::supporting(
                "m",
                EvidenceQuality::Corroborated,
                0.8,
                "x",
            )),
        )
        .unwrap();
        h.conclude(HypothesisState::Supported).unwrap();

        let mut json: serde_json::Value = serde_json::to_value(&h).unwrap();
        json["current_confidence"] = serde_json::json!(0.99);
        let restored: Hypothesis = serde_json::from_value(json).unwrap();
        assert_eq!(restored.id(), h.id());
        assert_eq!(restored.state(), HypothesisState::Supported);
        assert_eq!(restored.confidence(), h.confidence());
        assert_eq!(restored.metadata().suspected_cause.as_deref(), Some("deploy-42"));
    }

    #[test]
    fn deserialization_rejects_inconsistent_state() {
        let mut h = hypothesis(0.5);
        h.begin_testing().unwrap();
        h.record_attempt(AttemptReport::failed("s", "e", "o")).unwrap();
        h.conclude(HypothesisState::Disproven).unwrap();

        let mut json = serde_json::to_value(&h).unwrap();
        json["state"] = serde_json::json!("supported");
        assert!(serde_json::from_value::<Hypothesis>(json).is_err());
    }

    #[test]
    fn outcome_counts_by_kind() {
        let mut h = hypothesis(0.5);
        h.begin_testing().unwrap();
        h.record_attempt(AttemptReport::survived("a", "e", "o")).unwrap();
        h.record_attempt(AttemptReport::inconclusive("b", "e", "o")).unwrap();
        h.record_attempt(AttemptReport::survived("c", "e", "o")).unwrap();
        assert_eq!(outcome_counts(h.attempts().as_slice()), [2, 0, 1]);
        assert_eq!(h.survived_count(), 2);
    }
}
