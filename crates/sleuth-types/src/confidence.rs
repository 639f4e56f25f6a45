//! Confidence calculator.
//!
//! Confidence is a pure function of a hypothesis's initial confidence, its
//! evidence ledger and its disproof history:
//!
//! ```text
//! evidence_score = anchored saturation of Σ ±(local_confidence × quality_weight)
//! confidence     = clamp(0.7·evidence_score + 0.3·initial + survival_bonus, 0, 1)
//! any FAILED     → confidence = min(confidence, 0.25)
//! ```
//!
//! The evidence score starts at the initial confidence and moves towards 1
//! (supporting sum) or 0 (contradicting sum) along `tanh`, so a handful of
//! weak items only nudges it and no amount of evidence overshoots the bounds.

use serde::{Deserialize, Serialize};

use crate::attempt::DisproofAttempt;
use crate::evidence::Evidence;

/// Weight of the evidence score in the final value.
pub const EVIDENCE_WEIGHT: f64 = 0.7;

/// Weight of the initial confidence anchor in the final value.
pub const ANCHOR_WEIGHT: f64 = 0.3;

/// Bonus per survived disproof attempt.
pub const SURVIVAL_INCREMENT: f64 = 0.05;

/// Maximum cumulative survival bonus.
pub const SURVIVAL_CAP: f64 = 0.3;

/// Confidence ceiling once any attempt has failed.
pub const DISPROVEN_CEILING: f64 = 0.25;

/// Below this a hypothesis counts as ruled out.
pub const RULED_OUT_THRESHOLD: f64 = 0.3;

/// Every term of a confidence computation, for reports and audit steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    /// Signed, unnormalized evidence sum.
    pub evidence_sum: f64,
    /// Evidence sum normalized into [0, 1].
    pub evidence_score: f64,
    /// Initial confidence the computation was anchored to.
    pub anchor: f64,
    /// Survival bonus after the cap.
    pub survival_bonus: f64,
    /// Whether a failed attempt forced the ceiling.
    pub disproven: bool,
    /// Final confidence.
    pub value: f64,
}

/// Signed sum of evidence contributions.
pub fn evidence_sum(evidence: &[Evidence]) -> f64 {
    evidence.iter().map(Evidence::signed_weight).sum()
}

/// Normalize an evidence sum into [0, 1], anchored at `initial`.
///
/// A zero sum yields exactly `initial`.
pub fn evidence_score(initial: f64, sum: f64) -> f64 {
    let initial = sanitize(initial);
    if !sum.is_finite() || sum == 0.0 {
        return initial;
    }
    let pull = sum.tanh();
    let score = if pull > 0.0 {
        initial + (1.0 - initial) * pull
    } else {
        initial + initial * pull
    };
    score.clamp(0.0, 1.0)
}

/// Capped bonus for survived attempts.
pub fn survival_bonus(attempts: &[DisproofAttempt]) -> f64 {
    let survived = attempts.iter().filter(|a| a.is_survived()).count();
    (survived as f64 * SURVIVAL_INCREMENT).min(SURVIVAL_CAP)
}

/// Full computation with every intermediate term.
pub fn breakdown(
    initial: f64,
    evidence: &[Evidence],
    attempts: &[DisproofAttempt],
) -> ConfidenceBreakdown {
    let anchor = sanitize(initial);
    let sum = evidence_sum(evidence);
    let score = evidence_score(anchor, sum);
    let bonus = survival_bonus(attempts);
    let disproven = attempts.iter().any(DisproofAttempt::is_failed);

    // Same as EVIDENCE_WEIGHT·score + ANCHOR_WEIGHT·anchor, written so an
    // empty ledger returns the anchor bit-for-bit.
    let blended = anchor + EVIDENCE_WEIGHT * (score - anchor);
    let mut value = (blended + bonus).clamp(0.0, 1.0);
    if disproven {
        value = value.min(DISPROVEN_CEILING);
    }

    ConfidenceBreakdown {
        evidence_sum: sum,
        evidence_score: score,
        anchor,
        survival_bonus: bonus,
        disproven,
        value,
    }
}

/// Current confidence of a hypothesis with the given history.
pub fn compute(initial: f64, evidence: &[Evidence], attempts: &[DisproofAttempt]) -> f64 {
    breakdown(initial, evidence, attempts).value
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::AttemptOutcome;
    use crate::evidence::EvidenceQuality;
    use chrono::Utc;
    use proptest::prelude::*;

    fn attempt(outcome: AttemptOutcome) -> DisproofAttempt {
        DisproofAttempt {
            strategy: "test".into(),
            expectation: "expect".into(),
            observed: "observed".into(),
            outcome,
            confidence_delta: 0.0,
            evidence: vec![],
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn weights_sum_to_one() {
        assert!((EVIDENCE_WEIGHT + ANCHOR_WEIGHT - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_history_returns_initial() {
        for initial in [0.0, 0.13, 0.5, 0.77, 1.0] {
            assert_eq!(compute(initial, &[], &[]), initial);
        }
    }

    #[test]
    fn direct_supporting_evidence_raises_confidence() {
        let evidence = vec![Evidence::supporting(
            "metrics",
            EvidenceQuality::Direct,
            0.9,
            "cpu saturated",
        )];
        let b = breakdown(0.5, &evidence, &[]);
        assert!((b.evidence_sum - 0.9).abs() < 1e-12);
        assert!(b.value > 0.5);
        assert!(b.value <= 1.0);
    }

    #[test]
    fn contradicting_evidence_lowers_confidence() {
        let evidence = vec![Evidence::contradicting(
            "metrics",
            EvidenceQuality::Direct,
            0.9,
            "cpu idle",
        )];
        assert!(compute(0.5, &evidence, &[]) < 0.5);
    }

    #[test]
    fn weak_evidence_barely_moves_the_score() {
        let evidence: Vec<Evidence> = (0..3)
            .map(|_| Evidence::contradicting("m", EvidenceQuality::Weak, 0.5, "noise"))
            .collect();
        let value = compute(0.8, &evidence, &[]);
        assert!(value < 0.8);
        assert!(value > 0.7, "three weak items moved confidence to {value}");
    }

    #[test]
    fn survival_bonus_caps_after_six_attempts() {
        let five: Vec<DisproofAttempt> = (0..5).map(|_| attempt(AttemptOutcome::Survived)).collect();
        let six: Vec<DisproofAttempt> = (0..6).map(|_| attempt(AttemptOutcome::Survived)).collect();
        let seven: Vec<DisproofAttempt> = (0..7).map(|_| attempt(AttemptOutcome::Survived)).collect();
        assert!((survival_bonus(&five) - 0.25).abs() < 1e-12);
        assert!((survival_bonus(&six) - SURVIVAL_CAP).abs() < 1e-12);
        assert_eq!(survival_bonus(&six), survival_bonus(&seven));
    }

    #[test]
    fn inconclusive_attempts_earn_no_bonus() {
        let attempts = vec![attempt(AttemptOutcome::Inconclusive); 4];
        assert_eq!(survival_bonus(&attempts), 0.0);
        assert_eq!(compute(0.4, &[], &attempts), 0.4);
    }

    #[test]
    fn failed_attempt_forces_ceiling() {
        let evidence = vec![Evidence::supporting("m", EvidenceQuality::Direct, 1.0, "x"); 5];
        let mut attempts = vec![attempt(AttemptOutcome::Survived); 6];
        attempts.push(attempt(AttemptOutcome::Failed));
        let b = breakdown(0.95, &evidence, &attempts);
        assert!(b.disproven);
        assert!(b.value <= DISPROVEN_CEILING);
        assert!(b.value < RULED_OUT_THRESHOLD);
    }

    #[test]
    fn non_finite_initial_is_sanitized() {
        assert_eq!(compute(f64::NAN, &[], &[]), 0.0);
    }

    fn arb_evidence() -> impl Strategy<Value = Evidence> {
        (
            prop::sample::select(EvidenceQuality::ALL.to_vec()),
            any::<bool>(),
            0.0f64..=1.0,
        )
            .prop_map(|(quality, supports, local)| {
                let e = Evidence::supporting("prop", quality, local, "generated");
                Evidence { supports, ..e }
            })
    }

    fn arb_outcome() -> impl Strategy<Value = AttemptOutcome> {
        prop_oneof![
            Just(AttemptOutcome::Survived),
            Just(AttemptOutcome::Failed),
            Just(AttemptOutcome::Inconclusive),
        ]
    }

    proptest! {
        #[test]
        fn confidence_always_in_unit_interval(
            initial in 0.0f64..=1.0,
            evidence in prop::collection::vec(arb_evidence(), 0..40),
            outcomes in prop::collection::vec(arb_outcome(), 0..12),
        ) {
            let attempts: Vec<DisproofAttempt> = outcomes.into_iter().map(attempt).collect();
            let value = compute(initial, &evidence, &attempts);
            prop_assert!((0.0..=1.0).contains(&value));
        }

        #[test]
        fn computation_is_idempotent(
            initial in 0.0f64..=1.0,
            evidence in prop::collection::vec(arb_evidence(), 0..20),
            outcomes in prop::collection::vec(arb_outcome(), 0..8),
        ) {
            let attempts: Vec<DisproofAttempt> = outcomes.into_iter().map(attempt).collect();
            let first = breakdown(initial, &evidence, &attempts);
            let second = breakdown(initial, &evidence, &attempts);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn any_failure_rules_out(
            initial in 0.0f64..=1.0,
            evidence in prop::collection::vec(arb_evidence(), 0..20),
            survived in 0usize..10,
        ) {
            let mut attempts: Vec<DisproofAttempt> =
                (0..survived).map(|_| attempt(AttemptOutcome::Survived)).collect();
            attempts.push(attempt(AttemptOutcome::Failed));
            prop_assert!(compute(initial, &evidence, &attempts) < RULED_OUT_THRESHOLD);
        }

        #[test]
        fn survivals_never_decrease_confidence(
            initial in 0.0f64..=1.0,
            evidence in prop::collection::vec(arb_evidence(), 0..20),
            survived in 0usize..10,
        ) {
            let before: Vec<DisproofAttempt> =
                (0..survived).map(|_| attempt(AttemptOutcome::Survived)).collect();
            let mut after = before.clone();
            after.push(attempt(AttemptOutcome::Survived));
            prop_assert!(compute(initial, &evidence, &after) >= compute(initial, &evidence, &before));
        }
    }
}
