//! # sleuth-types
//!
//! Data model for falsification-first root-cause analysis.
//!
//! A [`Hypothesis`] is a candidate explanation for an incident. Disproof
//! strategies attack it and hand back [`AttemptReport`]s; applying a report
//! appends [`Evidence`] and a [`DisproofAttempt`] to the hypothesis's
//! append-only ledgers and recomputes its confidence.
//!
//! ## Confidence
//!
//! Confidence is derived, never assigned. [`confidence::compute`] is a pure
//! function of the initial confidence, the evidence ledger and the disproof
//! history, so re-deriving it from a persisted hypothesis always gives the
//! same answer.
//!
//! ```text
//!   Evidence ledger ──┐
//!                     ├──► evidence score (0.7) ─┐
//!   Initial anchor ───┘                          ├──► clamp [0, 1] ──► ceiling 0.25
//!   Initial anchor ─────► anchor (0.3) ──────────┤      if any attempt FAILED
//!   Survived attempts ──► +0.05 each, cap +0.3 ──┘
//! ```
//!
//! ## Lifecycle
//!
//! `Generated → Testing → {Supported | Disproven | Inconclusive}`. Terminal
//! hypotheses are frozen.

#![deny(unsafe_code)]

pub mod attempt;
pub mod confidence;
pub mod error;
pub mod evidence;
pub mod hypothesis;
pub mod ids;
pub mod ledger;
pub mod step;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use attempt::{AttemptOutcome, AttemptReport, DisproofAttempt};
pub use confidence::{ConfidenceBreakdown, DISPROVEN_CEILING, RULED_OUT_THRESHOLD};
pub use error::{ModelError, ModelResult};
pub use evidence::{Evidence, EvidenceQuality};
pub use hypothesis::{
    outcome_counts, Hypothesis, HypothesisMetadata, HypothesisState, MetricExpectation,
    ThresholdDirection,
};
pub use ids::{EvidenceRef, HypothesisId};
pub use ledger::Ledger;
pub use step::{InvestigationStep, StepDraft, StepKind};
