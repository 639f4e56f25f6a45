//! Error types for the hypothesis model.

use thiserror::Error;

use crate::hypothesis::HypothesisState;
use crate::ids::HypothesisId;

/// Errors raised when a hypothesis or its ledgers would be put into an
/// invalid state.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A confidence value was outside [0, 1] or not finite.
    #[error("confidence {value} is outside [0, 1]")]
    ConfidenceOutOfRange { value: f64 },

    /// The hypothesis reached a terminal state and is read-only.
    #[error("{id} is frozen in state {state}")]
    Frozen {
        id: HypothesisId,
        state: HypothesisState,
    },

    /// A lifecycle transition that the state machine does not allow.
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition {
        from: HypothesisState,
        to: HypothesisState,
    },

    /// An evidence reference that does not point into the ledger.
    #[error("no evidence at ledger index {index}")]
    UnknownEvidence { index: usize },
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
