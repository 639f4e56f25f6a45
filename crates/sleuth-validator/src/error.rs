//! Error types for hypothesis validation.
//!
//! Only [`ValidatorError`] ever reaches a caller. [`QueryError`] and
//! [`BudgetError`] are resolved inside the validator into INCONCLUSIVE
//! attempts and states.

use sleuth_types::ModelError;
use thiserror::Error;

/// Failure of a single data-source query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The source did not answer within the allotted time.
    #[error("{source_name} timed out after {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },

    /// The source could not be reached or refused the query.
    #[error("{source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    /// The source answered with something the caller cannot interpret.
    #[error("{source_name} returned a malformed response: {reason}")]
    Malformed { source_name: String, reason: String },

    /// The source has no data for the subject.
    #[error("{source_name} has no data for {subject}")]
    NotFound { source_name: String, subject: String },
}

/// Result type for data-source queries.
pub type QueryResult<T> = Result<T, QueryError>;

/// Budget errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// Not enough budget left to cover the charge.
    #[error("budget exhausted: requested {requested}, remaining {remaining}")]
    Exhausted { requested: u64, remaining: u64 },

    /// The run's deadline has passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Result type for budget operations.
pub type BudgetResult<T> = Result<T, BudgetError>;

/// Errors surfaced to callers of the validator.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// A strategy returned a malformed attempt. This is a defect in the
    /// strategy, not a property of the incident.
    #[error("strategy {strategy} violated its contract: {reason}")]
    ContractViolation { strategy: String, reason: String },

    /// The hypothesis model rejected an operation.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// An audit trail failed verification.
    #[error("audit trail {scope} broken at step {sequence}")]
    AuditIntegrity { scope: String, sequence: u64 },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ValidatorError {
    /// Whether the error stems from a defective strategy.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }
}

/// Result type for validator operations.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = QueryError::Timeout {
            source_name: "prometheus".into(),
            timeout_ms: 5000,
        };
        assert_eq!(err.to_string(), "prometheus timed out after 5000ms");

        let err = BudgetError::Exhausted {
            requested: 3,
            remaining: 1,
        };
        assert_eq!(err.to_string(), "budget exhausted: requested 3, remaining 1");

        let err = ValidatorError::ContractViolation {
            strategy: "temporal-contradiction".into(),
            reason: "empty expectation".into(),
        };
        assert_eq!(
            err.to_string(),
            "strategy temporal-contradiction violated its contract: empty expectation"
        );
    }

    #[test]
    fn model_errors_convert() {
        let err: ValidatorError = ModelError::UnknownEvidence { index: 2 }.into();
        assert!(matches!(err, ValidatorError::Model(_)));
        assert_eq!(err.to_string(), "no evidence at ledger index 2");
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryError>();
        assert_send_sync::<BudgetError>();
        assert_send_sync::<ValidatorError>();
    }
}
