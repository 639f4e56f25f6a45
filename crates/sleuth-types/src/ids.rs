//! Identifier types.

use serde::{Deserialize, Serialize};

/// Unique identifier for a hypothesis.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HypothesisId(pub String);

impl HypothesisId {
    /// Generate a new unique hypothesis ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for HypothesisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hyp:{}", self.0)
    }
}

/// Position of an evidence item inside a hypothesis's evidence ledger.
///
/// Ledgers never shrink, so a reference stays valid for the lifetime of the
/// hypothesis that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceRef(pub usize);

impl std::fmt::Display for EvidenceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ev#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hypothesis_id_uniqueness() {
        assert_ne!(HypothesisId::new(), HypothesisId::new());
    }

    #[test]
    fn display_formats() {
        assert!(HypothesisId::new().to_string().starts_with("hyp:"));
        assert_eq!(EvidenceRef(3).to_string(), "ev#3");
    }

    #[test]
    fn evidence_ref_serializes_as_index() {
        let json = serde_json::to_string(&EvidenceRef(12)).unwrap();
        assert_eq!(json, "12");
    }
}
