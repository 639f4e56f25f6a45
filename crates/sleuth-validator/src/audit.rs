//! Tamper-evident investigation trails.
//!
//! Every step is sealed with a BLAKE3 digest chained to the previous step,
//! so a trail can be replayed in order and any edit, removal or reordering
//! is detected by [`AuditTrail::verify`].

use serde::{Deserialize, Serialize};
use sleuth_types::{InvestigationStep, Ledger, StepDraft};
use tracing::debug;

use crate::error::{ValidatorError, ValidatorResult};

/// Ordered, hash-chained log of investigation steps for one scope
/// (a hypothesis, or a whole run).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    scope: String,
    steps: Ledger<InvestigationStep>,
}

impl AuditTrail {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            steps: Ledger::new(),
        }
    }

    /// Rebuild a trail from persisted steps. Fails if the chain is broken.
    pub fn from_steps(scope: impl Into<String>, steps: Vec<InvestigationStep>) -> ValidatorResult<Self> {
        let trail = Self {
            scope: scope.into(),
            steps: Ledger::from(steps),
        };
        trail.verify()?;
        Ok(trail)
    }

    /// Parse a trail written by [`to_json_lines`](Self::to_json_lines).
    pub fn from_json_lines(scope: impl Into<String>, text: &str) -> ValidatorResult<Self> {
        let steps = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<InvestigationStep>, _>>()?;
        Self::from_steps(scope, steps)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Seal `draft` as the next step.
    pub fn record(&mut self, draft: StepDraft) -> &InvestigationStep {
        let sequence = self.steps.len() as u64;
        let previous = self.steps.last().map(|s| s.digest.clone());
        let step = InvestigationStep::seal(draft, sequence, previous.as_deref());
        debug!(
            scope = %self.scope,
            sequence,
            kind = %step.kind,
            outcome = %step.outcome,
            "Investigation step recorded"
        );
        let index = self.steps.append(step);
        &self.steps.as_slice()[index]
    }

    pub fn steps(&self) -> &[InvestigationStep] {
        self.steps.as_slice()
    }

    /// Steps in the order they were taken.
    pub fn replay(&self) -> impl Iterator<Item = &InvestigationStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&InvestigationStep> {
        self.steps.last()
    }

    /// Total cost charged across all steps.
    pub fn total_cost(&self) -> u64 {
        self.steps.iter().map(|s| s.cost).sum()
    }

    /// Check sequence numbers, digests and chain links.
    pub fn verify(&self) -> ValidatorResult<()> {
        let mut previous = String::new();
        for (index, step) in self.steps.iter().enumerate() {
            let intact = step.sequence == index as u64
                && step.previous_digest == previous
                && step.is_intact();
            if !intact {
                return Err(ValidatorError::AuditIntegrity {
                    scope: self.scope.clone(),
                    sequence: index as u64,
                });
            }
            previous.clone_from(&step.digest);
        }
        Ok(())
    }

    /// One JSON object per line, in step order.
    pub fn to_json_lines(&self) -> ValidatorResult<String> {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&serde_json::to_string(step)?);
            out.push('\n');
        }
        Ok(out)
    }
}
