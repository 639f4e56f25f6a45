//! # sleuth-validator
//!
//! Falsification-first validation of root-cause hypotheses.
//!
//! Candidate explanations for an incident are not believed because they are
//! plausible; they are believed because they survived deliberate attempts to
//! disprove them. This crate runs those attempts and records every action in
//! a replayable audit trail.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────┐
//!   │ SpecialistAgents     │  ← observe() → propose(), concurrent, per-agent timeout
//!   └──────────┬───────────┘
//!              ▼
//!   ┌──────────────────────┐
//!   │ Selection            │  ← top-N by initial confidence
//!   └──────────┬───────────┘
//!              ▼
//!   ┌──────────────────────┐     ┌────────────────────┐
//!   │ HypothesisValidator  │ ──► │ DisproofStrategy   │ ← one at a time, in order
//!   │ (budget, deadline)   │ ◄── │ via QueryContext   │ ← per-query timeout
//!   └──────────┬───────────┘     └────────────────────┘
//!              ▼
//!   ┌──────────────────────┐
//!   │ InvestigationReport  │  → ranked hypotheses + hash-chained trails
//!   └──────────────────────┘
//! ```
//!
//! ## Failure containment
//!
//! - A data source that times out or errors makes the attempt INCONCLUSIVE.
//! - Running out of budget makes the hypothesis INCONCLUSIVE and leaves the
//!   other hypotheses untouched.
//! - Only a strategy that breaks its contract surfaces as an error.

#![deny(unsafe_code)]

pub mod audit;
pub mod budget;
pub mod config;
pub mod error;
pub mod intake;
pub mod query;
pub mod registry;
pub mod report;
pub mod strategy;
pub mod validator;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use audit::AuditTrail;
pub use budget::{AtomicCostMeter, Budget, CostMeter};
pub use config::ValidatorConfig;
pub use error::{
    BudgetError, BudgetResult, QueryError, QueryResult, ValidatorError, ValidatorResult,
};
pub use intake::{gather_hypotheses, Observation, Observations, SpecialistAgent};
pub use query::{
    ChangeEvent, DataSource, FixtureRecord, FixtureReply, FixtureSource, IncidentContext,
    MetricPoint, PastIncident, QueryContext, QueryRequest, QueryResponse, TimeWindow,
};
pub use registry::StrategyRegistry;
pub use report::{ContractBreach, InvestigationReport, RunSummary};
pub use strategy::{
    check_contract, AlternativeExplanationStrategy, BaselineComparisonStrategy,
    CorrelationStrategy, DependencyAnalysisStrategy, DisproofStrategy, MetricThresholdStrategy,
    ScopeContradictionStrategy, SimilarIncidentStrategy, StrategyKind,
    TemporalContradictionStrategy,
};
pub use validator::{HypothesisValidator, BUDGET_EXCEEDED};
