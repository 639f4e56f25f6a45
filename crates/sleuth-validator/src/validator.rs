//! The hypothesis validator.
//!
//! Drives each selected hypothesis through
//! `Generated → Testing → {Supported | Disproven | Inconclusive}` by running
//! its strategy sequence strictly in order, stopping at the first successful
//! disproof or when the budget runs out.

use std::sync::Arc;

use sleuth_types::{
    AttemptOutcome, AttemptReport, Hypothesis, HypothesisState, StepDraft, StepKind,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::audit::AuditTrail;
use crate::budget::Budget;
use crate::config::ValidatorConfig;
use crate::error::{ValidatorError, ValidatorResult};
use crate::query::{DataSource, IncidentContext, QueryContext};
use crate::registry::StrategyRegistry;
use crate::report::{ContractBreach, InvestigationReport};
use crate::strategy::{check_contract, DisproofStrategy};

/// Reason recorded when the run's deadline cuts an attempt short.
pub const BUDGET_EXCEEDED: &str = "budget exceeded";

/// Why testing of one hypothesis stopped.
#[derive(Debug)]
enum Stop {
    /// Every strategy ran.
    Completed,
    /// A strategy disproved the hypothesis.
    Disproven { strategy: String },
    /// Cost or time ran out before the sequence finished.
    BudgetExhausted { reason: String },
}

/// How one selected hypothesis came out of testing.
enum Tested {
    Concluded(Hypothesis, AuditTrail),
    Breached(ContractBreach, AuditTrail),
}

/// Orchestrates disproof attempts against hypotheses for one incident.
pub struct HypothesisValidator {
    config: ValidatorConfig,
    source: Arc<dyn DataSource>,
    incident: IncidentContext,
}

impl HypothesisValidator {
    pub fn new(config: ValidatorConfig, source: Arc<dyn DataSource>, incident: IncidentContext) -> Self {
        Self {
            config,
            source,
            incident,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn incident(&self) -> &IncidentContext {
        &self.incident
    }

    /// Test one hypothesis against `strategies`, in order.
    ///
    /// Data-source failures and budget exhaustion are folded into the
    /// hypothesis's attempts and final state. Only a strategy contract
    /// violation or an invalid lifecycle transition returns `Err`.
    #[instrument(skip_all, fields(hypothesis_id = %hypothesis.id(), agent = hypothesis.agent()))]
    pub async fn validate(
        &self,
        mut hypothesis: Hypothesis,
        strategies: &[Arc<dyn DisproofStrategy>],
        budget: &Budget,
        trail: &mut AuditTrail,
    ) -> ValidatorResult<Hypothesis> {
        hypothesis.begin_testing()?;
        trail.record(
            StepDraft::new(
                StepKind::Intent,
                format!("attempt to disprove: {}", hypothesis.statement()),
            )
            .hypothesis(hypothesis.id())
            .method(
                strategies
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(" > "),
            )
            .outcome(format!(
                "testing; initial confidence {:.3}",
                hypothesis.initial_confidence()
            )),
        );
        info!(strategies = strategies.len(), "Testing hypothesis");

        let mut stop = Stop::Completed;
        for strategy in strategies {
            let cost = strategy.cost().unwrap_or(self.config.default_strategy_cost);
            if let Err(e) = budget.reserve(cost) {
                warn!(strategy = strategy.name(), error = %e, "Budget exhausted");
                stop = Stop::BudgetExhausted {
                    reason: e.to_string(),
                };
                break;
            }

            let stated = strategy.expectation(&hypothesis);
            let (report, data_sources, elapsed, deadline_hit) = self
                .execute(strategy.as_ref(), &hypothesis, stated.clone(), budget)
                .await;

            if let Err(e) = check_contract(strategy.name(), &stated, &report) {
                warn!(strategy = strategy.name(), error = %e, "Strategy contract violation");
                trail.record(
                    StepDraft::new(StepKind::ContractViolation, report.expectation.clone())
                        .hypothesis(hypothesis.id())
                        .method(strategy.name())
                        .data_sources(data_sources)
                        .outcome(e.to_string())
                        .cost(cost)
                        .elapsed_ms(elapsed),
                );
                return Err(e);
            }

            let before = hypothesis.confidence();
            let attempt = hypothesis.record_attempt(report)?;
            debug!(
                strategy = strategy.name(),
                outcome = %attempt.outcome,
                confidence = hypothesis.confidence(),
                "Attempt recorded"
            );
            trail.record(
                StepDraft::new(StepKind::StrategyExecution, attempt.expectation.clone())
                    .hypothesis(hypothesis.id())
                    .method(strategy.name())
                    .data_sources(data_sources)
                    .outcome(format!(
                        "{}: {} (confidence {before:.3} -> {:.3})",
                        attempt.outcome,
                        attempt.observed,
                        hypothesis.confidence()
                    ))
                    .cost(cost)
                    .elapsed_ms(elapsed),
            );

            if attempt.outcome == AttemptOutcome::Failed {
                stop = Stop::Disproven {
                    strategy: strategy.name().to_string(),
                };
                break;
            }
            if deadline_hit {
                stop = Stop::BudgetExhausted {
                    reason: BUDGET_EXCEEDED.to_string(),
                };
                break;
            }
        }

        let (state, reason) = match &stop {
            Stop::Disproven { strategy } => (
                HypothesisState::Disproven,
                format!("disproven by {strategy}"),
            ),
            Stop::BudgetExhausted { reason } => (
                HypothesisState::Inconclusive,
                format!("stopped early: {reason}"),
            ),
            Stop::Completed if hypothesis.survived_count() == 0 => (
                HypothesisState::Inconclusive,
                "no strategy produced a verdict".to_string(),
            ),
            Stop::Completed => (
                HypothesisState::Supported,
                format!(
                    "survived {} of {} attempts",
                    hypothesis.survived_count(),
                    hypothesis.attempts().len()
                ),
            ),
        };
        hypothesis.conclude(state)?;
        trail.record(
            StepDraft::new(StepKind::Termination, reason)
                .hypothesis(hypothesis.id())
                .outcome(format!("{state}; confidence {:.3}", hypothesis.confidence())),
        );
        info!(
            state = %state,
            confidence = hypothesis.confidence(),
            attempts = hypothesis.attempts().len(),
            "Hypothesis concluded"
        );
        Ok(hypothesis)
    }

    /// Run one strategy under the strategy timeout and the run deadline.
    /// `expectation` is what the strategy stated before running.
    ///
    /// Returns the report, the data sources touched, elapsed milliseconds
    /// and whether the run deadline cut the attempt short.
    async fn execute(
        &self,
        strategy: &dyn DisproofStrategy,
        hypothesis: &Hypothesis,
        expectation: String,
        budget: &Budget,
    ) -> (AttemptReport, Vec<String>, u64, bool) {
        let ctx = QueryContext::new(
            Arc::clone(&self.source),
            self.incident.clone(),
            self.config.query_timeout(),
        );
        let strategy_timeout = self.config.strategy_timeout();
        let limit = budget
            .time_left()
            .map_or(strategy_timeout, |left| left.min(strategy_timeout));

        let started = Instant::now();
        let outcome = tokio::time::timeout(limit, strategy.attempt(hypothesis, &ctx)).await;
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(report) => (report, ctx.touched_sources(), elapsed, false),
            Err(_) => {
                let deadline_hit = budget.is_expired();
                let observed = if deadline_hit {
                    BUDGET_EXCEEDED.to_string()
                } else {
                    format!("strategy timed out after {}ms", limit.as_millis())
                };
                warn!(strategy = strategy.name(), %observed, "Attempt abandoned");
                (
                    AttemptReport::inconclusive(strategy.name(), expectation, observed),
                    ctx.touched_sources(),
                    elapsed,
                    deadline_hit,
                )
            }
        }
    }

    /// Select the top candidates, test them and rank the results.
    ///
    /// Candidates are ordered by initial confidence (ties: earliest created)
    /// and only the first `max_hypotheses` are tested; the rest are returned
    /// untouched in [`InvestigationReport::untested`]. A hypothesis whose
    /// strategy breaks its contract is withheld from the ranking and listed
    /// in [`InvestigationReport::violations`]; the rest of the run completes.
    #[instrument(skip_all, fields(incident = %self.incident.incident_id, candidates = candidates.len()))]
    pub async fn investigate(
        &self,
        mut candidates: Vec<Hypothesis>,
        registry: &StrategyRegistry,
        budget: &Budget,
    ) -> ValidatorResult<InvestigationReport> {
        self.config.validate()?;
        candidates.sort_by(|a, b| {
            b.initial_confidence()
                .total_cmp(&a.initial_confidence())
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        let cap = self.config.max_hypotheses.min(candidates.len());
        let untested = candidates.split_off(cap);

        let mut run_trail = AuditTrail::new(format!("run:{}", self.incident.incident_id));
        run_trail.record(
            StepDraft::new(
                StepKind::Selection,
                format!(
                    "select top {} of {} candidates by initial confidence",
                    self.config.max_hypotheses,
                    cap + untested.len()
                ),
            )
            .method("initial-confidence ranking")
            .outcome(format!(
                "selected [{}]; deferred [{}]",
                ids(&candidates),
                ids(&untested)
            )),
        );
        info!(
            selected = candidates.len(),
            deferred = untested.len(),
            parallel = self.config.parallel_hypotheses,
            "Candidates selected"
        );

        let outcomes = if self.config.parallel_hypotheses {
            let runs = candidates
                .into_iter()
                .map(|h| self.validate_with_trail(h, registry, budget));
            futures::future::join_all(runs).await
        } else {
            let mut outcomes = Vec::with_capacity(candidates.len());
            for h in candidates {
                outcomes.push(self.validate_with_trail(h, registry, budget).await);
            }
            outcomes
        };

        let mut tested = Vec::with_capacity(outcomes.len());
        let mut breaches = Vec::new();
        let mut hypothesis_trails = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome? {
                Tested::Concluded(hypothesis, trail) => {
                    tested.push(hypothesis);
                    hypothesis_trails.push(trail);
                }
                Tested::Breached(breach, trail) => {
                    run_trail.record(
                        StepDraft::new(
                            StepKind::ContractViolation,
                            format!("withhold {} from the ranking", breach.hypothesis_id),
                        )
                        .hypothesis(&breach.hypothesis_id)
                        .method(breach.strategy.clone())
                        .outcome(breach.reason.clone()),
                    );
                    breaches.push(breach);
                    hypothesis_trails.push(trail);
                }
            }
        }

        let mut trails = vec![run_trail];
        trails.extend(hypothesis_trails);
        let report = InvestigationReport::new(
            self.incident.incident_id.clone(),
            tested,
            untested,
            trails,
        )
        .with_violations(breaches);
        info!(
            supported = report.summary.supported,
            disproven = report.summary.disproven,
            inconclusive = report.summary.inconclusive,
            violations = report.summary.violations,
            cost = report.summary.cost_charged,
            "Investigation complete"
        );
        Ok(report)
    }

    /// Contract violations are contained here so the rest of the run and
    /// the offending trail survive into the report.
    async fn validate_with_trail(
        &self,
        hypothesis: Hypothesis,
        registry: &StrategyRegistry,
        budget: &Budget,
    ) -> ValidatorResult<Tested> {
        let mut trail = AuditTrail::new(hypothesis.id().to_string());
        let strategies = registry.sequence_for(hypothesis.agent());
        let hypothesis_id = hypothesis.id().clone();
        let agent = hypothesis.agent().to_string();
        let statement = hypothesis.statement().to_string();
        match self.validate(hypothesis, strategies, budget, &mut trail).await {
            Ok(hypothesis) => Ok(Tested::Concluded(hypothesis, trail)),
            Err(ValidatorError::ContractViolation { strategy, reason }) => Ok(Tested::Breached(
                ContractBreach {
                    hypothesis_id,
                    agent,
                    statement,
                    strategy,
                    reason,
                },
                trail,
            )),
            Err(e) => Err(e),
        }
    }
}

fn ids(hypotheses: &[Hypothesis]) -> String {
    hypotheses
        .iter()
        .map(|h| h.id().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Debug for HypothesisValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HypothesisValidator")
            .field("config", &self.config)
            .field("source", &self.source.name())
            .field("incident", &self.incident.incident_id)
            .finish()
    }
}
