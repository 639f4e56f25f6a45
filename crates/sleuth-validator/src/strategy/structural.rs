//! Strategies that test a hypothesis against the incident's structure:
//! timeline, blast radius, dependency graph and competing changes.

use async_trait::async_trait;
use sleuth_types::{AttemptReport, Evidence, EvidenceQuality, Hypothesis};

use super::{data_unavailable, DisproofStrategy, StrategyKind};
use crate::query::QueryContext;

fn symptom_label(hypothesis: &Hypothesis) -> &str {
    hypothesis
        .metadata()
        .symptom
        .as_deref()
        .unwrap_or("the symptom")
}

// ── 1. Temporal Contradiction ───────────────────────────────────────────

/// A cause cannot come after its effect.
///
/// Looks up when the suspected cause occurred and when the symptom began
/// (the named symptom's own event time, or the incident onset). A cause that
/// starts after the symptom, beyond the allowed clock skew, refutes the
/// hypothesis.
pub struct TemporalContradictionStrategy {
    clock_skew: chrono::Duration,
}

impl TemporalContradictionStrategy {
    pub fn new() -> Self {
        Self {
            clock_skew: chrono::Duration::zero(),
        }
    }

    /// Tolerate timestamps that disagree by up to `skew`.
    pub fn with_clock_skew(skew: chrono::Duration) -> Self {
        Self { clock_skew: skew }
    }
}

impl Default for TemporalContradictionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisproofStrategy for TemporalContradictionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TemporalContradiction
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        let symptom = symptom_label(hypothesis);
        match &hypothesis.metadata().suspected_cause {
            Some(cause) => format!("{cause} is observed no later than the onset of {symptom}"),
            None => format!("a suspected cause is observed no later than the onset of {symptom}"),
        }
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let Some(cause) = hypothesis.metadata().suspected_cause.as_deref() else {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "hypothesis names no suspected cause",
            );
        };

        let cause_at = match ctx.event_time(cause).await {
            Ok(at) => at,
            Err(e) => return data_unavailable(self.name(), expectation, &e),
        };
        let symptom_at = match &hypothesis.metadata().symptom {
            Some(symptom) => match ctx.event_time(symptom).await {
                Ok(at) => at,
                Err(e) => return data_unavailable(self.name(), expectation, &e),
            },
            None => ctx.incident().onset,
        };

        let source = format!("{}:event_time({cause})", ctx.source_name());
        let gap = symptom_at - cause_at;
        if cause_at <= symptom_at + self.clock_skew {
            let observed = if gap >= chrono::Duration::zero() {
                format!(
                    "{cause} at {cause_at} precedes symptom onset at {symptom_at} by {}s",
                    gap.num_seconds()
                )
            } else {
                format!(
                    "{cause} at {cause_at} follows symptom onset at {symptom_at} by {}s, \
                     within the allowed clock skew of {}s",
                    -gap.num_seconds(),
                    self.clock_skew.num_seconds()
                )
            };
            AttemptReport::survived(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::supporting(source, EvidenceQuality::Indirect, 0.6, observed),
            )
        } else {
            let observed = format!(
                "{cause} at {cause_at} started {}s after symptom onset at {symptom_at}",
                -gap.num_seconds()
            );
            AttemptReport::failed(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::contradicting(source, EvidenceQuality::Direct, 0.95, observed),
            )
        }
    }
}

// ── 2. Scope Contradiction ──────────────────────────────────────────────

/// The blast radius a hypothesis implies must match what was affected.
///
/// If none of the implied systems were affected the hypothesis is refuted.
/// If the implied systems account for at least `min_coverage` of the
/// affected scope it survives; partial coverage is inconclusive.
pub struct ScopeContradictionStrategy {
    min_coverage: f64,
}

impl ScopeContradictionStrategy {
    pub fn new() -> Self {
        Self { min_coverage: 0.5 }
    }

    pub fn with_min_coverage(min_coverage: f64) -> Self {
        Self {
            min_coverage: min_coverage.clamp(0.0, 1.0),
        }
    }
}

impl Default for ScopeContradictionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisproofStrategy for ScopeContradictionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ScopeContradiction
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        format!(
            "the implied systems [{}] are affected and cover at least {:.0}% of the affected scope",
            hypothesis.metadata().affected_systems.join(", "),
            self.min_coverage * 100.0
        )
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let implied = &hypothesis.metadata().affected_systems;
        if implied.is_empty() {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "hypothesis implies no blast radius",
            );
        }

        let actual = match ctx.affected_scope().await {
            Ok(systems) => systems,
            Err(e) => return data_unavailable(self.name(), expectation, &e),
        };
        if actual.is_empty() {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "no affected systems recorded for the incident",
            );
        }

        let overlap: Vec<&String> = implied.iter().filter(|s| actual.contains(s)).collect();
        let source = format!(
            "{}:affected_scope({})",
            ctx.source_name(),
            ctx.incident().incident_id
        );

        if overlap.is_empty() {
            let observed = format!(
                "none of the implied systems are affected; actual scope is [{}]",
                actual.join(", ")
            );
            return AttemptReport::failed(self.name(), expectation, observed.clone())
                .with_evidence(Evidence::contradicting(
                    source,
                    EvidenceQuality::Direct,
                    0.9,
                    observed,
                ));
        }

        let coverage = overlap.len() as f64 / actual.len() as f64;
        let observed = format!(
            "implied systems cover {}/{} affected systems ({:.0}%)",
            overlap.len(),
            actual.len(),
            coverage * 100.0
        );
        if coverage >= self.min_coverage {
            AttemptReport::survived(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::supporting(source, EvidenceQuality::Corroborated, coverage, observed),
            )
        } else {
            AttemptReport::inconclusive(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::contradicting(
                    source,
                    EvidenceQuality::Suggestive,
                    1.0 - coverage,
                    observed,
                ),
            )
        }
    }
}

// ── 3. Dependency Analysis ──────────────────────────────────────────────

/// A cause can only reach a symptom along a dependency path.
///
/// Queries the transitive dependencies of the symptomatic system (the named
/// symptom, else the first implied system) and refutes the hypothesis when
/// the suspected cause is not among them.
pub struct DependencyAnalysisStrategy;

impl DependencyAnalysisStrategy {
    fn symptomatic_system(hypothesis: &Hypothesis) -> Option<&str> {
        let metadata = hypothesis.metadata();
        metadata
            .symptom
            .as_deref()
            .or_else(|| metadata.affected_systems.first().map(String::as_str))
    }
}

#[async_trait]
impl DisproofStrategy for DependencyAnalysisStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DependencyAnalysis
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        let cause = hypothesis
            .metadata()
            .suspected_cause
            .as_deref()
            .unwrap_or("the suspected cause");
        let system = Self::symptomatic_system(hypothesis).unwrap_or("the symptomatic system");
        format!("{system} depends, directly or transitively, on {cause}")
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let (Some(cause), Some(system)) = (
            hypothesis.metadata().suspected_cause.as_deref(),
            Self::symptomatic_system(hypothesis),
        ) else {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "hypothesis names no suspected cause or symptomatic system",
            );
        };

        if cause == system {
            return AttemptReport::survived(
                self.name(),
                expectation,
                format!("{cause} is itself the symptomatic system"),
            );
        }

        let dependencies = match ctx.dependencies(system).await {
            Ok(deps) => deps,
            Err(e) => return data_unavailable(self.name(), expectation, &e),
        };
        if dependencies.is_empty() {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                format!("no dependency data for {system}"),
            );
        }

        let source = format!("{}:dependencies({system})", ctx.source_name());
        if dependencies.iter().any(|d| d == cause) {
            let observed = format!("{system} depends on {cause}");
            AttemptReport::survived(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::supporting(source, EvidenceQuality::Indirect, 0.7, observed),
            )
        } else {
            let observed = format!(
                "{system} has {} dependencies and {cause} is not one of them",
                dependencies.len()
            );
            AttemptReport::failed(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::contradicting(source, EvidenceQuality::Direct, 0.85, observed),
            )
        }
    }
}

// ── 4. Alternative Explanation Search ───────────────────────────────────

/// Looks for other changes that could explain the incident.
///
/// Competing changes never refute a hypothesis on their own; they make the
/// attempt inconclusive and are recorded as contradicting evidence.
pub struct AlternativeExplanationStrategy {
    max_alternatives: usize,
}

impl AlternativeExplanationStrategy {
    pub fn new() -> Self {
        Self {
            max_alternatives: 3,
        }
    }

    pub fn with_max_alternatives(max_alternatives: usize) -> Self {
        Self { max_alternatives }
    }
}

impl Default for AlternativeExplanationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisproofStrategy for AlternativeExplanationStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AlternativeExplanationSearch
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        let cause = hypothesis
            .metadata()
            .suspected_cause
            .as_deref()
            .unwrap_or("the suspected cause");
        format!("no change other than {cause} touched the affected systems during the incident window")
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let metadata = hypothesis.metadata();
        let window = ctx.incident().window.clone();

        let changes = match ctx.change_events(&window).await {
            Ok(changes) => changes,
            Err(e) => return data_unavailable(self.name(), expectation, &e),
        };

        let cause = metadata.suspected_cause.as_deref();
        let alternatives: Vec<_> = changes
            .iter()
            .filter(|c| {
                metadata.affected_systems.is_empty() || metadata.affected_systems.contains(&c.system)
            })
            .filter(|c| match cause {
                Some(cause) => c.system != cause && !c.description.contains(cause),
                None => true,
            })
            .collect();

        let source = format!("{}:change_events", ctx.source_name());
        if alternatives.is_empty() {
            let observed = format!(
                "{} change(s) in window, none competing with the suspected cause",
                changes.len()
            );
            return AttemptReport::survived(self.name(), expectation, observed.clone())
                .with_evidence(Evidence::supporting(
                    source,
                    EvidenceQuality::Suggestive,
                    0.5,
                    observed,
                ));
        }

        let observed = format!(
            "{} competing change(s): {}",
            alternatives.len(),
            alternatives
                .iter()
                .map(|c| format!("{} ({})", c.system, c.description))
                .collect::<Vec<_>>()
                .join("; ")
        );
        let evidence = alternatives.iter().take(self.max_alternatives).map(|c| {
            Evidence::contradicting(
                source.clone(),
                EvidenceQuality::Indirect,
                0.5,
                format!("{} changed at {}: {}", c.system, c.at, c.description),
            )
        });
        AttemptReport::inconclusive(self.name(), expectation, observed).with_all_evidence(evidence)
    }
}
