//! Strategies that test a hypothesis against telemetry and history.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sleuth_types::{
    AttemptReport, Evidence, EvidenceQuality, Hypothesis, MetricExpectation, ThresholdDirection,
};

use super::{data_unavailable, DisproofStrategy, StrategyKind};
use crate::query::{MetricPoint, QueryContext};

// ── Statistics ──────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation. Requires at least two values.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Pearson correlation of paired samples, `None` when either side is flat.
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx <= f64::EPSILON || vy <= f64::EPSILON {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}

/// Pair up samples taken at the same instant.
fn align(a: &[MetricPoint], b: &[MetricPoint]) -> Vec<(f64, f64)> {
    let by_time: BTreeMap<_, f64> = b.iter().map(|p| (p.at, p.value)).collect();
    a.iter()
        .filter_map(|p| by_time.get(&p.at).map(|v| (p.value, *v)))
        .collect()
}

fn values(points: &[MetricPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

// ── 5. Metric Threshold Validation ──────────────────────────────────────

/// Every threshold the hypothesis implies must actually be crossed during
/// the incident window.
pub struct MetricThresholdStrategy;

impl MetricThresholdStrategy {
    fn crossed(expectation: &MetricExpectation, points: &[MetricPoint]) -> (bool, f64) {
        let vals = values(points);
        match expectation.direction {
            ThresholdDirection::Above => {
                let peak = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (peak > expectation.threshold, peak)
            }
            ThresholdDirection::Below => {
                let trough = vals.iter().copied().fold(f64::INFINITY, f64::min);
                (trough < expectation.threshold, trough)
            }
        }
    }
}

#[async_trait]
impl DisproofStrategy for MetricThresholdStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MetricThresholdValidation
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        let thresholds = &hypothesis.metadata().expected_thresholds;
        if thresholds.is_empty() {
            return "the hypothesis implies at least one metric threshold crossing".to_string();
        }
        let clauses: Vec<String> = thresholds
            .iter()
            .map(|t| format!("{} goes {} {}", t.metric, t.direction, t.threshold))
            .collect();
        format!("during the incident window {}", clauses.join(" and "))
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let thresholds = &hypothesis.metadata().expected_thresholds;
        if thresholds.is_empty() {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "hypothesis implies no metric thresholds",
            );
        }

        let window = ctx.incident().window.clone();
        let mut crossed = Vec::new();
        let mut missed = Vec::new();
        let mut empty = Vec::new();
        for t in thresholds {
            let points = match ctx.metric_series(&t.metric, &window).await {
                Ok(points) => points,
                Err(e) => return data_unavailable(self.name(), expectation, &e),
            };
            if points.is_empty() {
                empty.push(t.metric.clone());
                continue;
            }
            let (ok, extreme) = Self::crossed(t, &points);
            let source = format!("{}:metric_series({})", ctx.source_name(), t.metric);
            let note = format!(
                "{} reached {extreme} against threshold {} {}",
                t.metric, t.direction, t.threshold
            );
            if ok {
                crossed.push(Evidence::supporting(source, EvidenceQuality::Direct, 0.9, note));
            } else {
                missed.push(Evidence::contradicting(source, EvidenceQuality::Direct, 0.9, note));
            }
        }

        if !missed.is_empty() {
            let observed = missed
                .iter()
                .map(|e| e.interpretation.clone())
                .collect::<Vec<_>>()
                .join("; ");
            return AttemptReport::failed(self.name(), expectation, observed)
                .with_all_evidence(missed)
                .with_all_evidence(crossed);
        }
        if !empty.is_empty() {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                format!("no samples for {}", empty.join(", ")),
            )
            .with_all_evidence(crossed);
        }
        let observed = format!("all {} thresholds crossed", crossed.len());
        AttemptReport::survived(self.name(), expectation, observed).with_all_evidence(crossed)
    }
}

// ── 6. Baseline Comparison ──────────────────────────────────────────────

/// The implicated metric must deviate from its normal behaviour.
///
/// Compares the incident-window mean of the hypothesis's primary metric with
/// the baseline window. A deviation of at least `significant_z` baseline
/// standard deviations supports the hypothesis; less than `normal_z` means
/// the metric behaved normally and refutes it.
pub struct BaselineComparisonStrategy {
    significant_z: f64,
    normal_z: f64,
}

impl BaselineComparisonStrategy {
    pub fn new() -> Self {
        Self {
            significant_z: 3.0,
            normal_z: 1.0,
        }
    }

    pub fn with_thresholds(significant_z: f64, normal_z: f64) -> Self {
        Self {
            significant_z,
            normal_z: normal_z.min(significant_z),
        }
    }

    fn primary_metric(hypothesis: &Hypothesis) -> Option<&str> {
        let metadata = hypothesis.metadata();
        metadata
            .implied_metrics
            .first()
            .or_else(|| metadata.expected_thresholds.first().map(|t| &t.metric))
            .map(String::as_str)
    }
}

impl Default for BaselineComparisonStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisproofStrategy for BaselineComparisonStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BaselineComparison
    }

    fn cost(&self) -> Option<u64> {
        Some(2)
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        let metric = Self::primary_metric(hypothesis).unwrap_or("the implicated metric");
        format!(
            "{metric} deviates from its baseline by at least {} standard deviations",
            self.significant_z
        )
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let Some(metric) = Self::primary_metric(hypothesis) else {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "hypothesis implicates no metric",
            );
        };

        let incident = ctx.incident().clone();
        let current = match ctx.metric_series(metric, &incident.window).await {
            Ok(points) => values(&points),
            Err(e) => return data_unavailable(self.name(), expectation, &e),
        };
        let baseline = match ctx.metric_series(metric, &incident.baseline).await {
            Ok(points) => values(&points),
            Err(e) => return data_unavailable(self.name(), expectation, &e),
        };
        if current.is_empty() || baseline.len() < 2 {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                format!(
                    "insufficient samples: {} in window, {} in baseline",
                    current.len(),
                    baseline.len()
                ),
            );
        }

        let (now, normal) = (mean(&current), mean(&baseline));
        let z = (now - normal).abs() / std_dev(&baseline).max(f64::EPSILON);
        let observed = format!("{metric} mean {now:.3} vs baseline {normal:.3} (z = {z:.2})");
        let source = format!("{}:metric_series({metric})", ctx.source_name());

        if z >= self.significant_z {
            let local = (z / (2.0 * self.significant_z)).min(1.0);
            AttemptReport::survived(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::supporting(source, EvidenceQuality::Corroborated, local, observed),
            )
        } else if z < self.normal_z {
            AttemptReport::failed(self.name(), expectation, observed.clone()).with_evidence(
                Evidence::contradicting(source, EvidenceQuality::Direct, 0.8, observed),
            )
        } else {
            AttemptReport::inconclusive(self.name(), expectation, observed)
        }
    }
}

// ── 7. Correlation Testing ──────────────────────────────────────────────

/// Metrics a single mechanism drives must move together.
///
/// Correlates the first implied metric with each of the others over the
/// incident window. All strongly correlated supports the hypothesis; any
/// pair that is effectively uncorrelated refutes it.
pub struct CorrelationStrategy {
    strong: f64,
    weak: f64,
    min_samples: usize,
}

impl CorrelationStrategy {
    pub fn new() -> Self {
        Self {
            strong: 0.6,
            weak: 0.2,
            min_samples: 3,
        }
    }
}

impl Default for CorrelationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisproofStrategy for CorrelationStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CorrelationTesting
    }

    fn cost(&self) -> Option<u64> {
        Some(2)
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        let metrics = &hypothesis.metadata().implied_metrics;
        format!(
            "[{}] move together with |r| >= {} during the incident window",
            metrics.join(", "),
            self.strong
        )
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let metrics = &hypothesis.metadata().implied_metrics;
        if metrics.len() < 2 {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "fewer than two implied metrics to correlate",
            );
        }

        let window = ctx.incident().window.clone();
        let mut series = Vec::with_capacity(metrics.len());
        for metric in metrics {
            match ctx.metric_series(metric, &window).await {
                Ok(points) => series.push(points),
                Err(e) => return data_unavailable(self.name(), expectation, &e),
            }
        }

        let lead = &metrics[0];
        let mut coefficients = Vec::new();
        for (metric, points) in metrics.iter().zip(&series).skip(1) {
            let pairs = align(&series[0], points);
            if pairs.len() < self.min_samples {
                return AttemptReport::inconclusive(
                    self.name(),
                    expectation,
                    format!("only {} aligned samples for {lead} and {metric}", pairs.len()),
                );
            }
            let Some(r) = pearson(&pairs) else {
                return AttemptReport::inconclusive(
                    self.name(),
                    expectation,
                    format!("{lead} or {metric} is flat; correlation undefined"),
                );
            };
            coefficients.push((metric, r));
        }

        let source = format!("{}:metric_series", ctx.source_name());
        let observed = coefficients
            .iter()
            .map(|(m, r)| format!("r({lead}, {m}) = {r:.2}"))
            .collect::<Vec<_>>()
            .join("; ");

        let uncorrelated: Vec<_> = coefficients.iter().filter(|(_, r)| r.abs() < self.weak).collect();
        if !uncorrelated.is_empty() {
            let evidence = uncorrelated.iter().map(|(m, r)| {
                Evidence::contradicting(
                    source.clone(),
                    EvidenceQuality::Indirect,
                    1.0 - r.abs(),
                    format!("{lead} and {m} are uncorrelated (r = {r:.2})"),
                )
            });
            return AttemptReport::failed(self.name(), expectation, observed)
                .with_all_evidence(evidence);
        }
        if coefficients.iter().all(|(_, r)| r.abs() >= self.strong) {
            let weakest = coefficients
                .iter()
                .map(|(_, r)| r.abs())
                .fold(1.0, f64::min);
            return AttemptReport::survived(self.name(), expectation, observed.clone())
                .with_evidence(Evidence::supporting(
                    source,
                    EvidenceQuality::Corroborated,
                    weakest,
                    observed,
                ));
        }
        AttemptReport::inconclusive(self.name(), expectation, observed)
    }
}

// ── 8. Similar Incident Comparison ──────────────────────────────────────

/// Past incidents that looked like this one had confirmed causes.
///
/// A close match with the same mechanism lends weak support. Close matches
/// caused by something else are noted as weak contradicting evidence. History
/// alone never refutes a hypothesis.
pub struct SimilarIncidentStrategy {
    min_similarity: f64,
    limit: usize,
}

impl SimilarIncidentStrategy {
    pub fn new() -> Self {
        Self {
            min_similarity: 0.7,
            limit: 5,
        }
    }

    pub fn with_min_similarity(min_similarity: f64) -> Self {
        Self {
            min_similarity: min_similarity.clamp(0.0, 1.0),
            ..Self::new()
        }
    }
}

impl Default for SimilarIncidentStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisproofStrategy for SimilarIncidentStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SimilarIncidentComparison
    }

    fn expectation(&self, hypothesis: &Hypothesis) -> String {
        let mechanism = hypothesis
            .metadata()
            .suspected_mechanism
            .as_deref()
            .unwrap_or("the suspected mechanism");
        format!(
            "past incidents with similarity >= {} were caused by {mechanism}",
            self.min_similarity
        )
    }

    async fn attempt(&self, hypothesis: &Hypothesis, ctx: &QueryContext) -> AttemptReport {
        let expectation = self.expectation(hypothesis);
        let Some(mechanism) = hypothesis.metadata().suspected_mechanism.as_deref() else {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                "hypothesis names no mechanism",
            );
        };

        let incidents = match ctx.similar_incidents(mechanism, self.limit).await {
            Ok(incidents) => incidents,
            Err(e) => return data_unavailable(self.name(), expectation, &e),
        };
        let close: Vec<_> = incidents
            .iter()
            .filter(|i| i.similarity >= self.min_similarity)
            .collect();
        let (same, other): (Vec<_>, Vec<_>) = close
            .into_iter()
            .partition(|i| i.mechanism.eq_ignore_ascii_case(mechanism));

        let source = format!("{}:similar_incidents({mechanism})", ctx.source_name());
        if let Some(best) = same
            .iter()
            .max_by(|a, b| a.similarity.total_cmp(&b.similarity))
        {
            let observed = format!(
                "{} close match(es) share the mechanism; best {} at {:.2}",
                same.len(),
                best.id,
                best.similarity
            );
            return AttemptReport::survived(self.name(), expectation, observed.clone())
                .with_evidence(Evidence::supporting(
                    source,
                    EvidenceQuality::Suggestive,
                    best.similarity.clamp(0.0, 1.0),
                    observed,
                ));
        }

        if other.is_empty() {
            return AttemptReport::inconclusive(
                self.name(),
                expectation,
                format!("no past incident above similarity {}", self.min_similarity),
            );
        }
        let observed = format!(
            "close matches had other causes: {}",
            other
                .iter()
                .map(|i| format!("{} ({})", i.id, i.mechanism))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let evidence = other.iter().take(3).map(|i| {
            Evidence::contradicting(
                source.clone(),
                EvidenceQuality::Weak,
                i.similarity.clamp(0.0, 1.0),
                format!("{} at {:.2} was caused by {}", i.id, i.similarity, i.mechanism),
            )
        });
        AttemptReport::inconclusive(self.name(), expectation, observed).with_all_evidence(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use sleuth_types::{AttemptOutcome, HypothesisMetadata};

    use crate::query::{
        FixtureSource, IncidentContext, PastIncident, QueryRequest, QueryResponse, TimeWindow,
    };
    use crate::strategy::check_contract;

    fn onset() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn incident() -> IncidentContext {
        IncidentContext::new("INC-9", onset())
    }

    fn series(window: &TimeWindow, vals: &[f64]) -> QueryResponse {
        QueryResponse::Series(
            vals.iter()
                .enumerate()
                .map(|(i, v)| MetricPoint {
                    at: window.start + chrono::Duration::minutes(i as i64),
                    value: *v,
                })
                .collect(),
        )
    }

    fn metric_request(metric: &str, window: &TimeWindow) -> QueryRequest {
        QueryRequest::MetricSeries {
            metric: metric.into(),
            window: window.clone(),
        }
    }

    fn hypothesis(metadata: HypothesisMetadata) -> Hypothesis {
        Hypothesis::new("metrics-agent", "connection pool saturation", 0.5)
            .unwrap()
            .with_metadata(metadata)
    }

    async fn run(strategy: &dyn DisproofStrategy, h: &Hypothesis, source: FixtureSource) -> AttemptReport {
        let ctx = QueryContext::new(Arc::new(source), incident(), Duration::from_secs(1));
        let report = strategy.attempt(h, &ctx).await;
        check_contract(strategy.name(), &strategy.expectation(h), &report).unwrap();
        report
    }

    fn threshold(metric: &str, threshold: f64, direction: ThresholdDirection) -> HypothesisMetadata {
        HypothesisMetadata {
            expected_thresholds: vec![MetricExpectation {
                metric: metric.into(),
                threshold,
                direction,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn threshold_crossed_survives() {
        let w = incident().window;
        let h = hypothesis(threshold("db.pool.wait_ms", 500.0, ThresholdDirection::Above));
        let source = FixtureSource::new("prom")
            .respond(metric_request("db.pool.wait_ms", &w), series(&w, &[20.0, 900.0, 40.0]));
        let report = run(&MetricThresholdStrategy, &h, source).await;
        assert_eq!(report.outcome, AttemptOutcome::Survived);
        assert_eq!(report.evidence[0].quality, EvidenceQuality::Direct);
    }

    #[tokio::test]
    async fn threshold_not_crossed_fails() {
        let w = incident().window;
        let h = hypothesis(threshold("cache.hit_ratio", 0.5, ThresholdDirection::Below));
        let source = FixtureSource::new("prom")
            .respond(metric_request("cache.hit_ratio", &w), series(&w, &[0.93, 0.91, 0.95]));
        let report = run(&MetricThresholdStrategy, &h, source).await;
        assert_eq!(report.outcome, AttemptOutcome::Failed);
        assert!(!report.evidence[0].supports);
    }

    #[tokio::test]
    async fn threshold_without_samples_is_inconclusive() {
        let w = incident().window;
        let h = hypothesis(threshold("cpu", 0.9, ThresholdDirection::Above));
        let source = FixtureSource::new("prom").respond(metric_request("cpu", &w), series(&w, &[]));
        let report = run(&MetricThresholdStrategy, &h, source).await;
        assert_eq!(report.outcome, AttemptOutcome::Inconclusive);
    }

    fn baseline_source(metric: &str, now: &[f64], before: &[f64]) -> FixtureSource {
        let ctx = incident();
        FixtureSource::new("prom")
            .respond(metric_request(metric, &ctx.window), series(&ctx.window, now))
            .respond(metric_request(metric, &ctx.baseline), series(&ctx.baseline, before))
    }

    fn implying(metrics: &[&str]) -> Hypothesis {
        hypothesis(HypothesisMetadata {
            implied_metrics: metrics.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn large_deviation_from_baseline_survives() {
        let source = baseline_source("latency", &[480.0, 510.0, 495.0], &[100.0, 104.0, 98.0, 102.0]);
        let report = run(&BaselineComparisonStrategy::new(), &implying(&["latency"]), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Survived);
        assert!(report.evidence[0].local_confidence <= 1.0);
    }

    #[tokio::test]
    async fn normal_metric_fails_baseline() {
        let source = baseline_source("latency", &[101.0, 99.0, 100.0], &[100.0, 104.0, 96.0, 102.0]);
        let report = run(&BaselineComparisonStrategy::new(), &implying(&["latency"]), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Failed);
    }

    #[tokio::test]
    async fn short_baseline_is_inconclusive() {
        let source = baseline_source("latency", &[400.0], &[100.0]);
        let report = run(&BaselineComparisonStrategy::new(), &implying(&["latency"]), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Inconclusive);
    }

    fn correlation_source(a: &[f64], b: &[f64]) -> FixtureSource {
        let w = incident().window;
        FixtureSource::new("prom")
            .respond(metric_request("errors", &w), series(&w, a))
            .respond(metric_request("latency", &w), series(&w, b))
    }

    #[tokio::test]
    async fn correlated_metrics_survive() {
        let source = correlation_source(&[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0, 21.0, 29.0, 41.0, 50.0]);
        let report = run(&CorrelationStrategy::new(), &implying(&["errors", "latency"]), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Survived);
    }

    #[tokio::test]
    async fn uncorrelated_metrics_fail() {
        let source = correlation_source(&[1.0, 2.0, 3.0, 4.0, 5.0], &[5.0, 1.0, 5.0, 1.0, 3.0]);
        let report = run(&CorrelationStrategy::new(), &implying(&["errors", "latency"]), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Failed);
    }

    #[tokio::test]
    async fn flat_metric_is_inconclusive() {
        let source = correlation_source(&[1.0, 2.0, 3.0], &[7.0, 7.0, 7.0]);
        let report = run(&CorrelationStrategy::new(), &implying(&["errors", "latency"]), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Inconclusive);
    }

    fn history(incidents: Vec<PastIncident>) -> FixtureSource {
        FixtureSource::new("history").respond(
            QueryRequest::SimilarIncidents {
                mechanism: "pool exhaustion".into(),
                limit: 5,
            },
            QueryResponse::Incidents(incidents),
        )
    }

    fn past(id: &str, mechanism: &str, similarity: f64) -> PastIncident {
        PastIncident {
            id: id.into(),
            mechanism: mechanism.into(),
            similarity,
        }
    }

    fn with_mechanism() -> Hypothesis {
        hypothesis(HypothesisMetadata {
            suspected_mechanism: Some("pool exhaustion".into()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn matching_history_survives() {
        let source = history(vec![past("INC-1", "Pool Exhaustion", 0.82), past("INC-2", "dns", 0.4)]);
        let report = run(&SimilarIncidentStrategy::new(), &with_mechanism(), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Survived);
        assert_eq!(report.evidence[0].quality, EvidenceQuality::Suggestive);
    }

    #[tokio::test]
    async fn contrary_history_never_fails() {
        let source = history(vec![past("INC-3", "bad config", 0.9)]);
        let report = run(&SimilarIncidentStrategy::new(), &with_mechanism(), source).await;
        assert_eq!(report.outcome, AttemptOutcome::Inconclusive);
        assert_eq!(report.evidence[0].quality, EvidenceQuality::Weak);
    }

    #[test]
    fn pearson_of_linear_series_is_one() {
        let pairs: Vec<_> = (0..10).map(|i| (i as f64, 3.0 * i as f64 + 1.0)).collect();
        assert!((pearson(&pairs).unwrap() - 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn pearson_stays_in_range(pairs in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 3..40)) {
            if let Some(r) = pearson(&pairs) {
                prop_assert!((-1.0..=1.0).contains(&r));
            }
        }
    }
}
