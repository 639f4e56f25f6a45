//! Data-source boundary.
//!
//! Strategies read incident data through an injected [`DataSource`]. The
//! transport behind it is irrelevant here; the contract is
//! `query(request) -> response | error`, with timeouts applied by
//! [`QueryContext`].

mod fixture;

pub use fixture::{FixtureReply, FixtureRecord, FixtureSource};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{QueryError, QueryResult};

// ── Requests and Responses ──────────────────────────────────────────────

/// Closed time interval.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of `before` ahead of and `after` behind `at`.
    pub fn around(at: DateTime<Utc>, before: chrono::Duration, after: chrono::Duration) -> Self {
        Self::new(at - before, at + after)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// A query a strategy can issue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryRequest {
    /// When `subject` (a change, component event or symptom) first occurred.
    EventTime { subject: String },
    /// Systems actually affected by the incident.
    AffectedScope { incident_id: String },
    /// Samples of `metric` within `window`.
    MetricSeries { metric: String, window: TimeWindow },
    /// Transitive upstream dependencies of `system`.
    Dependencies { system: String },
    /// Changes (deploys, config edits, failovers) within `window`.
    ChangeEvents { window: TimeWindow },
    /// Past incidents resembling `mechanism`.
    SimilarIncidents { mechanism: String, limit: usize },
}

impl QueryRequest {
    /// Short label used in audit steps.
    pub fn label(&self) -> String {
        match self {
            Self::EventTime { subject } => format!("event_time({subject})"),
            Self::AffectedScope { incident_id } => format!("affected_scope({incident_id})"),
            Self::MetricSeries { metric, .. } => format!("metric_series({metric})"),
            Self::Dependencies { system } => format!("dependencies({system})"),
            Self::ChangeEvents { .. } => "change_events".to_string(),
            Self::SimilarIncidents { mechanism, .. } => format!("similar_incidents({mechanism})"),
        }
    }
}

/// One metric sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// A recorded change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub system: String,
    pub description: String,
    pub at: DateTime<Utc>,
}

/// A past incident with its confirmed root-cause mechanism.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PastIncident {
    pub id: String,
    pub mechanism: String,
    /// Similarity to the current incident (0.0 to 1.0).
    pub similarity: f64,
}

/// Answer to a [`QueryRequest`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryResponse {
    Timestamp(DateTime<Utc>),
    Systems(Vec<String>),
    Series(Vec<MetricPoint>),
    Changes(Vec<ChangeEvent>),
    Incidents(Vec<PastIncident>),
}

impl QueryResponse {
    fn kind(&self) -> &'static str {
        match self {
            Self::Timestamp(_) => "timestamp",
            Self::Systems(_) => "systems",
            Self::Series(_) => "series",
            Self::Changes(_) => "changes",
            Self::Incidents(_) => "incidents",
        }
    }
}

// ── Data Source ─────────────────────────────────────────────────────────

/// Injected query interface (metrics, logs, traces, CMDB, incident history).
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Name used in audit steps and error messages.
    fn name(&self) -> &str;

    /// Answer a query. Implementations need not enforce timeouts.
    async fn query(&self, request: &QueryRequest) -> QueryResult<QueryResponse>;
}

// ── Incident Context ────────────────────────────────────────────────────

/// The incident under investigation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncidentContext {
    pub incident_id: String,
    /// When the symptom was first detected.
    pub onset: DateTime<Utc>,
    /// Window the incident is examined in.
    pub window: TimeWindow,
    /// Comparable window of normal operation.
    pub baseline: TimeWindow,
}

impl IncidentContext {
    /// Context with a one-hour window around `onset` and the same window one
    /// day earlier as baseline.
    pub fn new(incident_id: impl Into<String>, onset: DateTime<Utc>) -> Self {
        let window = TimeWindow::around(
            onset,
            chrono::Duration::minutes(30),
            chrono::Duration::minutes(30),
        );
        let day = chrono::Duration::days(1);
        let baseline = TimeWindow::new(window.start - day, window.end - day);
        Self {
            incident_id: incident_id.into(),
            onset,
            window,
            baseline,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_baseline(mut self, baseline: TimeWindow) -> Self {
        self.baseline = baseline;
        self
    }
}

// ── Query Context ───────────────────────────────────────────────────────

/// Per-attempt access to the data source.
///
/// Applies the per-query timeout and records every query issued, so audit
/// steps list the data touched independently of what the strategy reports.
pub struct QueryContext {
    source: Arc<dyn DataSource>,
    incident: IncidentContext,
    timeout: Duration,
    touched: Mutex<Vec<String>>,
}

impl QueryContext {
    pub fn new(source: Arc<dyn DataSource>, incident: IncidentContext, timeout: Duration) -> Self {
        Self {
            source,
            incident,
            timeout,
            touched: Mutex::new(Vec::new()),
        }
    }

    pub fn incident(&self) -> &IncidentContext {
        &self.incident
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Issue a query, bounded by the configured timeout.
    #[instrument(skip(self), fields(source = %self.source.name(), query = %request.label()))]
    pub async fn query(&self, request: QueryRequest) -> QueryResult<QueryResponse> {
        let label = format!("{}:{}", self.source.name(), request.label());
        {
            let mut touched = self.touched.lock();
            if !touched.contains(&label) {
                touched.push(label);
            }
        }

        match tokio::time::timeout(self.timeout, self.source.query(&request)).await {
            Ok(Ok(response)) => {
                debug!(kind = response.kind(), "Query answered");
                Ok(response)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Query failed");
                Err(e)
            }
            Err(_) => {
                let e = QueryError::Timeout {
                    source_name: self.source.name().to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                };
                warn!(error = %e, "Query timed out");
                Err(e)
            }
        }
    }

    /// Data sources touched so far, in first-use order.
    pub fn touched_sources(&self) -> Vec<String> {
        self.touched.lock().clone()
    }

    pub(crate) fn malformed(&self, expected: &str, got: &QueryResponse) -> QueryError {
        QueryError::Malformed {
            source_name: self.source.name().to_string(),
            reason: format!("expected {expected}, got {}", got.kind()),
        }
    }

    pub async fn event_time(&self, subject: &str) -> QueryResult<DateTime<Utc>> {
        match self
            .query(QueryRequest::EventTime {
                subject: subject.to_string(),
            })
            .await?
        {
            QueryResponse::Timestamp(at) => Ok(at),
            other => Err(self.malformed("timestamp", &other)),
        }
    }

    pub async fn affected_scope(&self) -> QueryResult<Vec<String>> {
        match self
            .query(QueryRequest::AffectedScope {
                incident_id: self.incident.incident_id.clone(),
            })
            .await?
        {
            QueryResponse::Systems(systems) => Ok(systems),
            other => Err(self.malformed("systems", &other)),
        }
    }

    pub async fn metric_series(&self, metric: &str, window: &TimeWindow) -> QueryResult<Vec<MetricPoint>> {
        match self
            .query(QueryRequest::MetricSeries {
                metric: metric.to_string(),
                window: window.clone(),
            })
            .await?
        {
            QueryResponse::Series(points) => Ok(points),
            other => Err(self.malformed("series", &other)),
        }
    }

    pub async fn dependencies(&self, system: &str) -> QueryResult<Vec<String>> {
        match self
            .query(QueryRequest::Dependencies {
                system: system.to_string(),
            })
            .await?
        {
            QueryResponse::Systems(systems) => Ok(systems),
            other => Err(self.malformed("systems", &other)),
        }
    }

    pub async fn change_events(&self, window: &TimeWindow) -> QueryResult<Vec<ChangeEvent>> {
        match self
            .query(QueryRequest::ChangeEvents {
                window: window.clone(),
            })
            .await?
        {
            QueryResponse::Changes(changes) => Ok(changes),
            other => Err(self.malformed("changes", &other)),
        }
    }

    pub async fn similar_incidents(&self, mechanism: &str, limit: usize) -> QueryResult<Vec<PastIncident>> {
        match self
            .query(QueryRequest::SimilarIncidents {
                mechanism: mechanism.to_string(),
                limit,
            })
            .await?
        {
            QueryResponse::Incidents(incidents) => Ok(incidents),
            other => Err(self.malformed("incidents", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onset() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn incident_windows() {
        let ctx = IncidentContext::new("INC-1", onset());
        assert!(ctx.window.contains(onset()));
        assert_eq!(ctx.window.end - ctx.window.start, chrono::Duration::hours(1));
        assert_eq!(ctx.window.start - ctx.baseline.start, chrono::Duration::days(1));
        assert!(!ctx.baseline.contains(onset()));
    }

    #[test]
    fn request_serializes_with_kind_tag() {
        let json = serde_json::to_value(QueryRequest::Dependencies {
            system: "checkout".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "dependencies");
        assert_eq!(json["system"], "checkout");
    }

    #[test]
    fn labels_name_the_subject() {
        let request = QueryRequest::EventTime {
            subject: "deploy-42".into(),
        };
        assert_eq!(request.label(), "event_time(deploy-42)");
    }

    #[tokio::test]
    async fn context_records_touched_sources_once() {
        let source = FixtureSource::new("fixture").respond(
            QueryRequest::EventTime {
                subject: "deploy".into(),
            },
            QueryResponse::Timestamp(onset()),
        );
        let ctx = QueryContext::new(
            Arc::new(source),
            IncidentContext::new("INC-1", onset()),
            Duration::from_secs(1),
        );
        assert_eq!(ctx.event_time("deploy").await.unwrap(), onset());
        assert_eq!(ctx.event_time("deploy").await.unwrap(), onset());
        assert!(ctx.event_time("rollback").await.is_err());
        assert_eq!(
            ctx.touched_sources(),
            vec![
                "fixture:event_time(deploy)".to_string(),
                "fixture:event_time(rollback)".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn wrong_response_kind_is_malformed() {
        let source = FixtureSource::new("fixture").respond(
            QueryRequest::Dependencies {
                system: "api".into(),
            },
            QueryResponse::Timestamp(onset()),
        );
        let ctx = QueryContext::new(
            Arc::new(source),
            IncidentContext::new("INC-1", onset()),
            Duration::from_secs(1),
        );
        let err = ctx.dependencies("api").await.unwrap_err();
        assert!(matches!(err, QueryError::Malformed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_source_times_out() {
        let source = FixtureSource::new("slow").hang(QueryRequest::EventTime {
            subject: "deploy".into(),
        });
        let ctx = QueryContext::new(
            Arc::new(source),
            IncidentContext::new("INC-1", onset()),
            Duration::from_millis(250),
        );
        let err = ctx.event_time("deploy").await.unwrap_err();
        assert_eq!(
            err,
            QueryError::Timeout {
                source_name: "slow".into(),
                timeout_ms: 250
            }
        );
    }
}
