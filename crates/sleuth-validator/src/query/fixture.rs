//! In-memory data source backed by recorded answers.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{DataSource, QueryRequest, QueryResponse};
use crate::error::{QueryError, QueryResult};

/// How the fixture answers a recorded request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum FixtureReply {
    /// Answer with `response`, optionally after `delay_ms`.
    Respond {
        response: QueryResponse,
        #[serde(default)]
        delay_ms: u64,
    },
    /// Fail as if the backend were unreachable.
    Fail { reason: String },
    /// Never answer.
    Hang,
}

/// A recorded request and its reply, as stored in scenario files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub request: QueryRequest,
    pub reply: FixtureReply,
}

/// Data source that replays recorded replies. Unknown requests yield
/// [`QueryError::NotFound`].
#[derive(Clone, Debug, Default)]
pub struct FixtureSource {
    name: String,
    replies: HashMap<QueryRequest, FixtureReply>,
}

impl FixtureSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: HashMap::new(),
        }
    }

    /// Build from scenario records. Later records override earlier ones.
    pub fn from_records(name: impl Into<String>, records: impl IntoIterator<Item = FixtureRecord>) -> Self {
        let mut source = Self::new(name);
        for record in records {
            source.replies.insert(record.request, record.reply);
        }
        source
    }

    pub fn respond(self, request: QueryRequest, response: QueryResponse) -> Self {
        self.with_reply(
            request,
            FixtureReply::Respond {
                response,
                delay_ms: 0,
            },
        )
    }

    pub fn respond_after(self, request: QueryRequest, response: QueryResponse, delay: Duration) -> Self {
        self.with_reply(
            request,
            FixtureReply::Respond {
                response,
                delay_ms: delay.as_millis() as u64,
            },
        )
    }

    pub fn fail(self, request: QueryRequest, reason: impl Into<String>) -> Self {
        self.with_reply(
            request,
            FixtureReply::Fail {
                reason: reason.into(),
            },
        )
    }

    pub fn hang(self, request: QueryRequest) -> Self {
        self.with_reply(request, FixtureReply::Hang)
    }

    pub fn with_reply(mut self, request: QueryRequest, reply: FixtureReply) -> Self {
        self.replies.insert(request, reply);
        self
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, request: &QueryRequest) -> QueryResult<QueryResponse> {
        match self.replies.get(request) {
            Some(FixtureReply::Respond { response, delay_ms }) => {
                if *delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
                Ok(response.clone())
            }
            Some(FixtureReply::Fail { reason }) => Err(QueryError::Unavailable {
                source_name: self.name.clone(),
                reason: reason.clone(),
            }),
            Some(FixtureReply::Hang) => futures::future::pending().await,
            None => Err(QueryError::NotFound {
                source_name: self.name.clone(),
                subject: request.label(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_recorded_replies() {
        let request = QueryRequest::Dependencies {
            system: "checkout".into(),
        };
        let source = FixtureSource::new("cmdb")
            .respond(request.clone(), QueryResponse::Systems(vec!["db".into()]))
            .fail(
                QueryRequest::Dependencies {
                    system: "search".into(),
                },
                "connection refused",
            );

        assert_eq!(
            source.query(&request).await.unwrap(),
            QueryResponse::Systems(vec!["db".into()])
        );
        let err = source
            .query(&QueryRequest::Dependencies {
                system: "search".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Unavailable { .. }));
        let err = source
            .query(&QueryRequest::Dependencies {
                system: "billing".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::NotFound { .. }));
    }

    #[test]
    fn records_deserialize_from_scenario_json() {
        let json = r#"[
            {
                "request": { "kind": "dependencies", "system": "checkout" },
                "reply": { "reply": "respond", "response": { "kind": "systems", "data": ["db"] } }
            },
            {
                "request": { "kind": "event_time", "subject": "deploy-7" },
                "reply": { "reply": "hang" }
            }
        ]"#;
        let records: Vec<FixtureRecord> = serde_json::from_str(json).unwrap();
        let source = FixtureSource::from_records("scenario", records);
        assert_eq!(source.len(), 2);
    }
}
