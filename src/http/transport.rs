use async_trait::async_trait;

use crate::core::MetricsPayload;
use crate::error::Result;
use crate::types::{EvaluationContext, Toggle};

/// Result of a flags request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A full toggle set, plus the validator to send on the next request.
    Updated {
        toggles: Vec<Toggle>,
        etag: Option<String>,
    },
    /// The server answered 304; the current table is still accurate.
    NotModified,
}

/// Fetches the toggle set for a context.
#[async_trait]
pub trait ToggleFetcher: Send + Sync {
    async fn fetch_toggles(
        &self,
        context: &EvaluationContext,
        etag: Option<&str>,
    ) -> Result<FetchOutcome>;
}

/// Delivers one closed metrics bucket.
#[async_trait]
pub trait MetricsSender: Send + Sync {
    async fn send_metrics(&self, payload: &MetricsPayload) -> Result<()>;
}
