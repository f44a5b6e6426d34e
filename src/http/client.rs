use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode, Url};

use super::transport::{FetchOutcome, MetricsSender, ToggleFetcher};
use crate::core::{ClientOptions, MetricsPayload};
use crate::error::{ErrorCode, Result, UnleashError};
use crate::types::{EvaluationContext, FeatureResponse};

/// Joins the configured base URL and an endpoint path.
pub fn endpoint_url(base_url: &str, path: &str) -> Result<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse(&raw).map_err(|e| UnleashError::invalid_url(&raw, e))
}

/// reqwest-backed transport for the flags and metrics endpoints.
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: String,
    flags_path: String,
    metrics_path: String,
}

impl HttpClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            UnleashError::with_source(ErrorCode::NetworkError, "Failed to create HTTP client", e)
        })?;

        Ok(Self {
            client,
            base_url: options.url.clone(),
            api_key: options.api_key.clone(),
            flags_path: options.flags_path.clone(),
            metrics_path: options.metrics_path.clone(),
        })
    }

    pub fn flags_url(&self, context: &EvaluationContext) -> Result<Url> {
        let mut url = endpoint_url(&self.base_url, &self.flags_path)?;
        let pairs = context.to_query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub fn metrics_url(&self) -> Result<Url> {
        endpoint_url(&self.base_url, &self.metrics_path)
    }

    async fn error_from_response(&self, response: reqwest::Response) -> UnleashError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        self.status_to_error(status, &body)
    }

    fn status_to_error(&self, status: StatusCode, body: &str) -> UnleashError {
        let (code, category) = match status {
            StatusCode::BAD_REQUEST => (ErrorCode::HttpBadRequest, "Client Error"),
            StatusCode::UNAUTHORIZED => (ErrorCode::HttpUnauthorized, "Authentication Error"),
            StatusCode::FORBIDDEN => (ErrorCode::HttpForbidden, "Authorization Error"),
            StatusCode::NOT_FOUND => (ErrorCode::HttpNotFound, "Not Found"),
            StatusCode::TOO_MANY_REQUESTS => (ErrorCode::HttpRateLimited, "Rate Limited"),
            s if s.is_server_error() => (ErrorCode::HttpServerError, "Server Error"),
            s if s.is_client_error() => (ErrorCode::HttpBadRequest, "Client Error"),
            _ => (ErrorCode::HttpInvalidResponse, "Unexpected Status"),
        };

        UnleashError::network_error(code, format!("{}: {} - {}", category, status.as_u16(), body))
    }

    fn convert_error(&self, error: reqwest::Error) -> UnleashError {
        if error.is_timeout() {
            UnleashError::with_source(ErrorCode::HttpTimeout, "Request timed out", error)
        } else if error.is_connect() {
            UnleashError::with_source(ErrorCode::HttpNetworkError, "Connection failed", error)
        } else {
            UnleashError::with_source(ErrorCode::NetworkError, error.to_string(), error)
        }
    }
}

#[async_trait]
impl ToggleFetcher for HttpClient {
    async fn fetch_toggles(
        &self,
        context: &EvaluationContext,
        etag: Option<&str>,
    ) -> Result<FetchOutcome> {
        let url = self.flags_url(context)?;

        let mut request = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/json")
            .header("Cache", "no-cache");
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await.map_err(|e| self.convert_error(e))?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(self.error_from_response(response).await);
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| {
            UnleashError::with_source(ErrorCode::HttpInvalidResponse, "Failed to read response", e)
        })?;

        let parsed: FeatureResponse = serde_json::from_str(&body).map_err(|e| {
            UnleashError::with_source(
                ErrorCode::HttpInvalidResponse,
                format!("Failed to parse response: {}", e),
                e,
            )
        })?;

        Ok(FetchOutcome::Updated {
            toggles: parsed.toggles,
            etag,
        })
    }
}

#[async_trait]
impl MetricsSender for HttpClient {
    async fn send_metrics(&self, payload: &MetricsPayload) -> Result<()> {
        let url = self.metrics_url()?;

        let body = serde_json::to_vec(payload).map_err(|e| {
            UnleashError::with_source(ErrorCode::MetricsEncodeFailed, "Failed to encode metrics", e)
        })?;

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.convert_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_from_response(response).await)
        }
    }
}
