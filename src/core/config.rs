use std::time::Duration;

use crate::error::{ErrorCode, Result, UnleashError};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_APP_NAME: &str = "rustApp";
pub const DEFAULT_INSTANCE_ID: &str = "rustApp";
pub const DEFAULT_FLAGS_PATH: &str = "/proxy";
pub const DEFAULT_METRICS_PATH: &str = "/client/metrics";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    pub api_key: String,
    pub app_name: Option<String>,
    pub environment: Option<String>,
    pub instance_id: String,
    pub refresh_interval: Duration,
    pub metrics_interval: Duration,
    pub metrics_enabled: bool,
    pub flags_path: String,
    pub metrics_path: String,
    /// Per-request timeout. `None` lets a hung request run until the peer gives up.
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        ClientOptionsBuilder::new(url, api_key).build()
    }

    pub fn builder(url: impl Into<String>, api_key: impl Into<String>) -> ClientOptionsBuilder {
        ClientOptionsBuilder::new(url, api_key)
    }

    /// Application name reported with metrics.
    pub fn metrics_app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    /// Checks the settings that would make the background tasks misbehave.
    ///
    /// The URL is deliberately not checked here: a bad URL is reported each
    /// time a request is attempted and never stops the client from being built.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(UnleashError::config_error(
                ErrorCode::ConfigMissingApiKey,
                "API key is required",
            ));
        }

        if self.refresh_interval.is_zero() {
            return Err(UnleashError::config_error(
                ErrorCode::ConfigInvalidInterval,
                "Refresh interval must be positive",
            ));
        }

        if self.metrics_interval.is_zero() {
            return Err(UnleashError::config_error(
                ErrorCode::ConfigInvalidInterval,
                "Metrics interval must be positive",
            ));
        }

        if matches!(self.timeout, Some(t) if t.is_zero()) {
            return Err(UnleashError::config_error(
                ErrorCode::ConfigInvalidTimeout,
                "Timeout must be positive",
            ));
        }

        Ok(())
    }
}

pub struct ClientOptionsBuilder {
    url: String,
    api_key: String,
    app_name: Option<String>,
    environment: Option<String>,
    instance_id: String,
    refresh_interval: Duration,
    metrics_interval: Duration,
    metrics_enabled: bool,
    flags_path: String,
    metrics_path: String,
    timeout: Option<Duration>,
}

impl ClientOptionsBuilder {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            app_name: None,
            environment: None,
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            metrics_interval: DEFAULT_METRICS_INTERVAL,
            metrics_enabled: true,
            flags_path: DEFAULT_FLAGS_PATH.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            timeout: None,
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval;
        self
    }

    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn flags_path(mut self, path: impl Into<String>) -> Self {
        self.flags_path = path.into();
        self
    }

    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ClientOptions {
        ClientOptions {
            url: self.url,
            api_key: self.api_key,
            app_name: self.app_name,
            environment: self.environment,
            instance_id: self.instance_id,
            refresh_interval: self.refresh_interval,
            metrics_interval: self.metrics_interval,
            metrics_enabled: self.metrics_enabled,
            flags_path: self.flags_path,
            metrics_path: self.metrics_path,
            timeout: self.timeout,
        }
    }
}
