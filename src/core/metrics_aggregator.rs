//! Usage metrics aggregation.
//!
//! Evaluations are counted into the active [`MetricsBucket`]. On every tick
//! the bucket is closed, swapped for a fresh one and sent without waiting
//! for the result.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::config::{ClientOptions, DEFAULT_APP_NAME, DEFAULT_INSTANCE_ID, DEFAULT_METRICS_INTERVAL};
use super::diagnostics::Reporter;
use super::metrics::{MetricsBucket, MetricsPayload};
use super::scheduler::{IntervalTask, ScheduledTask, TickAction};
use crate::http::MetricsSender;

/// Configuration for the metrics aggregator.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub app_name: String,
    pub instance_id: String,
    /// Time between flushes. Default: 15 seconds
    pub interval: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            interval: DEFAULT_METRICS_INTERVAL,
        }
    }
}

impl MetricsConfig {
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            app_name: options.metrics_app_name().to_string(),
            instance_id: options.instance_id.clone(),
            interval: options.metrics_interval,
        }
    }
}

struct Shared {
    app_name: String,
    instance_id: String,
    /// `None` while stopped; evaluations recorded then are dropped.
    bucket: Mutex<Option<MetricsBucket>>,
    /// Runtime the sends are spawned on, set by `start`.
    runtime: Mutex<Option<Handle>>,
    sender: Arc<dyn MetricsSender>,
    reporter: Arc<dyn Reporter>,
}

impl Shared {
    /// Close the active bucket and open its replacement in one critical section.
    fn rotate(&self) -> Option<MetricsBucket> {
        let mut guard = self.bucket.lock();
        let active = guard.as_mut()?;
        let now = Utc::now();
        let mut closed = std::mem::replace(active, MetricsBucket::open(now));
        closed.close(now);
        Some(closed)
    }

    fn flush(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let runtime = self.runtime.lock().clone()?;
        let bucket = self.rotate()?;
        let payload = MetricsPayload {
            app_name: self.app_name.clone(),
            instance_id: self.instance_id.clone(),
            bucket,
        };

        let shared = Arc::clone(self);
        Some(runtime.spawn(async move {
            match shared.sender.send_metrics(&payload).await {
                Ok(()) => tracing::debug!(
                    "Sent metrics for {} toggles",
                    payload.bucket.toggles.len()
                ),
                Err(e) => shared.reporter.report(&e),
            }
        }))
    }
}

/// Batches per-flag evaluation counts and flushes them on a timer.
pub struct MetricsAggregator {
    interval: Duration,
    shared: Arc<Shared>,
    task: Box<dyn ScheduledTask>,
}

impl MetricsAggregator {
    pub fn new(
        config: MetricsConfig,
        sender: Arc<dyn MetricsSender>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self::with_task(config, sender, reporter, Box::new(IntervalTask::new("metrics")))
    }

    /// Build on a caller-supplied timer.
    pub fn with_task(
        config: MetricsConfig,
        sender: Arc<dyn MetricsSender>,
        reporter: Arc<dyn Reporter>,
        task: Box<dyn ScheduledTask>,
    ) -> Self {
        Self {
            interval: config.interval,
            shared: Arc::new(Shared {
                app_name: config.app_name,
                instance_id: config.instance_id,
                bucket: Mutex::new(None),
                runtime: Mutex::new(None),
                sender,
                reporter,
            }),
            task,
        }
    }

    /// Open the first bucket and schedule flushes on `runtime`.
    pub fn start(&self, runtime: &Handle) {
        if self.task.is_running() {
            return;
        }

        *self.shared.runtime.lock() = Some(runtime.clone());
        *self.shared.bucket.lock() = Some(MetricsBucket::open(Utc::now()));

        let shared = Arc::clone(&self.shared);
        let action: TickAction = Arc::new(move || {
            shared.flush();
        });
        self.task.start(runtime, self.interval, action);
    }

    /// Cancel flushes. The partially filled bucket is dropped, not sent.
    pub fn stop(&self) {
        // A tick already past the timer's check finds no bucket to rotate.
        let discarded = self.shared.bucket.lock().take();
        self.task.stop();
        if discarded.is_some() {
            tracing::debug!("Metrics stopped, unsent bucket discarded");
        }
    }

    pub fn record_evaluation(&self, flag_name: &str, enabled: bool) {
        if let Some(bucket) = self.shared.bucket.lock().as_mut() {
            bucket.record(flag_name, enabled);
        }
    }

    /// Flush now instead of waiting for the next tick.
    ///
    /// Returns the handle of the send, or `None` when not started.
    pub fn flush(&self) -> Option<JoinHandle<()>> {
        self.shared.flush()
    }

    /// Copy of the bucket currently collecting evaluations.
    pub fn active_bucket(&self) -> Option<MetricsBucket> {
        self.shared.bucket.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

impl Drop for MetricsAggregator {
    fn drop(&mut self) {
        self.task.stop();
    }
}
