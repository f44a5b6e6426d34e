mod config;
mod context_manager;
mod diagnostics;
mod events;
mod metrics;
mod metrics_aggregator;
mod poller;
mod scheduler;
mod toggle_store;

pub use config::{
    ClientOptions, ClientOptionsBuilder, DEFAULT_APP_NAME, DEFAULT_FLAGS_PATH,
    DEFAULT_INSTANCE_ID, DEFAULT_METRICS_INTERVAL, DEFAULT_METRICS_PATH,
    DEFAULT_REFRESH_INTERVAL,
};
pub use context_manager::ContextManager;
pub use diagnostics::{Reporter, TracingReporter};
pub use events::{ClientEvent, EventCallback, EventKind, EventRegistry};
pub use metrics::{wire_timestamp, FlagMetric, MetricsBucket, MetricsPayload, TIMESTAMP_FORMAT};
pub use metrics_aggregator::{MetricsAggregator, MetricsConfig};
pub use poller::{Completion, Poller, PollerSignals, UpdateCallback};
pub use scheduler::{IntervalTask, ScheduledTask, TickAction};
pub use toggle_store::ToggleStore;
