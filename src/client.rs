use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::core::{
    ClientEvent, ClientOptions, Completion, ContextManager, EventKind, EventRegistry,
    MetricsAggregator, MetricsBucket, MetricsConfig, Poller, Reporter, TracingReporter,
};
use crate::error::{ErrorCode, Result, UnleashError};
use crate::http::{endpoint_url, HttpClient, MetricsSender, ToggleFetcher};
use crate::types::{EvaluationContext, Toggle, ToggleTable, Variant};

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs like [`TracingReporter`] and also fans failures out as `Error` events
/// and to the caller's reporter, if one was given.
struct ClientReporter {
    log: TracingReporter,
    events: Arc<EventRegistry>,
    sink: Option<Arc<dyn Reporter>>,
}

impl Reporter for ClientReporter {
    fn report(&self, error: &UnleashError) {
        self.log.report(error);
        if let Some(ref sink) = self.sink {
            sink.report(error);
        }
        self.events.emit(&ClientEvent::from(error));
    }

    fn note(&self, message: &str) {
        self.log.note(message);
        if let Some(ref sink) = self.sink {
            sink.note(message);
        }
    }
}

#[derive(Default)]
struct RunState {
    /// Bumped on every start so a stale ready hand-off can tell it lost.
    generation: u64,
    active: bool,
    ready_task: Option<JoinHandle<()>>,
}

/// Feature toggle client for the proxy / frontend API.
///
/// Lookups are served from the last fetched table and never wait on the
/// network. Usage metrics are counted by [`get_variant`](Self::get_variant)
/// and flushed in the background once the first fetch has succeeded.
pub struct UnleashClient {
    options: ClientOptions,
    context: ContextManager,
    poller: Poller,
    metrics: Option<Arc<MetricsAggregator>>,
    events: Arc<EventRegistry>,
    reporter: Arc<ClientReporter>,
    /// Runtime the client was built on, used when `start` is called off it.
    runtime: Option<Handle>,
    run: Arc<Mutex<RunState>>,
}

impl UnleashClient {
    /// Build a client that talks HTTP to `options.url`.
    pub fn new(options: ClientOptions) -> Result<Self> {
        options.validate()?;
        let http = Arc::new(HttpClient::new(&options)?);
        Self::with_transport(options, Arc::clone(&http) as Arc<dyn ToggleFetcher>, http)
    }

    /// Build a client on custom transports.
    pub fn with_transport(
        options: ClientOptions,
        fetcher: Arc<dyn ToggleFetcher>,
        sender: Arc<dyn MetricsSender>,
    ) -> Result<Self> {
        Self::build(options, fetcher, sender, None)
    }

    /// Like [`with_transport`](Self::with_transport), also handing every
    /// background failure and status note to `reporter`.
    pub fn with_reporter(
        options: ClientOptions,
        fetcher: Arc<dyn ToggleFetcher>,
        sender: Arc<dyn MetricsSender>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        Self::build(options, fetcher, sender, Some(reporter))
    }

    fn build(
        options: ClientOptions,
        fetcher: Arc<dyn ToggleFetcher>,
        sender: Arc<dyn MetricsSender>,
        sink: Option<Arc<dyn Reporter>>,
    ) -> Result<Self> {
        options.validate()?;

        let events = Arc::new(EventRegistry::new());
        let reporter = Arc::new(ClientReporter {
            log: TracingReporter::default(),
            events: Arc::clone(&events),
            sink,
        });

        if let Err(e) = endpoint_url(&options.url, &options.flags_path) {
            reporter.report(&e);
        }

        let poller = Poller::new(
            options.refresh_interval,
            fetcher,
            Arc::clone(&reporter) as Arc<dyn Reporter>,
        );
        let update_events = Arc::clone(&events);
        poller.set_update_callback(Arc::new(move || {
            update_events.emit(&ClientEvent::Update);
        }));

        let metrics = options.metrics_enabled.then(|| {
            Arc::new(MetricsAggregator::new(
                MetricsConfig::from_options(&options),
                sender,
                Arc::clone(&reporter) as Arc<dyn Reporter>,
            ))
        });

        let context = ContextManager::new(options.app_name.clone(), options.environment.clone());

        tracing::debug!(
            "Unleash client v{} created for {} (metrics {})",
            SDK_VERSION,
            options.url,
            if metrics.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            options,
            context,
            poller,
            metrics,
            events,
            reporter,
            runtime: Handle::try_current().ok(),
            run: Arc::new(Mutex::new(RunState::default())),
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Start polling with the current context.
    ///
    /// Background work runs on the calling Tokio runtime, or on the one the
    /// client was built on when called from elsewhere. With neither, the
    /// returned [`Completion`] fails with `RUNTIME_UNAVAILABLE`.
    ///
    /// The returned [`Completion`] resolves with the outcome of the first
    /// fetch. Metrics collection starts after the first successful fetch,
    /// which may come on a later tick if the first one fails. `verbose`
    /// raises reported failures from `debug` to `warn`.
    pub fn start(&self, verbose: bool) -> Completion {
        self.reporter.log.set_verbose(verbose);
        self.start_with(self.context.current())
    }

    /// Stop polling and metrics. Safe to call repeatedly or before `start`.
    pub fn stop(&self) {
        let mut run = self.run.lock();
        self.stop_locked(&mut run);
    }

    /// Replace the context with `appName`/`environment` plus `fragment`,
    /// then restart. The unsent metrics bucket is discarded.
    pub fn update_context<I, K, V>(&self, fragment: I) -> Completion
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let context = self.context.update(fragment);
        self.start_with(context)
    }

    /// `false` for unknown flags. Not counted in metrics.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.poller
            .lookup(name)
            .map(|toggle| toggle.enabled)
            .unwrap_or(false)
    }

    /// Variant of `name`, or the `disabled` variant for unknown flags.
    ///
    /// Counts one evaluation for the flag in the active metrics bucket.
    pub fn get_variant(&self, name: &str) -> Variant {
        let toggle = self.poller.lookup(name);
        let enabled = toggle.as_ref().map(|t| t.enabled).unwrap_or(false);

        if let Some(ref metrics) = self.metrics {
            metrics.record_evaluation(name, enabled);
        }

        toggle.map(|t| t.variant).unwrap_or_default()
    }

    pub fn get_toggle(&self, name: &str) -> Option<Toggle> {
        self.poller.lookup(name)
    }

    /// Snapshot of the current toggle table.
    pub fn all_toggles(&self) -> Arc<ToggleTable> {
        self.poller.toggles()
    }

    /// Context used for the next fetch.
    pub fn context(&self) -> EvaluationContext {
        self.context.current()
    }

    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, Arc::new(callback));
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().active
    }

    /// Copy of the metrics bucket being filled, if metrics are collecting.
    pub fn metrics_bucket(&self) -> Option<MetricsBucket> {
        self.metrics.as_ref().and_then(|m| m.active_bucket())
    }

    /// Send the active metrics bucket now.
    pub fn flush_metrics(&self) -> Option<JoinHandle<()>> {
        self.metrics.as_ref().and_then(|m| m.flush())
    }

    fn start_with(&self, context: EvaluationContext) -> Completion {
        let mut run = self.run.lock();
        self.stop_locked(&mut run);

        let runtime = match Handle::try_current().ok().or_else(|| self.runtime.clone()) {
            Some(runtime) => runtime,
            None => {
                let error = UnleashError::new(
                    ErrorCode::RuntimeUnavailable,
                    "No Tokio runtime available to run the client",
                );
                self.reporter.report(&error);
                return Completion::failed(error);
            }
        };

        run.generation += 1;
        run.active = true;
        let generation = run.generation;

        let signals = self.poller.start(&runtime, context);

        let ready = signals.ready;
        let metrics = self.metrics.clone();
        let events = Arc::clone(&self.events);
        let state = Arc::clone(&self.run);
        let metrics_runtime = runtime.clone();
        run.ready_task = Some(runtime.spawn(async move {
            if ready.await.is_err() {
                return;
            }
            {
                let run = state.lock();
                if !run.active || run.generation != generation {
                    return;
                }
                if let Some(metrics) = metrics {
                    metrics.start(&metrics_runtime);
                }
            }
            events.emit(&ClientEvent::Ready);
        }));

        tracing::debug!("Client started");
        signals.first_fetch
    }

    fn stop_locked(&self, run: &mut RunState) {
        if let Some(task) = run.ready_task.take() {
            task.abort();
        }
        self.poller.stop();
        if let Some(ref metrics) = self.metrics {
            metrics.stop();
        }
        if run.active {
            run.active = false;
            tracing::debug!("Client stopped");
        }
    }
}

impl Drop for UnleashClient {
    fn drop(&mut self) {
        self.stop();
    }
}
