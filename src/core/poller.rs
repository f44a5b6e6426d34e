//! Background polling of the flags endpoint.
//!
//! The poller fetches once on start, then on every tick of its timer, and
//! swaps each fetched toggle set into the [`ToggleStore`]. Each run is tied
//! to a store epoch: stopping bumps the epoch, so a fetch that completes
//! after `stop` returns can no longer write.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::diagnostics::Reporter;
use super::scheduler::{IntervalTask, ScheduledTask, TickAction};
use super::toggle_store::ToggleStore;
use crate::error::{Result, UnleashError};
use crate::http::{FetchOutcome, ToggleFetcher};
use crate::types::{EvaluationContext, Toggle, ToggleTable};

/// Called after a refresh changed the toggle table.
pub type UpdateCallback = Arc<dyn Fn() + Send + Sync>;

/// Outcome of the first fetch of a run.
///
/// Resolves to the fetch result, or to a `ClientStopped` error if the run
/// ended before the fetch finished.
pub struct Completion {
    rx: oneshot::Receiver<Result<()>>,
}

impl Completion {
    fn new(rx: oneshot::Receiver<Result<()>>) -> Self {
        Self { rx }
    }

    /// A completion that has already failed with `error`.
    pub fn failed(error: UnleashError) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(error));
        Self { rx }
    }
}

impl Future for Completion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(UnleashError::stopped())))
    }
}

/// Signals handed out by [`Poller::start`].
pub struct PollerSignals {
    /// Result of the immediate fetch.
    pub first_fetch: Completion,
    /// Fires on the first successful fetch of the run, whichever tick it is.
    pub ready: oneshot::Receiver<()>,
}

struct Run {
    epoch: u64,
    context: EvaluationContext,
    ready_tx: Mutex<Option<oneshot::Sender<()>>>,
}

struct Shared {
    store: ToggleStore,
    fetcher: Arc<dyn ToggleFetcher>,
    reporter: Arc<dyn Reporter>,
    /// Validator from the last applied response, tagged with its epoch.
    etag: Mutex<Option<(u64, String)>>,
    on_update: Mutex<Option<UpdateCallback>>,
}

impl Shared {
    async fn poll(&self, run: &Run, first_tx: Option<oneshot::Sender<Result<()>>>) {
        let result = self.fetch_and_apply(run).await;

        if result.is_ok() {
            if let Some(ready_tx) = run.ready_tx.lock().take() {
                let _ = ready_tx.send(());
            }
        } else if let Err(ref e) = result {
            self.reporter.report(e);
        }

        if let Some(first_tx) = first_tx {
            let _ = first_tx.send(result);
        }
    }

    async fn fetch_and_apply(&self, run: &Run) -> Result<()> {
        let etag = self
            .etag
            .lock()
            .as_ref()
            .filter(|(epoch, _)| *epoch == run.epoch)
            .map(|(_, tag)| tag.clone());

        match self.fetcher.fetch_toggles(&run.context, etag.as_deref()).await? {
            FetchOutcome::NotModified => {
                if self.store.epoch() != run.epoch {
                    return Err(UnleashError::stopped());
                }
                self.reporter.note("No changes in feature toggles.");
                Ok(())
            }
            FetchOutcome::Updated { toggles, etag } => {
                let count = toggles.len();
                let changed = self
                    .store
                    .replace_if_current(run.epoch, toggles)
                    .ok_or_else(UnleashError::stopped)?;

                if let Some(tag) = etag {
                    *self.etag.lock() = Some((run.epoch, tag));
                }

                if changed {
                    self.reporter.note(&format!("Toggles updated ({} toggles)", count));
                    let callback = self.on_update.lock().clone();
                    if let Some(callback) = callback {
                        callback();
                    }
                }
                Ok(())
            }
        }
    }
}

/// Keeps the [`ToggleStore`] fresh for one evaluation context at a time.
pub struct Poller {
    interval: Duration,
    shared: Arc<Shared>,
    task: Box<dyn ScheduledTask>,
    run: Mutex<Option<Arc<Run>>>,
}

impl Poller {
    pub fn new(
        interval: Duration,
        fetcher: Arc<dyn ToggleFetcher>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self::with_task(interval, fetcher, reporter, Box::new(IntervalTask::new("poller")))
    }

    /// Build on a caller-supplied timer.
    pub fn with_task(
        interval: Duration,
        fetcher: Arc<dyn ToggleFetcher>,
        reporter: Arc<dyn Reporter>,
        task: Box<dyn ScheduledTask>,
    ) -> Self {
        Self {
            interval,
            shared: Arc::new(Shared {
                store: ToggleStore::new(),
                fetcher,
                reporter,
                etag: Mutex::new(None),
                on_update: Mutex::new(None),
            }),
            task,
            run: Mutex::new(None),
        }
    }

    pub fn set_update_callback(&self, callback: UpdateCallback) {
        *self.shared.on_update.lock() = Some(callback);
    }

    /// Fetch now, then every interval, for `context`. All work runs on `runtime`.
    ///
    /// A running poller is stopped first, so the new context takes over.
    pub fn start(&self, runtime: &Handle, context: EvaluationContext) -> PollerSignals {
        self.stop();

        let (first_tx, first_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let run = Arc::new(Run {
            epoch: self.shared.store.epoch(),
            context,
            ready_tx: Mutex::new(Some(ready_tx)),
        });
        *self.run.lock() = Some(Arc::clone(&run));

        {
            let shared = Arc::clone(&self.shared);
            let run = Arc::clone(&run);
            runtime.spawn(async move {
                shared.poll(&run, Some(first_tx)).await;
            });
        }

        let shared = Arc::clone(&self.shared);
        let tick_runtime = runtime.clone();
        let action: TickAction = Arc::new(move || {
            let shared = Arc::clone(&shared);
            let run = Arc::clone(&run);
            tick_runtime.spawn(async move {
                shared.poll(&run, None).await;
            });
        });
        self.task.start(runtime, self.interval, action);

        PollerSignals {
            first_fetch: Completion::new(first_rx),
            ready: ready_rx,
        }
    }

    /// Cancel polling. Fetches still in flight are discarded when they land.
    pub fn stop(&self) {
        let Some(run) = self.run.lock().take() else {
            return;
        };

        self.task.stop();
        self.shared.store.advance_epoch();
        run.ready_tx.lock().take();

        tracing::debug!("Poller stopped");
    }

    pub fn lookup(&self, name: &str) -> Option<Toggle> {
        self.shared.store.lookup(name)
    }

    pub fn toggles(&self) -> Arc<ToggleTable> {
        self.shared.store.snapshot()
    }

    /// Context of the current run, if running.
    pub fn context(&self) -> Option<EvaluationContext> {
        self.run.lock().as_ref().map(|run| run.context.clone())
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().is_some()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
